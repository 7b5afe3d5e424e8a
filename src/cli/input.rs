/// Single-line text editor backing every form field.
/// `cursor` counts chars, not bytes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineEdit {
    pub value: String,
    pub cursor: usize,
    pub password: bool,
}

impl LineEdit {
    pub fn new(s: impl Into<String>) -> Self {
        let mut edit = Self::default();
        edit.set(s);
        edit
    }

    pub fn masked() -> Self {
        Self {
            password: true,
            ..Self::default()
        }
    }

    pub fn set(&mut self, s: impl Into<String>) {
        self.value = s.into();
        self.cursor = self.value.chars().count();
    }

    pub fn push(&mut self, ch: char) {
        let at = self.byte_index();
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    pub fn left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn rendered(&self) -> String {
        if self.password {
            "*".repeat(self.len())
        } else {
            self.value.clone()
        }
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map_or(self.value.len(), |(i, _)| i)
    }
}
