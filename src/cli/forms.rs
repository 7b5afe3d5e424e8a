//! Form state for the auth, budget and expense screens, plus the rules that
//! turn typed text into request payloads.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::cli::input::LineEdit;
use crate::cli::util::{iso, parse_date, parse_money};
use crate::models::{Budget, FixedExpense, NewExpense};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Invalid email")]
    InvalidEmail,

    #[error("Password must be at least 6 characters")]
    ShortPassword,

    #[error("{0} is required")]
    Required(String),

    #[error("{0} must be a date (YYYY-MM-DD)")]
    BadDate(String),

    #[error("{0} must be a number from 0 to 1000000000000")]
    BadAmount(String),
}

fn required(label: &str, edit: &LineEdit) -> Result<String, FormError> {
    let value = edit.as_str().trim();
    if value.is_empty() {
        return Err(FormError::Required(label.to_string()));
    }
    Ok(value.to_string())
}

fn date(label: &str, edit: &LineEdit) -> Result<String, FormError> {
    let value = required(label, edit)?;
    parse_date(&value)
        .map(|d| iso(&d))
        .ok_or_else(|| FormError::BadDate(label.to_string()))
}

fn amount(label: &str, edit: &LineEdit) -> Result<Decimal, FormError> {
    let value = required(label, edit)?;
    parse_money(&value).ok_or_else(|| FormError::BadAmount(label.to_string()))
}

fn cycle(current: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as isize + delta).rem_euclid(len as isize) as usize
}

// ============= Auth =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthField {
    #[default]
    Email,
    Password,
}

#[derive(Debug, Clone)]
pub struct AuthForm {
    pub email: LineEdit,
    pub password: LineEdit,
    pub focus: AuthField,
    pub error: Option<String>,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            email: LineEdit::default(),
            password: LineEdit::masked(),
            focus: AuthField::Email,
            error: None,
        }
    }
}

impl AuthForm {
    pub fn focused_mut(&mut self) -> &mut LineEdit {
        match self.focus {
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            AuthField::Email => AuthField::Password,
            AuthField::Password => AuthField::Email,
        };
    }

    /// Returns `(email, password)` ready for the API.
    pub fn validate(&self) -> Result<(String, String), FormError> {
        let email = self.email.as_str().trim();
        if !email.contains('@') {
            return Err(FormError::InvalidEmail);
        }
        let password = self.password.as_str();
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::ShortPassword);
        }
        Ok((email.to_string(), password.to_string()))
    }
}

// ============= Budget =============

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedRow {
    pub name: LineEdit,
    pub amount: LineEdit,
}

impl FixedRow {
    fn empty() -> Self {
        Self {
            name: LineEdit::default(),
            amount: LineEdit::new("0"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetField {
    PeriodStart,
    PeriodEnd,
    Income,
    Saving,
    FixedName(usize),
    FixedAmount(usize),
}

impl BudgetField {
    /// Keystroke filter for the focused field.
    pub fn accepts(self, ch: char) -> bool {
        match self {
            Self::PeriodStart | Self::PeriodEnd => ch.is_ascii_digit() || ch == '-',
            Self::Income | Self::Saving | Self::FixedAmount(_) => ch.is_ascii_digit() || ch == '.',
            Self::FixedName(_) => !ch.is_control(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BudgetForm {
    pub period_start: LineEdit,
    pub period_end: LineEdit,
    pub income: LineEdit,
    pub saving: LineEdit,
    pub fixed: Vec<FixedRow>,
    pub focus: usize,
    pub editing: bool,
}

impl Default for BudgetForm {
    fn default() -> Self {
        Self::from_budget(None)
    }
}

impl BudgetForm {
    /// A blank form, or one filled from the saved budget. Always has at least
    /// one fixed-expense row.
    pub fn from_budget(budget: Option<&Budget>) -> Self {
        let mut form = Self {
            period_start: LineEdit::default(),
            period_end: LineEdit::default(),
            income: LineEdit::new("0"),
            saving: LineEdit::new("0"),
            fixed: Vec::new(),
            focus: 0,
            editing: false,
        };
        if let Some(b) = budget {
            form.period_start.set(b.period_start.clone());
            form.period_end.set(b.period_end.clone());
            form.income.set(b.income_total.normalize().to_string());
            form.saving.set(b.saving_goal.normalize().to_string());
            form.fixed = b
                .fixed_expenses
                .iter()
                .map(|f| FixedRow {
                    name: LineEdit::new(f.name.clone()),
                    amount: LineEdit::new(f.amount.normalize().to_string()),
                })
                .collect();
        }
        if form.fixed.is_empty() {
            form.fixed.push(FixedRow::empty());
        }
        form
    }

    pub fn fields(&self) -> Vec<BudgetField> {
        let mut fields = vec![
            BudgetField::PeriodStart,
            BudgetField::PeriodEnd,
            BudgetField::Income,
            BudgetField::Saving,
        ];
        for i in 0..self.fixed.len() {
            fields.push(BudgetField::FixedName(i));
            fields.push(BudgetField::FixedAmount(i));
        }
        fields
    }

    pub fn focused(&self) -> BudgetField {
        let fields = self.fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    pub fn field(&self, field: BudgetField) -> &LineEdit {
        match field {
            BudgetField::PeriodStart => &self.period_start,
            BudgetField::PeriodEnd => &self.period_end,
            BudgetField::Income => &self.income,
            BudgetField::Saving => &self.saving,
            BudgetField::FixedName(i) => &self.fixed[i].name,
            BudgetField::FixedAmount(i) => &self.fixed[i].amount,
        }
    }

    pub fn focused_mut(&mut self) -> &mut LineEdit {
        match self.focused() {
            BudgetField::PeriodStart => &mut self.period_start,
            BudgetField::PeriodEnd => &mut self.period_end,
            BudgetField::Income => &mut self.income,
            BudgetField::Saving => &mut self.saving,
            BudgetField::FixedName(i) => &mut self.fixed[i].name,
            BudgetField::FixedAmount(i) => &mut self.fixed[i].amount,
        }
    }

    pub fn move_focus(&mut self, delta: isize) {
        self.focus = cycle(self.focus, self.fields().len(), delta);
    }

    /// Row under the cursor, if the cursor is on a fixed expense.
    pub fn focused_row(&self) -> Option<usize> {
        match self.focused() {
            BudgetField::FixedName(i) | BudgetField::FixedAmount(i) => Some(i),
            _ => None,
        }
    }

    pub fn add_fixed(&mut self) {
        self.fixed.push(FixedRow::empty());
        self.focus = self.fields().len() - 2;
    }

    /// The last remaining row cannot be removed.
    pub fn remove_fixed(&mut self, index: usize) -> bool {
        if self.fixed.len() <= 1 || index >= self.fixed.len() {
            return false;
        }
        self.fixed.remove(index);
        self.focus = self.focus.min(self.fields().len() - 1);
        true
    }

    pub fn to_payload(&self) -> Result<Budget, FormError> {
        let period_start = date("Period start", &self.period_start)?;
        let period_end = date("Period end", &self.period_end)?;
        let income_total = amount("Income", &self.income)?;
        let saving_goal = amount("Savings goal", &self.saving)?;

        let mut fixed_expenses = Vec::with_capacity(self.fixed.len());
        for (i, row) in self.fixed.iter().enumerate() {
            let n = i + 1;
            fixed_expenses.push(FixedExpense {
                name: required(&format!("Fixed expense {n} name"), &row.name)?,
                amount: amount(&format!("Fixed expense {n} amount"), &row.amount)?,
            });
        }
        Ok(Budget {
            period_start,
            period_end,
            income_total,
            saving_goal,
            fixed_expenses,
        })
    }
}

// ============= Expense =============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseField {
    Date,
    Amount,
    Description,
    Category,
}

impl ExpenseField {
    pub fn accepts(self, ch: char) -> bool {
        match self {
            Self::Date => ch.is_ascii_digit() || ch == '-',
            Self::Amount => ch.is_ascii_digit() || ch == '.',
            Self::Description | Self::Category => !ch.is_control(),
        }
    }

    pub const ALL: [ExpenseField; 4] = [
        ExpenseField::Date,
        ExpenseField::Amount,
        ExpenseField::Description,
        ExpenseField::Category,
    ];
}

#[derive(Debug, Clone)]
pub struct ExpenseForm {
    pub date: LineEdit,
    pub amount: LineEdit,
    pub description: LineEdit,
    pub category: LineEdit,
    pub focus: usize,
    pub editing: bool,
}

impl ExpenseForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: LineEdit::new(iso(&today)),
            amount: LineEdit::new("0"),
            description: LineEdit::default(),
            category: LineEdit::default(),
            focus: 0,
            editing: false,
        }
    }

    pub fn focused(&self) -> ExpenseField {
        ExpenseField::ALL[self.focus % ExpenseField::ALL.len()]
    }

    pub fn field(&self, field: ExpenseField) -> &LineEdit {
        match field {
            ExpenseField::Date => &self.date,
            ExpenseField::Amount => &self.amount,
            ExpenseField::Description => &self.description,
            ExpenseField::Category => &self.category,
        }
    }

    pub fn focused_mut(&mut self) -> &mut LineEdit {
        match self.focused() {
            ExpenseField::Date => &mut self.date,
            ExpenseField::Amount => &mut self.amount,
            ExpenseField::Description => &mut self.description,
            ExpenseField::Category => &mut self.category,
        }
    }

    pub fn move_focus(&mut self, delta: isize) {
        self.focus = cycle(self.focus, ExpenseField::ALL.len(), delta);
    }

    pub fn to_payload(&self) -> Result<NewExpense, FormError> {
        Ok(NewExpense {
            date: date("Date", &self.date)?,
            amount: amount("Amount", &self.amount)?,
            description: required("Description", &self.description)?,
            category: required("Category", &self.category)?,
        })
    }

    /// Ready for the next entry; the date is kept.
    pub fn reset_after_submit(&mut self) {
        self.description.clear();
        self.category.clear();
        self.amount.set("0");
        self.focus = 0;
        self.editing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(email: &str, password: &str) -> AuthForm {
        let mut form = AuthForm::default();
        form.email.set(email);
        form.password.set(password);
        form
    }

    #[test]
    fn auth_checks_email_then_password() {
        assert_eq!(auth("nobody", "secret1").validate(), Err(FormError::InvalidEmail));
        assert_eq!(auth("a@b.c", "12345").validate(), Err(FormError::ShortPassword));
        assert_eq!(
            auth(" a@b.c ", "123456").validate(),
            Ok(("a@b.c".to_string(), "123456".to_string()))
        );
    }

    #[test]
    fn short_password_message_names_the_minimum() {
        assert_eq!(
            FormError::ShortPassword.to_string(),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn blank_budget_form_has_one_row() {
        let form = BudgetForm::from_budget(None);
        assert_eq!(form.fixed.len(), 1);
        assert_eq!(form.income.as_str(), "0");
    }

    #[test]
    fn budget_without_fixed_expenses_gets_an_empty_row() {
        let budget = Budget {
            period_start: "2024-05-01".into(),
            period_end: "2024-05-31".into(),
            income_total: Decimal::from(1000),
            ..Default::default()
        };
        let form = BudgetForm::from_budget(Some(&budget));
        assert_eq!(form.fixed.len(), 1);
        assert_eq!(form.period_start.as_str(), "2024-05-01");
        assert_eq!(form.income.as_str(), "1000");
    }

    #[test]
    fn last_fixed_row_cannot_be_removed() {
        let mut form = BudgetForm::default();
        assert!(!form.remove_fixed(0));
        form.add_fixed();
        assert_eq!(form.fixed.len(), 2);
        assert_eq!(form.focused(), BudgetField::FixedName(1));
        assert!(form.remove_fixed(1));
        assert_eq!(form.fixed.len(), 1);
        assert_eq!(form.focused(), BudgetField::FixedAmount(0));
    }

    #[test]
    fn amount_fields_filter_keystrokes() {
        assert!(BudgetField::Income.accepts('7'));
        assert!(!BudgetField::Income.accepts('x'));
        assert!(BudgetField::PeriodEnd.accepts('-'));
        assert!(ExpenseField::Description.accepts('x'));
        assert!(!ExpenseField::Amount.accepts('-'));
    }

    #[test]
    fn focus_wraps_around() {
        let mut form = BudgetForm::default();
        form.move_focus(-1);
        assert_eq!(form.focused(), BudgetField::FixedAmount(0));
        form.move_focus(1);
        assert_eq!(form.focused(), BudgetField::PeriodStart);
    }

    #[test]
    fn budget_payload_round_trips_the_form() {
        let mut form = BudgetForm::default();
        form.period_start.set("2024-05-01");
        form.period_end.set("2024-05-31");
        form.income.set("350000");
        form.saving.set("50000");
        form.fixed[0].name.set("Rent");
        form.fixed[0].amount.set("120000");

        let budget = form.to_payload().unwrap();
        assert_eq!(budget.income_total, Decimal::from(350_000));
        assert_eq!(budget.fixed_expenses[0].name, "Rent");
        assert_eq!(budget.fixed_total(), Some(Decimal::from(120_000)));
    }

    #[test]
    fn budget_payload_reports_first_problem() {
        let mut form = BudgetForm::default();
        assert_eq!(form.to_payload(), Err(FormError::Required("Period start".into())));
        form.period_start.set("2024-13-01");
        assert_eq!(form.to_payload(), Err(FormError::BadDate("Period start".into())));
        form.period_start.set("2024-05-01");
        form.period_end.set("2024-05-31");
        form.income.set("-1");
        assert_eq!(form.to_payload(), Err(FormError::BadAmount("Income".into())));
        form.income.set("");
        assert_eq!(form.to_payload(), Err(FormError::Required("Income".into())));
        form.income.set("1000");
        assert_eq!(
            form.to_payload(),
            Err(FormError::Required("Fixed expense 1 name".into()))
        );
    }

    #[test]
    fn budget_payload_rejects_oversized_amounts() {
        let mut form = BudgetForm::default();
        form.period_start.set("2024-05-01");
        form.period_end.set("2024-05-31");
        form.fixed[0].name.set("a");
        form.fixed[0].amount.set("79228162514264337593543950335");
        form.add_fixed();
        form.fixed[1].name.set("b");
        form.fixed[1].amount.set("79228162514264337593543950335");
        assert_eq!(
            form.to_payload(),
            Err(FormError::BadAmount("Fixed expense 1 amount".into()))
        );
    }

    #[test]
    fn expense_form_defaults_and_reset() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let mut form = ExpenseForm::new(today);
        assert_eq!(form.date.as_str(), "2024-05-03");

        form.description.set("Groceries");
        form.category.set("Home");
        form.amount.set("4200");
        let payload = form.to_payload().unwrap();
        assert_eq!(payload.amount, Decimal::from(4200));

        form.reset_after_submit();
        assert_eq!(form.date.as_str(), "2024-05-03");
        assert_eq!(form.description.as_str(), "");
        assert_eq!(form.amount.as_str(), "0");
    }

    #[test]
    fn expense_needs_description_and_category() {
        let mut form = ExpenseForm::new(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
        assert_eq!(form.to_payload(), Err(FormError::Required("Description".into())));
        form.description.set("Bus");
        assert_eq!(form.to_payload(), Err(FormError::Required("Category".into())));
    }
}
