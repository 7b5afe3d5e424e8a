use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::widgets::TableState;
use tracing::{debug, info, warn};

use crate::cli::api::{ApiError, Client};
use crate::cli::forms::{AuthForm, BudgetForm, ExpenseForm};
use crate::cli::input::LineEdit;
use crate::cli::router::{self, AuthState, Route, Screen};
use crate::cli::session::Session;
use crate::cli::util;
use crate::config::DisplayConfig;
use crate::models::{Budget, Expense, NewExpense};

/// Network work queued by a key press. The event loop redraws before running
/// it, so busy flags set at queue time reach the screen.
pub enum Task {
    Auth {
        kind: AuthKind,
        email: String,
        password: String,
    },
    LoadDashboard,
    LoadBudget,
    LoadExpenses,
    SaveBudget(Budget),
    AddExpense(NewExpense),
}

/// Tabs shown on the `/app` screens, in order.
pub const APP_TABS: [Route; 3] = [Route::Dashboard, Route::Budget, Route::Expenses];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    Login,
    Register,
}

#[derive(Default)]
pub struct DashboardPage {
    pub budget: Option<Budget>,
    pub expenses: Vec<Expense>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
pub struct BudgetPage {
    pub budget: Option<Budget>,
    pub form: BudgetForm,
    pub loading: bool,
    pub saving: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

pub struct ExpensesPage {
    pub expenses: Vec<Expense>,
    pub form: ExpenseForm,
    pub tsel: TableState,
    pub loading: bool,
    pub saving: bool,
    pub error: Option<String>,
}

impl Default for ExpensesPage {
    fn default() -> Self {
        Self {
            expenses: Vec::new(),
            form: ExpenseForm::new(util::today()),
            tsel: TableState::default(),
            loading: false,
            saving: false,
            error: None,
        }
    }
}

pub struct App {
    pub api: Client,
    pub session: Session,
    pub display: DisplayConfig,
    pub route: Route,
    pub screen: Screen,
    pub status: String,
    pub show_help: bool,
    pub quit: bool,
    pub submitting: bool,
    pub login: AuthForm,
    pub register: AuthForm,
    pub dashboard: DashboardPage,
    pub budget: BudgetPage,
    pub expenses: ExpensesPage,
    pending: Option<Task>,
}

impl App {
    pub fn new(api: Client, session: Session, display: DisplayConfig) -> Self {
        let auth = AuthState {
            loading: session.is_loading(),
            authenticated: session.is_authenticated(),
        };
        let first = router::resolve(Route::Root, auth);
        Self {
            api,
            session,
            display,
            route: first.route,
            screen: first.screen,
            status: "? for help | q to quit".into(),
            show_help: false,
            quit: false,
            submitting: false,
            login: AuthForm::default(),
            register: AuthForm::default(),
            dashboard: DashboardPage::default(),
            budget: BudgetPage::default(),
            expenses: ExpensesPage::default(),
            pending: None,
        }
    }

    /// Restores the stored session, then opens `route`.
    pub fn start(&mut self, route: Route) {
        self.session.restore();
        self.navigate(route);
    }

    pub fn auth_state(&self) -> AuthState {
        AuthState {
            loading: self.session.is_loading(),
            authenticated: self.session.is_authenticated(),
        }
    }

    /// Moves to `route` and queues the loader of the screen it lands on.
    pub fn navigate(&mut self, route: Route) {
        self.set_route(route);
        match self.screen {
            Screen::Dashboard => self.queue(Task::LoadDashboard),
            Screen::Budget => self.queue(Task::LoadBudget),
            Screen::Expenses => self.queue(Task::LoadExpenses),
            Screen::Loading | Screen::Login | Screen::Register => {}
        }
    }

    /// Moves without loading anything.
    pub fn set_route(&mut self, route: Route) {
        let resolved = router::resolve(route, self.auth_state());
        if resolved.route != route {
            debug!(from = %route, to = %resolved.route, "redirect");
        }
        self.route = resolved.route;
        self.screen = resolved.screen;
        self.show_help = false;
    }

    /// Invalid tokens end the session. Returns true when it did.
    fn handle_api_error(&mut self, err: &ApiError) -> bool {
        if err.is_invalid_token() {
            warn!("token rejected, logging out");
            self.logout();
            self.status = "Session expired, please log in again".into();
            return true;
        }
        false
    }

    // ============= Tasks =============

    fn queue(&mut self, task: Task) {
        match &task {
            Task::Auth { .. } => self.submitting = true,
            Task::LoadDashboard => {
                self.dashboard.loading = true;
                self.dashboard.error = None;
            }
            Task::LoadBudget => {
                self.budget.loading = true;
                self.budget.error = None;
                self.budget.success = None;
            }
            Task::LoadExpenses => {
                self.expenses.loading = true;
                self.expenses.error = None;
            }
            Task::SaveBudget(_) => self.budget.saving = true,
            Task::AddExpense(_) => self.expenses.saving = true,
        }
        self.pending = Some(task);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Runs the queued task, if any. Returns whether one ran.
    pub async fn run_next(&mut self) -> bool {
        let Some(task) = self.pending.take() else {
            return false;
        };
        match task {
            Task::Auth { kind, email, password } => self.authenticate(kind, &email, &password).await,
            task => self.run_with_token(task).await,
        }
        true
    }

    /// Runs queued tasks until none is left, including follow-up loads.
    pub async fn run_pending(&mut self) {
        while self.run_next().await {}
    }

    async fn run_with_token(&mut self, task: Task) {
        let Some(token) = self.session.token().map(str::to_owned) else {
            self.settle();
            return;
        };
        match task {
            Task::LoadDashboard => self.load_dashboard(&token).await,
            Task::LoadBudget => self.load_budget(&token).await,
            Task::LoadExpenses => self.load_expenses(&token).await,
            Task::SaveBudget(payload) => self.store_budget(&token, &payload).await,
            Task::AddExpense(payload) => self.create_expense(&token, &payload).await,
            Task::Auth { .. } => {}
        }
    }

    /// Clears every busy flag.
    fn settle(&mut self) {
        self.submitting = false;
        self.dashboard.loading = false;
        self.budget.loading = false;
        self.budget.saving = false;
        self.expenses.loading = false;
        self.expenses.saving = false;
    }

    // ============= Auth =============

    /// Validates the form and queues the request.
    pub fn submit_auth(&mut self, kind: AuthKind) {
        let form = match kind {
            AuthKind::Login => &mut self.login,
            AuthKind::Register => &mut self.register,
        };
        form.error = None;
        match form.validate() {
            Ok((email, password)) => self.queue(Task::Auth { kind, email, password }),
            Err(e) => form.error = Some(e.to_string()),
        }
    }

    async fn authenticate(&mut self, kind: AuthKind, email: &str, password: &str) {
        let result = match kind {
            AuthKind::Login => self.session.login(&self.api, email, password).await,
            AuthKind::Register => self.session.register(&self.api, email, password).await,
        };
        self.submitting = false;

        match result {
            Ok(()) => {
                self.login = AuthForm::default();
                self.register = AuthForm::default();
                self.status = format!("Signed in as {email}");
                self.navigate(Route::Dashboard);
            }
            Err(e) => {
                let form = match kind {
                    AuthKind::Login => &mut self.login,
                    AuthKind::Register => &mut self.register,
                };
                form.error = Some(e.to_string());
            }
        }
    }

    /// Ends the session and forgets everything loaded for it.
    pub fn logout(&mut self) {
        self.session.logout();
        self.pending = None;
        self.submitting = false;
        self.dashboard = DashboardPage::default();
        self.budget = BudgetPage::default();
        self.expenses = ExpensesPage::default();
        self.set_route(Route::Login);
        self.status = "Logged out".into();
    }

    // ============= Dashboard =============

    async fn load_dashboard(&mut self, token: &str) {
        let (budget, expenses) = tokio::join!(
            self.api.get_budget(token),
            self.api.get_expenses(token)
        );
        self.dashboard.loading = false;

        let mut failure = None;
        match budget {
            Ok(b) => self.dashboard.budget = Some(b),
            Err(e) if e.is_no_budget() => self.dashboard.budget = None,
            Err(e) => failure = Some(e),
        }
        match expenses {
            Ok(list) => self.dashboard.expenses = list,
            Err(e) => {
                failure.get_or_insert(e);
            }
        }

        if let Some(e) = failure {
            if self.handle_api_error(&e) {
                return;
            }
            self.dashboard.error = Some(e.to_string());
        }
    }

    // ============= Budget =============

    async fn load_budget(&mut self, token: &str) {
        let result = self.api.get_budget(token).await;
        self.budget.loading = false;
        match result {
            Ok(b) => {
                self.budget.form = BudgetForm::from_budget(Some(&b));
                self.budget.budget = Some(b);
            }
            Err(e) if self.handle_api_error(&e) => {}
            Err(e) if e.is_no_budget() => {
                self.budget.budget = None;
                self.budget.form = BudgetForm::from_budget(None);
            }
            Err(e) => self.budget.error = Some(e.to_string()),
        }
    }

    /// Validates the budget form and queues the save.
    pub fn save_budget(&mut self) {
        self.budget.error = None;
        self.budget.success = None;
        match self.budget.form.to_payload() {
            Ok(payload) => self.queue(Task::SaveBudget(payload)),
            Err(e) => self.budget.error = Some(e.to_string()),
        }
    }

    async fn store_budget(&mut self, token: &str, payload: &Budget) {
        let result = self.api.save_budget(token, payload).await;
        self.budget.saving = false;
        match result {
            Ok(saved) => {
                info!(period_start = %saved.period_start, "budget saved");
                let focus = self.budget.form.focus;
                self.budget.form = BudgetForm::from_budget(Some(&saved));
                self.budget.form.focus = focus.min(self.budget.form.fields().len() - 1);
                self.budget.budget = Some(saved);
                self.budget.success = Some("Budget saved".into());
            }
            Err(e) if self.handle_api_error(&e) => {}
            Err(e) => self.budget.error = Some(e.to_string()),
        }
    }

    // ============= Expenses =============

    async fn load_expenses(&mut self, token: &str) {
        let result = self.api.get_expenses(token).await;
        self.expenses.loading = false;
        match result {
            Ok(list) => {
                self.expenses.expenses = list;
                self.clamp_history_selection();
            }
            Err(e) if self.handle_api_error(&e) => {}
            Err(e) => self.expenses.error = Some(e.to_string()),
        }
    }

    /// Validates the expense form and queues the request.
    pub fn add_expense(&mut self) {
        self.expenses.error = None;
        match self.expenses.form.to_payload() {
            Ok(payload) => self.queue(Task::AddExpense(payload)),
            Err(e) => self.expenses.error = Some(e.to_string()),
        }
    }

    async fn create_expense(&mut self, token: &str, payload: &NewExpense) {
        let result = self.api.add_expense(token, payload).await;
        self.expenses.saving = false;
        match result {
            Ok(created) => {
                info!(date = %created.date, "expense added");
                self.expenses.expenses.push(created);
                self.expenses.form.reset_after_submit();
                self.clamp_history_selection();
                self.status = "Expense added".into();
            }
            Err(e) if self.handle_api_error(&e) => {}
            Err(e) => self.expenses.error = Some(e.to_string()),
        }
    }

    fn clamp_history_selection(&mut self) {
        let len = self.expenses.expenses.len();
        match (len, self.expenses.tsel.selected()) {
            (0, _) => self.expenses.tsel.select(None),
            (n, Some(i)) if i >= n => self.expenses.tsel.select(Some(n - 1)),
            (_, None) => self.expenses.tsel.select(Some(0)),
            _ => {}
        }
    }

    fn move_history(&mut self, delta: isize) {
        let n = self.expenses.expenses.len();
        if n == 0 {
            self.expenses.tsel.select(None);
            return;
        }
        let cur = self.expenses.tsel.selected().unwrap_or(0) as isize;
        let next = (cur + delta).rem_euclid(n as isize) as usize;
        self.expenses.tsel.select(Some(next));
    }

    // ============= Keys =============

    pub fn is_editing(&self) -> bool {
        match self.screen {
            Screen::Budget => self.budget.form.editing,
            Screen::Expenses => self.expenses.form.editing,
            _ => false,
        }
    }

    pub fn handle_key(&mut self, k: KeyEvent) -> anyhow::Result<()> {
        if k.kind != KeyEventKind::Press {
            return Ok(());
        }
        if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
            self.quit = true;
            return Ok(());
        }

        match self.screen {
            Screen::Loading => {
                if matches!(k.code, KeyCode::Esc | KeyCode::Char('q')) {
                    self.quit = true;
                }
            }
            Screen::Login => self.handle_auth_key(AuthKind::Login, k),
            Screen::Register => self.handle_auth_key(AuthKind::Register, k),
            Screen::Dashboard | Screen::Budget | Screen::Expenses if self.is_editing() => {
                self.handle_edit_key(k);
            }
            Screen::Dashboard | Screen::Budget | Screen::Expenses => {
                self.handle_nav_key(k);
            }
        }
        Ok(())
    }

    fn handle_auth_key(&mut self, kind: AuthKind, k: KeyEvent) {
        let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
        match k.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Enter => self.submit_auth(kind),
            KeyCode::Char('n') if ctrl => {
                let other = match kind {
                    AuthKind::Login => Route::Register,
                    AuthKind::Register => Route::Login,
                };
                self.set_route(other);
            }
            _ => {
                let form = match kind {
                    AuthKind::Login => &mut self.login,
                    AuthKind::Register => &mut self.register,
                };
                match k.code {
                    KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                        form.toggle_focus();
                    }
                    code => edit_line(form.focused_mut(), code, |c| !c.is_control()),
                }
            }
        }
    }

    fn handle_edit_key(&mut self, k: KeyEvent) {
        match self.screen {
            Screen::Budget => {
                let form = &mut self.budget.form;
                match k.code {
                    KeyCode::Enter | KeyCode::Esc => form.editing = false,
                    KeyCode::Tab => form.move_focus(1),
                    KeyCode::BackTab => form.move_focus(-1),
                    code => {
                        let field = form.focused();
                        edit_line(form.focused_mut(), code, |c| field.accepts(c));
                    }
                }
            }
            Screen::Expenses => {
                let form = &mut self.expenses.form;
                match k.code {
                    KeyCode::Enter | KeyCode::Esc => form.editing = false,
                    KeyCode::Tab => form.move_focus(1),
                    KeyCode::BackTab => form.move_focus(-1),
                    code => {
                        let field = form.focused();
                        edit_line(form.focused_mut(), code, |c| field.accepts(c));
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_nav_key(&mut self, k: KeyEvent) {
        if self.show_help {
            if matches!(k.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('b')) {
                self.show_help = false;
            }
            return;
        }

        match k.code {
            KeyCode::Char('q') => {
                self.quit = true;
                return;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                return;
            }
            KeyCode::Char('L') => {
                self.logout();
                return;
            }
            KeyCode::Char('1') => return self.navigate(Route::Dashboard),
            KeyCode::Char('2') => return self.navigate(Route::Budget),
            KeyCode::Char('3') => return self.navigate(Route::Expenses),
            KeyCode::Right | KeyCode::Tab => return self.navigate(self.adjacent_tab(1)),
            KeyCode::Left | KeyCode::BackTab => return self.navigate(self.adjacent_tab(-1)),
            KeyCode::Char('r') => return self.navigate(self.route),
            _ => {}
        }

        match self.screen {
            Screen::Budget => match k.code {
                KeyCode::Up => self.budget.form.move_focus(-1),
                KeyCode::Down => self.budget.form.move_focus(1),
                KeyCode::Enter => self.budget.form.editing = true,
                KeyCode::Char('a') => self.budget.form.add_fixed(),
                KeyCode::Char('x') | KeyCode::Delete => {
                    let removed = self
                        .budget
                        .form
                        .focused_row()
                        .is_some_and(|row| self.budget.form.remove_fixed(row));
                    if !removed {
                        self.status = "Select a fixed expense row; the last one stays".into();
                    }
                }
                KeyCode::Char('s') => self.save_budget(),
                _ => {}
            },
            Screen::Expenses => match k.code {
                KeyCode::Up => self.expenses.form.move_focus(-1),
                KeyCode::Down => self.expenses.form.move_focus(1),
                KeyCode::Enter => self.expenses.form.editing = true,
                KeyCode::PageUp => self.move_history(-1),
                KeyCode::PageDown => self.move_history(1),
                KeyCode::Char('s') => self.add_expense(),
                _ => {}
            },
            _ => {}
        }
    }

    fn adjacent_tab(&self, delta: isize) -> Route {
        let cur = APP_TABS.iter().position(|r| *r == self.route).unwrap_or(0) as isize;
        APP_TABS[(cur + delta).rem_euclid(APP_TABS.len() as isize) as usize]
    }
}

fn edit_line(edit: &mut LineEdit, code: KeyCode, accepts: impl Fn(char) -> bool) {
    match code {
        KeyCode::Char(c) if accepts(c) => edit.push(c),
        KeyCode::Backspace => edit.backspace(),
        KeyCode::Delete => edit.delete(),
        KeyCode::Left => edit.left(),
        KeyCode::Right => edit.right(),
        KeyCode::Home => edit.cursor = 0,
        KeyCode::End => edit.cursor = edit.value.chars().count(),
        _ => {}
    }
}
