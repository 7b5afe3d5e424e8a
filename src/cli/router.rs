//! Routes and the guard in front of the `/app` pages.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Register,
    AppIndex,
    Dashboard,
    Budget,
    Expenses,
}

/// What actually gets drawn once redirects are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Login,
    Register,
    Dashboard,
    Budget,
    Expenses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthState {
    pub loading: bool,
    pub authenticated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub route: Route,
    pub screen: Screen,
}

enum Step {
    Go(Route),
    Show(Screen),
}

impl Route {
    /// Unknown paths fall back to `/`.
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim();
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        match trimmed {
            "" => Self::Root,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/app" => Self::AppIndex,
            "/app/dashboard" => Self::Dashboard,
            "/app/budget" => Self::Budget,
            "/app/expenses" => Self::Expenses,
            _ => Self::Root,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::AppIndex => "/app",
            Self::Dashboard => "/app/dashboard",
            Self::Budget => "/app/budget",
            Self::Expenses => "/app/expenses",
        }
    }

    pub fn is_protected(self) -> bool {
        matches!(
            self,
            Self::AppIndex | Self::Dashboard | Self::Budget | Self::Expenses
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Follows redirects until a screen can be shown.
pub fn resolve(route: Route, auth: AuthState) -> Resolved {
    let mut route = route;
    loop {
        match step(route, auth) {
            Step::Go(next) => route = next,
            Step::Show(screen) => return Resolved { route, screen },
        }
    }
}

fn step(route: Route, auth: AuthState) -> Step {
    match route {
        Route::Root if auth.loading => Step::Show(Screen::Loading),
        Route::Root if auth.authenticated => Step::Go(Route::Dashboard),
        Route::Root => Step::Go(Route::Login),
        Route::Login => Step::Show(Screen::Login),
        Route::Register => Step::Show(Screen::Register),
        Route::AppIndex => Step::Go(Route::Dashboard),
        r if r.is_protected() && auth.loading => Step::Show(Screen::Loading),
        r if r.is_protected() && !auth.authenticated => Step::Go(Route::Login),
        Route::Dashboard => Step::Show(Screen::Dashboard),
        Route::Budget => Step::Show(Screen::Budget),
        Route::Expenses => Step::Show(Screen::Expenses),
    }
}
