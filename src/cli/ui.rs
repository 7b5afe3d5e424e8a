use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use crate::cli::forms::{AuthField, BudgetField, ExpenseField};
use crate::cli::input::LineEdit;
use crate::cli::router::Screen;
use crate::cli::state::{App, AuthKind, APP_TABS};
use crate::cli::summary::{self, Summary, RECENT_COUNT};
use crate::cli::util::fmt_money;
use crate::config::DisplayConfig;
use crate::models::Expense;

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();

    match app.screen {
        Screen::Loading => draw_loading(f, size),
        Screen::Login => draw_auth(f, size, app, AuthKind::Login),
        Screen::Register => draw_auth(f, size, app, AuthKind::Register),
        Screen::Dashboard | Screen::Budget | Screen::Expenses => draw_app(f, size, app),
    }
}

fn draw_loading(f: &mut Frame, area: Rect) {
    let p = Paragraph::new("Loading session…")
        .block(Block::default().borders(Borders::ALL).title("Budget"));
    f.render_widget(p, center_rect(area, 40, 3));
}

// Login / Register

fn draw_auth(f: &mut Frame, area: Rect, app: &App, kind: AuthKind) {
    let (form, title, subtitle, switch_hint, busy_label) = match kind {
        AuthKind::Login => (
            &app.login,
            "Sign in",
            "Use your email and password to continue",
            "Ctrl+N: create an account",
            "Signing in…",
        ),
        AuthKind::Register => (
            &app.register,
            "Create account",
            "Set up your budget in minutes",
            "Ctrl+N: back to sign in",
            "Creating…",
        ),
    };

    let mut lines = vec![
        Line::from(Span::styled(subtitle, Style::default().fg(Color::Gray))),
        Line::default(),
        field_line("Email   ", &form.email, form.focus == AuthField::Email, false),
        field_line("Password", &form.password, form.focus == AuthField::Password, false),
        Line::default(),
    ];
    if app.submitting {
        lines.push(Line::from(busy_label));
    } else if let Some(err) = &form.error {
        lines.push(error_line(err));
    } else {
        lines.push(Line::default());
    }
    lines.push(Line::default());
    lines.push(Line::from(format!("Enter: submit | Tab: switch field | {switch_hint} | Esc: quit")));

    let area = center_rect(area, 72, 12);
    f.render_widget(Clear, area);
    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

// App shell: tabs | page | status bar

fn draw_app(f: &mut Frame, area: Rect, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(1)])
        .split(area);

    let titles = ["1 Dashboard", "2 Budget", "3 Expenses"]
        .into_iter()
        .map(|t| Line::from(Span::raw(t)))
        .collect::<Vec<_>>();
    let selected = APP_TABS.iter().position(|r| *r == app.route).unwrap_or(0);
    let who = app
        .session
        .user()
        .map(|u| format!("Budget · {}", u.email))
        .unwrap_or_else(|| "Budget".into());
    let tabs = Tabs::new(titles)
        .select(selected)
        .block(Block::default().borders(Borders::ALL).title(who))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(tabs, root[0]);

    match app.screen {
        Screen::Dashboard => draw_dashboard(f, root[1], app),
        Screen::Budget => draw_budget(f, root[1], app),
        Screen::Expenses => draw_expenses(f, root[1], app),
        Screen::Loading | Screen::Login | Screen::Register => {}
    }

    let status = Paragraph::new(format!("{}  ·  {}", app.route, app.status))
        .style(Style::default().fg(Color::Gray));
    f.render_widget(status, root[2]);

    if app.show_help {
        let area = center_rect(root[1], 64, 22);
        f.render_widget(Clear, area);
        draw_help(f, area);
    }
}

// Dashboard

fn draw_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let page = &app.dashboard;
    let display = &app.display;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(8)])
        .split(area);

    let notice = if page.loading {
        Line::from("Loading data…")
    } else if let Some(err) = &page.error {
        error_line(err)
    } else {
        Line::from(Span::styled(
            "Period summary and recent activity",
            Style::default().fg(Color::Gray),
        ))
    };
    f.render_widget(Paragraph::new(notice), rows[0]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[1]);

    let mut lines = match Summary::compute(page.budget.as_ref(), &page.expenses) {
        Some(s) => {
            let mut lines = vec![
                Line::from(vec![
                    Span::raw("Available balance  "),
                    Span::styled(
                        fmt_money(&s.available, display),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(Span::styled(
                    "Income minus savings goal, fixed expenses and recorded expenses.",
                    Style::default().fg(Color::Gray),
                )),
                Line::default(),
            ];
            for (label, value) in s.highlights() {
                lines.push(Line::from(format!("{label:<18} {}", fmt_money(&value, display))));
            }
            lines
        }
        None => vec![error_line("Totals are too large to display.")],
    };
    if page.budget.is_none() && !page.loading {
        lines.push(Line::default());
        lines.push(Line::from("No budget yet: press 2 to set one up."));
    }
    let left = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Balance"))
        .wrap(Wrap { trim: true });
    f.render_widget(left, cols[0]);

    let title = format!("Recent expenses (Total {})", page.expenses.len());
    if page.expenses.is_empty() {
        let p = Paragraph::new("No expenses recorded yet.")
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(p, cols[1]);
    } else {
        let recent = summary::recent(&page.expenses, RECENT_COUNT);
        let table = expense_table(&recent, display)
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(table, cols[1]);
    }
}

// Budget

fn draw_budget(f: &mut Frame, area: Rect, app: &App) {
    let page = &app.budget;
    let form = &page.form;

    if page.loading {
        let p = Paragraph::new("Loading budget…")
            .block(Block::default().borders(Borders::ALL).title("Budget"));
        f.render_widget(p, area);
        return;
    }

    let focused = form.focused();
    let line = |label: &str, field: BudgetField| {
        field_line(label, form.field(field), focused == field, form.editing)
    };

    let mut lines = vec![
        Line::from(Span::styled(
            "Monthly income, savings goal and fixed expenses for the period.",
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
        line("Period start", BudgetField::PeriodStart),
        line("Period end  ", BudgetField::PeriodEnd),
        line("Income      ", BudgetField::Income),
        line("Savings goal", BudgetField::Saving),
        Line::default(),
        Line::from("Fixed expenses"),
    ];
    for i in 0..form.fixed.len() {
        let mut row = line(&format!("  {:>2}. name  ", i + 1), BudgetField::FixedName(i));
        row.spans.push(Span::raw("   "));
        row.spans.extend(line("amount", BudgetField::FixedAmount(i)).spans);
        lines.push(row);
    }
    lines.push(Line::default());
    if page.saving {
        lines.push(Line::from("Saving…"));
    } else if let Some(err) = &page.error {
        lines.push(error_line(err));
    } else if let Some(ok) = &page.success {
        lines.push(Line::from(Span::styled(ok.clone(), Style::default().fg(Color::Green))));
    }
    lines.push(Line::from(Span::styled(
        "↑/↓ field | Enter edit | a add row | x remove row | s save",
        Style::default().fg(Color::Gray),
    )));

    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Budget"))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

// Expenses

fn draw_expenses(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(5)])
        .split(area);

    let form = &app.expenses.form;
    let expenses = &app.expenses.expenses;
    let focused = form.focused();
    let line = |label: &str, field: ExpenseField| {
        field_line(label, form.field(field), focused == field, form.editing)
    };

    let mut lines = vec![
        line("Date       ", ExpenseField::Date),
        line("Amount     ", ExpenseField::Amount),
        line("Description", ExpenseField::Description),
        line("Category   ", ExpenseField::Category),
        Line::default(),
    ];
    if app.expenses.saving {
        lines.push(Line::from("Saving…"));
    } else if let Some(err) = &app.expenses.error {
        lines.push(error_line(err));
    } else {
        lines.push(Line::default());
    }
    lines.push(Line::from(Span::styled(
        "↑/↓ field | Enter edit | s add | r reload | PgUp/PgDn history",
        Style::default().fg(Color::Gray),
    )));
    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("New expense"));
    f.render_widget(p, rows[0]);

    let title = format!("History (Total {})", expenses.len());
    if app.expenses.loading {
        let p = Paragraph::new("Loading expenses…")
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(p, rows[1]);
    } else if expenses.is_empty() {
        let p = Paragraph::new("No expenses recorded.")
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(p, rows[1]);
    } else {
        let sorted = summary::by_date_desc(expenses);
        let table = expense_table(&sorted, &app.display)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        f.render_stateful_widget(table, rows[1], &mut app.expenses.tsel);
    }
}

fn expense_table<'a>(expenses: &[&'a Expense], display: &DisplayConfig) -> Table<'a> {
    let header = Row::new(vec!["Date", "Description", "Category", "Amount"])
        .style(Style::default().add_modifier(Modifier::BOLD))
        .height(1);
    let body: Vec<Row> = expenses
        .iter()
        .map(|&e| {
            Row::new(vec![
                Cell::from(e.date.as_str()),
                Cell::from(e.description.as_str()),
                Cell::from(Span::styled(e.category.as_str(), Style::default().fg(Color::Gray))),
                Cell::from(fmt_money(&e.amount, display)),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(12),
        Constraint::Percentage(45),
        Constraint::Percentage(25),
        Constraint::Length(14),
    ];
    Table::new(body, widths).header(header)
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help_text = [
        "Global:",
        "  1 / 2 / 3  : Dashboard / Budget / Expenses",
        "  ←/→ Tab    : Previous / next page",
        "  r          : Reload this page",
        "  L          : Log out",
        "  q, Ctrl+C  : Quit",
        "",
        "Budget:",
        "  ↑/↓        : Move between fields",
        "  Enter      : Edit field (Enter/Esc to finish)",
        "  a / x      : Add / remove fixed expense row",
        "  s          : Save budget",
        "",
        "Expenses:",
        "  ↑/↓ Enter  : Pick and edit a field",
        "  s          : Add expense",
        "  PgUp/PgDn  : Scroll history",
        "",
        "Esc or ? closes this help",
    ]
    .join("\n");

    let p = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help & Keybindings"));
    f.render_widget(p, area);
}

fn field_line(label: &str, edit: &LineEdit, focused: bool, editing: bool) -> Line<'static> {
    let marker = if focused { "› " } else { "  " };
    let label_style = if focused {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let mut spans = vec![
        Span::styled(format!("{marker}{label} : "), label_style),
        Span::raw(edit.rendered()),
    ];
    if focused && editing {
        spans.push(Span::styled("  <editing>", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
}

fn error_line(message: &str) -> Line<'static> {
    Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red)))
}

fn center_rect(rect: Rect, w: u16, h: u16) -> Rect {
    let x = rect.x + rect.width.saturating_sub(w) / 2;
    let y = rect.y + rect.height.saturating_sub(h) / 2;
    Rect { x, y, width: w.min(rect.width), height: h.min(rect.height) }
}
