//! Terminal front-end (Ratatui + Crossterm)
//! - Builds the API client and restores the stored session
//! - Runs the draw / key loop until the user quits

use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use crate::config::Config;

pub mod api;
pub mod forms;
pub mod input;
pub mod router;
pub mod session;
pub mod state;
pub mod summary;
pub mod ui;
pub mod util;

/// Raw mode + alternate screen for as long as it lives.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen, EnableMouseCapture) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }

        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(t) => t,
            Err(err) => {
                restore_terminal();
                return Err(err.into());
            }
        };
        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        restore_terminal();
        let _ = self.terminal.show_cursor();
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

/// Puts the terminal back before the panic message is printed.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        default_hook(info);
    }));
}

pub async fn run(config: Config) -> Result<()> {
    let start = router::Route::parse(&config.start);
    let mut app = init_app(config)?;
    app.start(start);

    install_panic_hook();
    let mut session = TerminalSession::new()?;
    let outcome = event_loop(&mut session.terminal, &mut app).await;
    drop(session);
    info!("terminal restored");
    outcome
}

async fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut state::App) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Busy flags are on screen now; run the queued request and redraw.
        if app.run_next().await {
            continue;
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key)?;
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.quit {
            return Ok(());
        }
    }
}

pub fn init_app(config: Config) -> Result<state::App> {
    let client = api::Client::new(config.api_base_url.clone(), config.timeout)
        .context("building HTTP client")?;
    info!(api = %client.base_url(), session = %config.session_path.display(), "starting");

    let session = session::Session::new(session::SessionStore::new(config.session_path));
    Ok(state::App::new(client, session, config.display))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_hook_restores_and_lets_the_panic_unwind() {
        install_panic_hook();
        let caught = std::panic::catch_unwind(|| panic!("draw failed"));
        let _ = std::panic::take_hook();

        let payload = caught.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"draw failed"));
    }
}
