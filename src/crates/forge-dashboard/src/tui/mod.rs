//! Terminal dashboard
//!
//! Task table, create modal, and the per-task detail screen with live
//! polling of the task and its execution.

pub mod app;
pub mod dialog;
pub mod forms;
pub mod handler;
pub mod ui;

pub use app::App;
pub use dialog::{render_dialog, Dialog, DialogType, PendingAction};
pub use forms::{CreateTaskModal, ModalAction, ModalFocus};
pub use handler::InputHandler;
pub use ui::render_ui;

use crate::error::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

const FRAME: Duration = Duration::from_millis(100);

/// Run the interactive dashboard until the user quits
pub async fn run_tui(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = event_loop(&mut terminal, app).await;

    // Restore the terminal even if the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

async fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let handler = InputHandler::new();
    info!(route = %app.dashboard.route(), "Dashboard started");

    while !app.should_quit {
        let now = Instant::now();
        app.dashboard.pump(now);
        app.dashboard.tick(now);

        terminal.draw(|f| render_ui(f, app))?;

        if event::poll(FRAME)? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    handler.handle_key_event(key_event, app, Instant::now());
                }
            }
        }
        app.on_frame();
        tokio::task::yield_now().await;
    }

    info!("Dashboard closed");
    Ok(())
}
