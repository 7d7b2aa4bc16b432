mod app;
mod ui;

use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use stagehand_bridge::EngineProcess;
use stagehand_core::protocol::Notification;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;

use app::App;

/// Run the interactive working-set view until the user quits.
pub fn run(
    engine: &EngineProcess,
    notifications: UnboundedReceiver<Notification>,
    author: String,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, engine, notifications, author);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    engine: &EngineProcess,
    mut notifications: UnboundedReceiver<Notification>,
    author: String,
) -> anyhow::Result<()> {
    let mut app = App::new(author);

    loop {
        // Notifications are applied here, on the UI thread, between frames.
        loop {
            match notifications.try_recv() {
                Ok(n) => app.apply_notification(n, engine),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !app.engine_closed {
                        tracing::warn!("engine notification stream closed");
                        app.engine_closed = true;
                    }
                    break;
                }
            }
        }

        terminal.draw(|f| ui::render(f, &app))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key, engine);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
