//! Interactive conversation history browser.

mod state;
mod terminal_guard;
mod view;
mod viewer;

use std::io;

use anyhow::Result;
use conversation_store::ConversationStore;
use crossterm::event::{self, Event};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

pub use state::{truncate_cell, BrowserAction, BrowserState, ColumnWidths, Mode};
pub use terminal_guard::{TerminalGuard, TerminalOps, TerminalRestorer};
pub use viewer::Viewer;

use crate::editor;

/// How the browser was left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserOutcome {
    Quit,
    /// An edited message to send as a new conversation.
    Resend(String),
}

pub fn run(store: &ConversationStore, viewer: &Viewer) -> Result<BrowserOutcome> {
    let conversations = store.list()?;
    let (width, _) = crossterm::terminal::size().unwrap_or((asc_stream::terminal::DEFAULT_COLUMNS, 24));
    let mut state = BrowserState::new(conversations, width);
    tracing::debug!(rows = state.conversations().len(), width, "opening history browser");

    let guard = TerminalGuard::new()?;
    restore_on_termination(&guard);
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    loop {
        terminal.draw(|frame| view::draw(frame, &state))?;

        let key = match event::read()? {
            Event::Key(key) => key,
            Event::Resize(width, _) => {
                state.set_width(width);
                continue;
            }
            _ => continue,
        };
        let Some(action) = state.handle_key(key) else {
            continue;
        };

        match action {
            BrowserAction::Quit => return Ok(BrowserOutcome::Quit),
            BrowserAction::View(conversation) => {
                if let Err(error) = guard.suspend(|| viewer.show(&conversation))? {
                    state.set_status(format!("{error:#}"));
                }
                terminal.clear()?;
            }
            BrowserAction::ViewRaw(conversation) => {
                if let Err(error) = guard.suspend(|| viewer.show_raw(&conversation))? {
                    state.set_status(format!("{error:#}"));
                }
                terminal.clear()?;
            }
            BrowserAction::Edit(conversation) => {
                let edited = guard.suspend(|| {
                    editor::editor_from_env()
                        .and_then(|command| editor::edit_text(&command, &conversation.message))
                })?;
                terminal.clear()?;
                match edited {
                    Ok(message) if !message.trim().is_empty() => {
                        return Ok(BrowserOutcome::Resend(message));
                    }
                    Ok(_) => state.set_status("Edited message is empty; nothing sent"),
                    Err(error) => state.set_status(format!("{error:#}")),
                }
            }
            BrowserAction::Delete(conversation) => match store.delete(&conversation.id) {
                Ok(_) => state.remove(&conversation.id),
                Err(error) => state.set_status(error.to_string()),
            },
        }
    }
}

#[cfg(unix)]
fn restore_on_termination(guard: &TerminalGuard) {
    if let Err(error) = terminal_guard::install_termination_signals(guard.restorer()) {
        tracing::debug!(%error, "termination signal handler not installed");
    }
}

#[cfg(not(unix))]
fn restore_on_termination(_guard: &TerminalGuard) {}
