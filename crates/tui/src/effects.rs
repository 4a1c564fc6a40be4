use std::io::{self, Write};

use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use qgrid_adapters::clipboard;
use qgrid_adapters::editor::ExternalEditor;
use qgrid_core::connection::SqlConnection;
use qgrid_core::editor_hint::CursorHint;
use qgrid_core::grid::{EditorOutcome, GridEffect, GridEvent, GridExit, GridState};
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Performs the side effects the grid asks for.
pub trait EffectRunner {
    fn edit(&mut self, content: &str, hint: CursorHint) -> EditorOutcome;
    fn copy(&mut self, text: &str) -> Result<(), String>;
    fn execute(&mut self, statement: &str) -> Result<(), String>;
}

/// Feeds `event` to the grid, then keeps performing effects and reporting
/// their outcomes until the grid is idle or asks to exit.
pub fn settle<R: EffectRunner + ?Sized>(
    grid: &mut GridState,
    event: GridEvent,
    runner: &mut R,
) -> Option<GridExit> {
    let mut next = grid.handle(event);
    while let Some(effect) = next {
        let outcome = match effect {
            GridEffect::Exit(exit) => return Some(exit),
            GridEffect::RunEditor { content, hint } => {
                GridEvent::EditorClosed(runner.edit(&content, hint))
            }
            GridEffect::WriteClipboard(text) => GridEvent::ClipboardFinished(runner.copy(&text)),
            GridEffect::ExecuteStatement(statement) => {
                GridEvent::ExecutionFinished(runner.execute(&statement))
            }
        };
        next = grid.handle(outcome);
    }
    None
}

/// Effects against the real terminal, clipboard and database.
pub struct LiveEffects<'a> {
    connection: &'a dyn SqlConnection,
    runtime: Handle,
    editor: ExternalEditor,
    needs_redraw: bool,
}

impl<'a> LiveEffects<'a> {
    #[must_use]
    pub fn new(connection: &'a dyn SqlConnection, runtime: Handle, editor: ExternalEditor) -> Self {
        Self {
            connection,
            runtime,
            editor,
            needs_redraw: false,
        }
    }

    /// True once after the terminal was handed to another program.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }
}

impl EffectRunner for LiveEffects<'_> {
    fn edit(&mut self, content: &str, hint: CursorHint) -> EditorOutcome {
        if let Err(error) = suspend_terminal() {
            return EditorOutcome::Failed(format!("could not release terminal: {error}"));
        }
        let outcome = self.editor.run(content, hint);
        self.needs_redraw = true;
        if let Err(error) = resume_terminal() {
            warn!(%error, "failed to restore terminal after editor");
        }
        outcome
    }

    fn copy(&mut self, text: &str) -> Result<(), String> {
        clipboard::write_text(text).map_err(|error| error.to_string())
    }

    fn execute(&mut self, statement: &str) -> Result<(), String> {
        info!(dialect = self.connection.dialect_tag(), "running statement from grid");
        self.runtime
            .block_on(self.connection.execute(statement))
            .map_err(|error| error.message().to_string())
    }
}

pub(crate) fn suspend_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    leave_screen(&mut io::stdout())
}

pub(crate) fn resume_terminal() -> io::Result<()> {
    enable_raw_mode()?;
    enter_screen(&mut io::stdout())
}

// Mouse reporting is never enabled.
fn enter_screen(out: &mut impl Write) -> io::Result<()> {
    execute!(out, EnterAlternateScreen)
}

fn leave_screen(out: &mut impl Write) -> io::Result<()> {
    execute!(out, LeaveAlternateScreen)
}
