//! Terminal front end for the result grid.

pub mod effects;
pub mod render;
pub mod sql_format;
pub mod theme;

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use qgrid_core::grid::{GridEvent, GridExit, GridState, Motion};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use thiserror::Error;
use tracing::debug;

use crate::effects::{resume_terminal, settle, suspend_terminal, LiveEffects};
use crate::render::{grid_viewport, render};
use crate::theme::Theme;

const TICK_RATE: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Msg {
    Grid(GridEvent),
    ToggleHelp,
}

/// Shows `grid` until it exits, performing its effects through `effects`.
pub fn run(
    grid: &mut GridState,
    effects: &mut LiveEffects<'_>,
    theme: &Theme,
) -> Result<GridExit, TuiError> {
    let mut terminal = setup_terminal()?;
    let run_result = run_loop(&mut terminal, grid, effects, theme);
    let restore_result = restore_terminal(&mut terminal);

    let exit = match run_result {
        Ok(exit) => exit,
        Err(error) => {
            restore_result?;
            return Err(error);
        }
    };

    restore_result?;
    Ok(exit)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    resume_terminal()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), TuiError> {
    suspend_terminal()?;
    terminal.show_cursor()?;
    Ok(())
}

fn resize(
    terminal: &Terminal<CrosstermBackend<Stdout>>,
    grid: &mut GridState,
) -> Result<(), TuiError> {
    let size = terminal.size()?;
    let (width, rows) = grid_viewport(Rect::new(0, 0, size.width, size.height), grid);
    grid.handle(GridEvent::Resize { width, rows });
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    grid: &mut GridState,
    effects: &mut LiveEffects<'_>,
    theme: &Theme,
) -> Result<GridExit, TuiError> {
    let mut show_help = false;
    let mut last_tick = Instant::now();
    resize(terminal, grid)?;

    loop {
        terminal.draw(|frame| render(frame, grid, theme, show_help))?;

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match map_key_event(key) {
                    Some(Msg::ToggleHelp) => show_help = !show_help,
                    Some(Msg::Grid(GridEvent::Cancel)) if show_help => show_help = false,
                    Some(Msg::Grid(grid_event)) => {
                        show_help = false;
                        if let Some(exit) = settle(grid, grid_event, effects) {
                            debug!(?exit, "grid finished");
                            return Ok(exit);
                        }
                        if effects.take_redraw() {
                            terminal.clear()?;
                            resize(terminal, grid)?;
                        }
                    }
                    None => {}
                },
                Event::Resize(_, _) => resize(terminal, grid)?,
                _ => {}
            }
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= TICK_RATE {
            grid.handle(GridEvent::Tick(elapsed));
            last_tick = Instant::now();
        }
    }
}

fn map_key_event(key: KeyEvent) -> Option<Msg> {
    let grid = |event| Some(Msg::Grid(event));
    let motion = |motion| Some(Msg::Grid(GridEvent::Move(motion)));

    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => grid(GridEvent::Quit),
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => motion(Motion::PageUp),
        (KeyModifiers::CONTROL, KeyCode::Char('d')) => motion(Motion::PageDown),
        (_, KeyCode::Char('q')) => grid(GridEvent::Quit),
        (_, KeyCode::Char('?')) => Some(Msg::ToggleHelp),
        (_, KeyCode::Esc) => grid(GridEvent::Cancel),
        (_, KeyCode::Up | KeyCode::Char('k')) => motion(Motion::Up),
        (_, KeyCode::Down | KeyCode::Char('j')) => motion(Motion::Down),
        (_, KeyCode::Left | KeyCode::Char('h')) => motion(Motion::Left),
        (_, KeyCode::Right | KeyCode::Char('l')) => motion(Motion::Right),
        (_, KeyCode::PageUp) => motion(Motion::PageUp),
        (_, KeyCode::PageDown) => motion(Motion::PageDown),
        (_, KeyCode::Char('g')) => motion(Motion::FirstRow),
        (_, KeyCode::Char('G')) => motion(Motion::LastRow),
        (_, KeyCode::Home | KeyCode::Char('0')) => motion(Motion::FirstColumn),
        (_, KeyCode::End | KeyCode::Char('$')) => motion(Motion::LastColumn),
        (_, KeyCode::Char('v')) => grid(GridEvent::ToggleVisual),
        (_, KeyCode::Char('y')) => grid(GridEvent::CopySelection),
        (_, KeyCode::Char('s')) => grid(GridEvent::ToggleSort),
        (_, KeyCode::Char('d')) => grid(GridEvent::RequestDelete),
        (_, KeyCode::Char('u')) => grid(GridEvent::RequestUpdate),
        (_, KeyCode::Char('e')) => grid(GridEvent::RequestEditQuery),
        _ => None,
    }
}
