//! The result grid state machine.
//!
//! `GridState::handle` consumes one [`GridEvent`] at a time and may return a
//! [`GridEffect`] for the host to perform. The host reports the outcome of
//! every effect back as another event; nothing here touches a terminal,
//! process, clipboard or database.

use std::ops::Range;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dialect::Dialect;
use crate::editor_hint::CursorHint;
use crate::layout::{column_widths, visible_columns, LayoutConfig, LayoutInput};
use crate::result_set::ResultSet;
use crate::selection::{Cell, Selection};
use crate::sort::{SortCycle, SortState};
use crate::sql_rewriter::{
    assigned_value, build_delete_statement, build_update_statement, delete_editor_content,
    extract_order_by, rewrite_order_by, update_editor_content, validate_delete_statement,
    validate_update_statement,
};

pub const DEFAULT_BLINK: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cannot modify rows: no primary key is known for this table")]
    NoPrimaryKey,
    #[error("cannot modify rows: the query does not target a single table")]
    NoTable,
    #[error("no rows to act on")]
    EmptyGrid,
    #[error("still waiting for the previous action to finish")]
    Busy,
}

/// Query text as typed, plus whatever was last sent to the database.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryContext {
    pub original: String,
    pub last_executed: Option<String>,
    /// Set once the grid has asked its host to run a new statement.
    pub rerun: Option<String>,
}

impl QueryContext {
    #[must_use]
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            last_executed: None,
            rerun: None,
        }
    }

    #[must_use]
    pub fn with_last_executed(mut self, sql: impl Into<String>) -> Self {
        self.last_executed = Some(sql.into());
        self
    }

    /// The text a sort or edit starts from.
    #[must_use]
    pub fn effective(&self) -> &str {
        self.last_executed
            .as_deref()
            .filter(|sql| !sql.trim().is_empty())
            .unwrap_or(&self.original)
    }

    #[must_use]
    pub fn should_rerun(&self) -> bool {
        self.rerun.is_some()
    }
}

/// Why the grid gave control back to its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridExit {
    Quit,
    Rerun(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    FirstRow,
    LastRow,
    FirstColumn,
    LastColumn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutcome {
    Saved(String),
    /// The editor exited cleanly but left nothing behind.
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    /// `width` is the terminal width; `rows` is how many data rows fit.
    Resize { width: usize, rows: usize },
    Move(Motion),
    ToggleVisual,
    Cancel,
    CopySelection,
    ToggleSort,
    RequestDelete,
    RequestUpdate,
    RequestEditQuery,
    EditorClosed(EditorOutcome),
    ExecutionFinished(Result<(), String>),
    ClipboardFinished(Result<(), String>),
    /// The host could not run the SQL from the last `GridExit::Rerun`.
    RerunFailed(String),
    Tick(Duration),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEffect {
    RunEditor { content: String, hint: CursorHint },
    WriteClipboard(String),
    ExecuteStatement(String),
    Exit(GridExit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPurpose {
    DeleteRow { row: usize },
    UpdateCell { row: usize, column: usize },
    EditQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingMutation {
    DeleteRow { row: usize },
    /// `value` is `None` when the new cell text cannot be read back from the
    /// statement; the grid then reruns the query instead.
    UpdateCell {
        row: usize,
        column: usize,
        value: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridMode {
    Browsing,
    VisualSelect { anchor: Cell },
    AwaitingEditor(EditorPurpose),
    AwaitingExecution(PendingMutation),
    AwaitingClipboard { selection: Selection },
}

impl GridMode {
    fn is_waiting(&self) -> bool {
        matches!(
            self,
            Self::AwaitingEditor(_) | Self::AwaitingExecution(_) | Self::AwaitingClipboard { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkTarget {
    Selection(Selection),
    Row(usize),
}

/// Post-mutation highlight; cleared by ticks, never blocks input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blink {
    pub target: BlinkTarget,
    pub remaining: Duration,
}

impl Blink {
    #[must_use]
    pub fn covers(&self, row: usize, column: usize) -> bool {
        match self.target {
            BlinkTarget::Selection(selection) => selection.contains(row, column),
            BlinkTarget::Row(blinking) => blinking == row,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GridState {
    result: ResultSet,
    query: QueryContext,
    dialect: Dialect,
    table: Option<String>,
    primary_key: Option<String>,
    layout: LayoutConfig,
    blink_duration: Duration,
    sort_cycle: SortCycle,
    elapsed: Duration,
    terminal_width: usize,
    widths: Vec<usize>,
    cursor: Cell,
    offset_x: usize,
    offset_y: usize,
    visible_rows: usize,
    visible_columns: usize,
    mode: GridMode,
    sort: SortState,
    blink: Option<Blink>,
    status: Option<StatusMessage>,
}

impl GridState {
    /// Sort state is seeded from the outer ORDER BY of the effective query.
    #[must_use]
    pub fn new(result: ResultSet, query: QueryContext, dialect: Dialect) -> Self {
        let sort = SortState::from_order_by(extract_order_by(query.effective()));
        let mut grid = Self {
            result,
            query,
            dialect,
            table: None,
            primary_key: None,
            layout: LayoutConfig::default(),
            blink_duration: DEFAULT_BLINK,
            sort_cycle: SortCycle::default(),
            elapsed: Duration::ZERO,
            terminal_width: 0,
            widths: Vec::new(),
            cursor: (0, 0),
            offset_x: 0,
            offset_y: 0,
            visible_rows: 1,
            visible_columns: 0,
            mode: GridMode::Browsing,
            sort,
            blink: None,
            status: None,
        };
        grid.relayout();
        grid
    }

    #[must_use]
    pub fn with_table(mut self, table: Option<String>, primary_key: Option<String>) -> Self {
        self.table = table;
        self.primary_key = primary_key;
        self.relayout();
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self.relayout();
        self
    }

    #[must_use]
    pub fn with_blink(mut self, duration: Duration) -> Self {
        self.blink_duration = duration;
        self
    }

    #[must_use]
    pub fn with_sort_cycle(mut self, cycle: SortCycle) -> Self {
        self.sort_cycle = cycle;
        self
    }

    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    #[must_use]
    pub fn result(&self) -> &ResultSet {
        &self.result
    }

    #[must_use]
    pub fn query(&self) -> &QueryContext {
        &self.query
    }

    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    pub fn cursor(&self) -> Cell {
        self.cursor
    }

    #[must_use]
    pub fn offsets(&self) -> (usize, usize) {
        (self.offset_y, self.offset_x)
    }

    #[must_use]
    pub fn column_widths(&self) -> &[usize] {
        &self.widths
    }

    #[must_use]
    pub fn visible_row_range(&self) -> Range<usize> {
        self.offset_y..(self.offset_y + self.visible_rows).min(self.result.row_count())
    }

    #[must_use]
    pub fn visible_column_range(&self) -> Range<usize> {
        self.offset_x..(self.offset_x + self.visible_columns).min(self.result.column_count())
    }

    #[must_use]
    pub fn mode(&self) -> &GridMode {
        &self.mode
    }

    #[must_use]
    pub fn is_visual(&self) -> bool {
        matches!(self.mode, GridMode::VisualSelect { .. })
    }

    #[must_use]
    pub fn selection(&self) -> Selection {
        match self.mode {
            GridMode::VisualSelect { anchor } => Selection::spanning(anchor, self.cursor),
            _ => Selection::single(self.cursor),
        }
    }

    #[must_use]
    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    #[must_use]
    pub fn blink(&self) -> Option<&Blink> {
        self.blink.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    pub fn handle(&mut self, event: GridEvent) -> Option<GridEffect> {
        match event {
            GridEvent::Resize { width, rows } => {
                self.terminal_width = width;
                self.visible_rows = rows.max(1);
                self.relayout();
                None
            }
            GridEvent::Tick(elapsed) => {
                self.tick(elapsed);
                None
            }
            GridEvent::EditorClosed(outcome) => self.editor_closed(outcome),
            GridEvent::ExecutionFinished(outcome) => self.execution_finished(outcome),
            GridEvent::ClipboardFinished(outcome) => {
                self.clipboard_finished(outcome);
                None
            }
            GridEvent::RerunFailed(error) => {
                self.rerun_failed(&error);
                None
            }
            _ if self.mode.is_waiting() => {
                self.report(GridError::Busy);
                None
            }
            GridEvent::Quit => Some(GridEffect::Exit(GridExit::Quit)),
            user_event => {
                self.status = None;
                self.user_action(user_event)
            }
        }
    }

    fn user_action(&mut self, event: GridEvent) -> Option<GridEffect> {
        match event {
            GridEvent::Move(motion) => {
                self.move_cursor(motion);
                None
            }
            GridEvent::ToggleVisual => {
                self.mode = match self.mode {
                    GridMode::VisualSelect { .. } => GridMode::Browsing,
                    _ => GridMode::VisualSelect {
                        anchor: self.cursor,
                    },
                };
                None
            }
            GridEvent::Cancel => {
                self.mode = GridMode::Browsing;
                None
            }
            GridEvent::CopySelection => self.copy_selection(),
            GridEvent::ToggleSort => self.toggle_sort(),
            GridEvent::RequestDelete => self.request_delete(),
            GridEvent::RequestUpdate => self.request_update(),
            GridEvent::RequestEditQuery => {
                self.mode = GridMode::AwaitingEditor(EditorPurpose::EditQuery);
                Some(GridEffect::RunEditor {
                    content: self.query.effective().to_string(),
                    hint: CursorHint::EndOfFile,
                })
            }
            _ => None,
        }
    }

    fn report(&mut self, error: impl std::fmt::Display) {
        warn!(error = %error, "grid action rejected");
        self.status = Some(StatusMessage::error(error.to_string()));
    }

    fn relayout(&mut self) {
        let input = LayoutInput {
            columns: self.result.columns(),
            column_types: self.result.column_types(),
            primary_key: self.primary_key.as_deref(),
            sort_column: self.sort.column.as_deref(),
            rows: self.result.rows(),
            available_width: self.layout.available_width(self.terminal_width),
        };
        self.widths = column_widths(&input, &self.layout);
        self.clamp_cursor();
        self.scroll_to_cursor();
    }

    fn available_width(&self) -> usize {
        self.layout.available_width(self.terminal_width)
    }

    fn clamp_cursor(&mut self) {
        let rows = self.result.row_count();
        let columns = self.result.column_count();
        self.cursor.0 = self.cursor.0.min(rows.saturating_sub(1));
        self.cursor.1 = self.cursor.1.min(columns.saturating_sub(1));
        if self.offset_y >= rows {
            self.offset_y = rows.saturating_sub(1);
        }
        if self.offset_x >= columns {
            self.offset_x = columns.saturating_sub(1);
        }
    }

    /// Shifts each offset by the least amount that brings the cursor back
    /// into view.
    fn scroll_to_cursor(&mut self) {
        let (row, column) = self.cursor;

        if row < self.offset_y {
            self.offset_y = row;
        } else if row >= self.offset_y + self.visible_rows {
            self.offset_y = row + 1 - self.visible_rows;
        }

        if column < self.offset_x {
            self.offset_x = column;
        }
        let available = self.available_width();
        self.visible_columns =
            visible_columns(&self.widths, self.offset_x, available, &self.layout);
        while self.offset_x < column && column >= self.offset_x + self.visible_columns {
            self.offset_x += 1;
            self.visible_columns =
                visible_columns(&self.widths, self.offset_x, available, &self.layout);
        }
    }

    fn move_cursor(&mut self, motion: Motion) {
        if self.is_empty() {
            return;
        }
        let last_row = self.result.row_count() - 1;
        let last_column = self.result.column_count() - 1;
        let page = self.visible_rows.max(1);
        let (row, column) = self.cursor;

        self.cursor = match motion {
            Motion::Up => (row.saturating_sub(1), column),
            Motion::Down => ((row + 1).min(last_row), column),
            Motion::Left => (row, column.saturating_sub(1)),
            Motion::Right => (row, (column + 1).min(last_column)),
            Motion::PageUp => (row.saturating_sub(page), column),
            Motion::PageDown => ((row + page).min(last_row), column),
            Motion::FirstRow => (0, column),
            Motion::LastRow => (last_row, column),
            Motion::FirstColumn => (row, 0),
            Motion::LastColumn => (row, last_column),
        };
        self.scroll_to_cursor();
    }

    fn tick(&mut self, elapsed: Duration) {
        if let Some(blink) = &mut self.blink {
            blink.remaining = blink.remaining.saturating_sub(elapsed);
            if blink.remaining.is_zero() {
                self.blink = None;
            }
        }
    }

    fn start_blink(&mut self, target: BlinkTarget) {
        self.blink = Some(Blink {
            target,
            remaining: self.blink_duration,
        });
    }

    fn copy_selection(&mut self) -> Option<GridEffect> {
        if self.is_empty() {
            self.mode = GridMode::Browsing;
            self.report(GridError::EmptyGrid);
            return None;
        }
        let visual = self.is_visual();
        let selection = self.selection();
        let text = selection.copy_text(&self.result, visual);
        debug!(
            rows = selection.row_count(),
            columns = selection.column_count(),
            "copying selection"
        );
        self.mode = GridMode::AwaitingClipboard { selection };
        Some(GridEffect::WriteClipboard(text))
    }

    fn clipboard_finished(&mut self, outcome: Result<(), String>) {
        let GridMode::AwaitingClipboard { selection } = self.mode else {
            return;
        };
        self.mode = GridMode::Browsing;
        match outcome {
            Ok(()) => {
                self.status = Some(StatusMessage::info(format!(
                    "copied {}x{} cells",
                    selection.row_count(),
                    selection.column_count()
                )));
                self.start_blink(BlinkTarget::Selection(selection));
            }
            Err(error) => self.report(format!("clipboard write failed: {error}")),
        }
    }

    fn toggle_sort(&mut self) -> Option<GridEffect> {
        let Some(column) = self.result.columns().get(self.cursor.1).cloned() else {
            self.report(GridError::EmptyGrid);
            return None;
        };
        self.sort.toggle(&column, self.sort_cycle);
        let rewritten = rewrite_order_by(self.query.effective(), self.sort.order_by().as_ref());
        info!(column = %column, direction = ?self.sort.direction, "sort changed, requesting rerun");
        self.rerun(rewritten)
    }

    fn rerun(&mut self, sql: String) -> Option<GridEffect> {
        self.mode = GridMode::Browsing;
        self.query.rerun = Some(sql.clone());
        Some(GridEffect::Exit(GridExit::Rerun(sql)))
    }

    /// Keeps showing the rows of the last query that ran, with the sort state
    /// it actually has.
    fn rerun_failed(&mut self, error: &str) {
        self.query.rerun = None;
        self.sort = SortState::from_order_by(extract_order_by(self.query.effective()));
        self.mode = GridMode::Browsing;
        self.report(error);
    }

    /// Table, key column name and key column index for a row mutation.
    fn mutation_target(&self) -> Result<(String, String, usize), GridError> {
        if self.is_empty() {
            return Err(GridError::EmptyGrid);
        }
        let table = self.table.clone().ok_or(GridError::NoTable)?;
        let primary_key = self.primary_key.clone().ok_or(GridError::NoPrimaryKey)?;
        let key_index = self
            .result
            .column_index(&primary_key)
            .ok_or(GridError::NoPrimaryKey)?;
        Ok((table, primary_key, key_index))
    }

    fn cell_literal(&self, row: usize, column: usize) -> String {
        let declared = self
            .result
            .column_types()
            .get(column)
            .and_then(Option::as_deref);
        self.dialect
            .quote_literal(self.result.cell(row, column), declared)
    }

    fn request_delete(&mut self) -> Option<GridEffect> {
        let (table, primary_key, key_index) = match self.mutation_target() {
            Ok(target) => target,
            Err(error) => {
                self.mode = GridMode::Browsing;
                self.report(error);
                return None;
            }
        };
        let row = self.cursor.0;
        let key_literal = self.cell_literal(row, key_index);

        match build_delete_statement(&table, &primary_key, &key_literal) {
            Ok(statement) => {
                debug!(table = %table, row, "opening delete statement in editor");
                self.mode = GridMode::AwaitingEditor(EditorPurpose::DeleteRow { row });
                Some(GridEffect::RunEditor {
                    content: delete_editor_content(&statement),
                    hint: CursorHint::WhereValue,
                })
            }
            Err(error) => {
                self.mode = GridMode::Browsing;
                self.report(error);
                None
            }
        }
    }

    fn request_update(&mut self) -> Option<GridEffect> {
        let (table, primary_key, key_index) = match self.mutation_target() {
            Ok(target) => target,
            Err(error) => {
                self.mode = GridMode::Browsing;
                self.report(error);
                return None;
            }
        };
        let (row, column) = self.cursor;
        let column_name = self.result.columns()[column].clone();
        let value_literal = self.cell_literal(row, column);
        let key_literal = self.cell_literal(row, key_index);

        match build_update_statement(
            &table,
            &column_name,
            &value_literal,
            &primary_key,
            &key_literal,
        ) {
            Ok(statement) => {
                self.mode = GridMode::AwaitingEditor(EditorPurpose::UpdateCell { row, column });
                Some(GridEffect::RunEditor {
                    content: update_editor_content(&statement),
                    hint: CursorHint::SetValue,
                })
            }
            Err(error) => {
                self.mode = GridMode::Browsing;
                self.report(error);
                None
            }
        }
    }

    fn editor_closed(&mut self, outcome: EditorOutcome) -> Option<GridEffect> {
        let GridMode::AwaitingEditor(purpose) = self.mode else {
            return None;
        };
        self.mode = GridMode::Browsing;

        let text = match outcome {
            EditorOutcome::Saved(text) if !text.trim().is_empty() => text,
            EditorOutcome::Saved(_) | EditorOutcome::Empty => {
                if purpose != EditorPurpose::EditQuery {
                    self.status = Some(StatusMessage::info(
                        "editor returned nothing; no changes made",
                    ));
                }
                return None;
            }
            EditorOutcome::Failed(error) => {
                self.report(format!("editor failed: {error}"));
                return None;
            }
        };

        match purpose {
            EditorPurpose::EditQuery => {
                info!("query edited, requesting rerun");
                self.rerun(text.trim().to_string())
            }
            EditorPurpose::DeleteRow { row } => match validate_delete_statement(&text) {
                Ok(statement) => {
                    self.mode = GridMode::AwaitingExecution(PendingMutation::DeleteRow { row });
                    Some(GridEffect::ExecuteStatement(statement))
                }
                Err(error) => {
                    self.report(format!("delete validation failed: {error}"));
                    None
                }
            },
            EditorPurpose::UpdateCell { row, column } => match validate_update_statement(&text) {
                Ok(statement) => {
                    let value = self
                        .result
                        .columns()
                        .get(column)
                        .and_then(|name| assigned_value(&statement, name));
                    self.mode = GridMode::AwaitingExecution(PendingMutation::UpdateCell {
                        row,
                        column,
                        value,
                    });
                    Some(GridEffect::ExecuteStatement(statement))
                }
                Err(error) => {
                    self.report(format!("update validation failed: {error}"));
                    None
                }
            },
        }
    }

    fn execution_finished(&mut self, outcome: Result<(), String>) -> Option<GridEffect> {
        if !matches!(self.mode, GridMode::AwaitingExecution(_)) {
            return None;
        }
        let GridMode::AwaitingExecution(pending) =
            std::mem::replace(&mut self.mode, GridMode::Browsing)
        else {
            return None;
        };

        if let Err(error) = outcome {
            self.report(error);
            return None;
        }

        match pending {
            PendingMutation::DeleteRow { row } => {
                self.result.remove_row(row);
                self.cursor.0 = row;
                self.relayout();
                self.status = Some(StatusMessage::info("row deleted"));
                if !self.result.rows().is_empty() {
                    self.start_blink(BlinkTarget::Row(self.cursor.0));
                }
                None
            }
            PendingMutation::UpdateCell {
                row,
                column,
                value: Some(value),
            } => {
                self.result.set_cell(row, column, value);
                self.relayout();
                self.status = Some(StatusMessage::info("cell updated"));
                self.start_blink(BlinkTarget::Selection(Selection::single((row, column))));
                None
            }
            PendingMutation::UpdateCell { value: None, .. } => {
                let sql = self.query.effective().to_string();
                self.rerun(sql)
            }
        }
    }
}
