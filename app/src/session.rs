use std::collections::HashMap;
use std::time::{Duration, Instant};

use qgrid_core::connection::{ConnectionError, SqlConnection};
use qgrid_core::grid::{GridEvent, GridExit, GridState, QueryContext};
use qgrid_core::layout::LayoutConfig;
use qgrid_core::params::{
    extract_parameters, missing_required, resolve_parameters, substitute_parameters,
    validate_names, validate_supplied, ParameterError,
};
use qgrid_core::settings::Settings;
use qgrid_core::sql_rewriter::{apply_row_limit, detect_table};
use qgrid_tui::TuiError;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error("missing values for parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),
    #[error("query failed: {0}")]
    Query(#[from] ConnectionError),
    #[error(transparent)]
    Tui(#[from] TuiError),
}

impl SessionError {
    /// Database errors are shown exactly as the driver reported them.
    fn status_text(&self) -> String {
        match self {
            Self::Query(error) => error.to_string(),
            other => other.to_string(),
        }
    }
}

/// Parameter values for `sql`: defaults overridden by `supplied`. Reserved
/// names, unknown supplied names and required parameters left without a
/// value are all rejected before anything is sent to the database.
pub fn resolve_query_parameters(
    sql: &str,
    supplied: &[(String, String)],
) -> Result<HashMap<String, String>, SessionError> {
    let defs = extract_parameters(sql);
    validate_names(&defs)?;
    let supplied: HashMap<String, String> = supplied.iter().cloned().collect();
    validate_supplied(&supplied, &defs)?;

    let values = resolve_parameters(&defs, &supplied);
    let missing = missing_required(&defs, &values);
    if !missing.is_empty() {
        return Err(SessionError::MissingParameters(missing));
    }
    Ok(values)
}

/// Runs the query, shows the grid, and reruns whatever the grid asks for.
pub struct Session<'a> {
    connection: &'a dyn SqlConnection,
    runtime: Handle,
    values: HashMap<String, String>,
    row_limit: usize,
    table: Option<String>,
    layout: LayoutConfig,
    blink: Duration,
}

impl<'a> Session<'a> {
    #[must_use]
    pub fn new(
        connection: &'a dyn SqlConnection,
        runtime: Handle,
        settings: &Settings,
        values: HashMap<String, String>,
    ) -> Self {
        Self {
            connection,
            runtime,
            values,
            row_limit: settings.row_limit,
            table: None,
            layout: settings.layout,
            blink: settings.blink(),
        }
    }

    #[must_use]
    pub fn with_row_limit(mut self, row_limit: usize) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Edits target `table` instead of whatever the query appears to select from.
    #[must_use]
    pub fn with_table(mut self, table: Option<String>) -> Self {
        self.table = table;
        self
    }

    pub fn open(&self, query: QueryContext) -> Result<GridState, SessionError> {
        let dialect = self.connection.dialect();
        let limited = apply_row_limit(query.effective(), self.row_limit, dialect);
        let substituted = substitute_parameters(&limited, &self.values, |position| {
            self.connection.placeholder(position)
        })?;

        info!(args = substituted.args.len(), "running query");
        let started = Instant::now();
        let result = self
            .runtime
            .block_on(
                self.connection
                    .execute_query(&substituted.sql, &substituted.args),
            )?;
        let elapsed = started.elapsed();
        info!(
            rows = result.row_count(),
            elapsed_ms = elapsed.as_millis(),
            "query finished"
        );

        let table = self
            .table
            .clone()
            .or_else(|| detect_table(query.effective()));
        let metadata = match &table {
            Some(table) => self
                .runtime
                .block_on(self.connection.table_metadata(table))
                .unwrap_or_else(|error| {
                    warn!(%error, table = %table, "could not load table metadata");
                    None
                }),
            None => None,
        };
        let (primary_key, result) = match metadata {
            Some(metadata) => (
                metadata.primary_key,
                result.with_column_types(&metadata.column_types),
            ),
            None => (None, result),
        };

        Ok(GridState::new(result, query, dialect)
            .with_table(table, primary_key)
            .with_layout(self.layout)
            .with_blink(self.blink)
            .with_elapsed(elapsed))
    }

    /// Shows grids until one quits. Only the first open is fatal: when a rerun
    /// fails the previous grid comes back with the error in its status line.
    pub fn run<F>(&self, original: &str, mut show: F) -> Result<(), SessionError>
    where
        F: FnMut(&mut GridState) -> Result<GridExit, SessionError>,
    {
        let mut grid = self.open(QueryContext::new(original))?;
        loop {
            match show(&mut grid)? {
                GridExit::Quit => return Ok(()),
                GridExit::Rerun(sql) => {
                    info!("rerunning query from grid");
                    match self.open(QueryContext::new(original).with_last_executed(sql)) {
                        Ok(reopened) => grid = reopened,
                        Err(error) => {
                            warn!(%error, "rerun failed, keeping previous grid");
                            grid.handle(GridEvent::RerunFailed(error.status_text()));
                        }
                    }
                }
            }
        }
    }
}
