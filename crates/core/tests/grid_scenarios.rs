use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use qgrid_core::connection::{ConnectionError, SqlConnection, TableMetadata};
use qgrid_core::dialect::Dialect;
use qgrid_core::grid::{
    EditorOutcome, GridEffect, GridEvent, GridExit, GridMode, GridState, Motion, QueryContext,
    StatusKind,
};
use qgrid_core::params::{extract_parameters, resolve_parameters, substitute_parameters};
use qgrid_core::result_set::{QueryRow, ResultSet};
use qgrid_core::sql_rewriter::{apply_row_limit, detect_table, SortDirection};

/// In-memory `users` table keyed by `id`.
struct FakeConnection {
    rows: Mutex<Vec<(i64, String)>>,
    executed: Mutex<Vec<String>>,
    queries: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeConnection {
    fn with_users(count: i64) -> Self {
        Self {
            rows: Mutex::new((1..=count).map(|id| (id, format!("user{id}"))).collect()),
            executed: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().expect("executed lock").clone()
    }

    fn last_query(&self) -> (String, Vec<String>) {
        self.queries
            .lock()
            .expect("queries lock")
            .last()
            .cloned()
            .expect("a query should have run")
    }
}

#[async_trait]
impl SqlConnection for FakeConnection {
    async fn execute_query(
        &self,
        statement: &str,
        args: &[String],
    ) -> Result<ResultSet, ConnectionError> {
        self.queries
            .lock()
            .expect("queries lock")
            .push((statement.to_string(), args.to_vec()));
        let mut rows = self.rows.lock().expect("rows lock").clone();
        if statement.contains("ORDER BY name DESC") {
            rows.sort_by(|left, right| right.1.cmp(&left.1));
        }
        Ok(ResultSet::new(
            vec!["id".to_string(), "name".to_string()],
            rows.into_iter()
                .map(|(id, name)| QueryRow::from_iter([id.to_string(), name]))
                .collect(),
        ))
    }

    async fn execute(&self, statement: &str) -> Result<(), ConnectionError> {
        if statement.contains("WHERE id = 404") {
            return Err(ConnectionError::new("row is locked by another session"));
        }
        let Some(id) = statement
            .rsplit('=')
            .next()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
        else {
            return Err(ConnectionError::new("unsupported statement"));
        };
        self.rows
            .lock()
            .expect("rows lock")
            .retain(|(existing, _)| *existing != id);
        self.executed
            .lock()
            .expect("executed lock")
            .push(statement.to_string());
        Ok(())
    }

    async fn table_metadata(&self, table: &str) -> Result<Option<TableMetadata>, ConnectionError> {
        Ok((table == "users").then(|| TableMetadata {
            primary_key: Some("id".to_string()),
            column_types: vec![
                ("id".to_string(), "bigint".to_string()),
                ("name".to_string(), "varchar(64)".to_string()),
            ],
        }))
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }
}

/// Runs effects the way a terminal host would, with a scripted editor and
/// clipboard.
struct Host<'a> {
    connection: &'a FakeConnection,
    editor: Box<dyn FnMut(&str) -> EditorOutcome + 'a>,
    clipboard: Vec<String>,
}

impl Host<'_> {
    async fn open(&self, context: QueryContext) -> GridState {
        let sql = apply_row_limit(context.effective(), 100, self.connection.dialect());
        let result = self
            .connection
            .execute_query(&sql, &[])
            .await
            .expect("query should run");
        let table = detect_table(context.effective());
        let metadata = match &table {
            Some(table) => self
                .connection
                .table_metadata(table)
                .await
                .expect("metadata should load"),
            None => None,
        };
        let (primary_key, result) = match metadata {
            Some(metadata) => (
                metadata.primary_key,
                result.with_column_types(&metadata.column_types),
            ),
            None => (None, result),
        };

        let mut grid = GridState::new(result, context, self.connection.dialect())
            .with_table(table, primary_key);
        grid.handle(GridEvent::Resize { width: 100, rows: 3 });
        grid
    }

    async fn dispatch(&mut self, grid: &mut GridState, event: GridEvent) -> Option<GridExit> {
        let mut next = grid.handle(event);
        while let Some(effect) = next.take() {
            let event = match effect {
                GridEffect::Exit(exit) => return Some(exit),
                GridEffect::RunEditor { content, .. } => {
                    GridEvent::EditorClosed((self.editor)(&content))
                }
                GridEffect::WriteClipboard(text) => {
                    self.clipboard.push(text);
                    GridEvent::ClipboardFinished(Ok(()))
                }
                GridEffect::ExecuteStatement(statement) => GridEvent::ExecutionFinished(
                    self.connection
                        .execute(&statement)
                        .await
                        .map_err(|error| error.to_string()),
                ),
            };
            next = grid.handle(event);
        }
        None
    }
}

fn keep_editor_content() -> Box<dyn FnMut(&str) -> EditorOutcome> {
    Box::new(|content: &str| EditorOutcome::Saved(content.to_string()))
}

#[tokio::test]
async fn delete_flows_through_editor_and_connection() {
    let connection = FakeConnection::with_users(4);
    let mut host = Host {
        connection: &connection,
        editor: keep_editor_content(),
        clipboard: Vec::new(),
    };
    let mut grid = host.open(QueryContext::new("SELECT * FROM users")).await;
    assert_eq!(grid.primary_key(), Some("id"));
    assert_eq!(grid.result().column_types()[1].as_deref(), Some("varchar(64)"));

    host.dispatch(&mut grid, GridEvent::Move(Motion::Down)).await;
    host.dispatch(&mut grid, GridEvent::RequestDelete).await;

    assert_eq!(connection.executed(), vec!["DELETE FROM users WHERE id = 2".to_string()]);
    assert_eq!(grid.result().row_count(), 3);
    assert_eq!(grid.result().cell(1, 0), "3");
    assert_eq!(grid.cursor(), (1, 0));
    assert!(grid.blink().is_some());
}

#[tokio::test]
async fn unsafe_edit_of_delete_is_never_executed() {
    let connection = FakeConnection::with_users(2);
    let mut host = Host {
        connection: &connection,
        editor: Box::new(|_: &str| EditorOutcome::Saved("DELETE FROM users".to_string())),
        clipboard: Vec::new(),
    };
    let mut grid = host.open(QueryContext::new("SELECT * FROM users")).await;

    host.dispatch(&mut grid, GridEvent::RequestDelete).await;

    assert!(connection.executed().is_empty());
    assert_eq!(grid.result().row_count(), 2);
    assert_eq!(grid.mode(), &GridMode::Browsing);
    let status = grid.status().expect("validation failure should be reported");
    assert_eq!(status.kind, StatusKind::Error);
    assert!(status.text.contains("WHERE"));
}

#[tokio::test]
async fn execution_errors_are_reported_verbatim() {
    let connection = FakeConnection::with_users(1);
    let mut host = Host {
        connection: &connection,
        editor: Box::new(|_: &str| {
            EditorOutcome::Saved("DELETE FROM users WHERE id = 404".to_string())
        }),
        clipboard: Vec::new(),
    };
    let mut grid = host.open(QueryContext::new("SELECT * FROM users")).await;

    host.dispatch(&mut grid, GridEvent::RequestDelete).await;

    assert_eq!(grid.result().row_count(), 1);
    assert_eq!(
        grid.status().map(|status| status.text.as_str()),
        Some("row is locked by another session")
    );
}

#[tokio::test]
async fn joins_cannot_delete() {
    let connection = FakeConnection::with_users(2);
    let mut host = Host {
        connection: &connection,
        editor: keep_editor_content(),
        clipboard: Vec::new(),
    };
    let mut grid = host
        .open(QueryContext::new(
            "SELECT * FROM users u JOIN orders o ON o.user_id = u.id",
        ))
        .await;

    assert_eq!(host.dispatch(&mut grid, GridEvent::RequestDelete).await, None);
    assert!(connection.executed().is_empty());
    assert_eq!(grid.status().map(|status| status.kind), Some(StatusKind::Error));
}

#[tokio::test]
async fn sort_cycle_reruns_with_rewritten_query() {
    let connection = FakeConnection::with_users(3);
    let mut host = Host {
        connection: &connection,
        editor: keep_editor_content(),
        clipboard: Vec::new(),
    };
    let mut context = QueryContext::new("SELECT * FROM users");
    let mut expected = [
        ("SELECT * FROM users ORDER BY name ASC", Some(SortDirection::Ascending)),
        ("SELECT * FROM users ORDER BY name DESC", Some(SortDirection::Descending)),
        ("SELECT * FROM users", None),
    ]
    .into_iter();

    loop {
        let mut grid = host.open(context.clone()).await;
        host.dispatch(&mut grid, GridEvent::Move(Motion::Right)).await;
        let Some(GridExit::Rerun(sql)) = host.dispatch(&mut grid, GridEvent::ToggleSort).await
        else {
            panic!("sort should request a rerun");
        };
        let Some((expected_sql, expected_direction)) = expected.next() else {
            break;
        };
        assert_eq!(sql, expected_sql);

        context = QueryContext::new("SELECT * FROM users").with_last_executed(sql);
        let reopened = host.open(context.clone()).await;
        assert_eq!(reopened.sort().column.is_some(), expected_direction.is_some());
        if let Some(direction) = expected_direction {
            assert_eq!(reopened.sort().direction, direction);
        }
    }

    let (sql, _) = connection.last_query();
    assert_eq!(sql, "SELECT * FROM users\nLIMIT 100");
}

#[tokio::test]
async fn visual_copy_lands_on_clipboard_with_header() {
    let connection = FakeConnection::with_users(3);
    let mut host = Host {
        connection: &connection,
        editor: keep_editor_content(),
        clipboard: Vec::new(),
    };
    let mut grid = host.open(QueryContext::new("SELECT * FROM users")).await;

    host.dispatch(&mut grid, GridEvent::ToggleVisual).await;
    host.dispatch(&mut grid, GridEvent::Move(Motion::Down)).await;
    host.dispatch(&mut grid, GridEvent::Move(Motion::Right)).await;
    host.dispatch(&mut grid, GridEvent::CopySelection).await;

    assert_eq!(host.clipboard, vec!["id  name\n1   user1\n2   user2".to_string()]);
    assert!(!grid.is_visual());
    assert!(grid.blink().is_some());
}

#[tokio::test]
async fn viewport_keeps_cursor_visible_through_any_motion() {
    let connection = FakeConnection::with_users(25);
    let mut host = Host {
        connection: &connection,
        editor: keep_editor_content(),
        clipboard: Vec::new(),
    };
    let mut grid = host.open(QueryContext::new("SELECT * FROM users")).await;

    let motions = [
        Motion::PageDown,
        Motion::Down,
        Motion::LastRow,
        Motion::PageUp,
        Motion::Up,
        Motion::LastColumn,
        Motion::FirstRow,
        Motion::Left,
        Motion::PageDown,
        Motion::FirstColumn,
    ];
    for motion in motions {
        host.dispatch(&mut grid, GridEvent::Move(motion)).await;
        let (row, column) = grid.cursor();
        assert!(grid.visible_row_range().contains(&row), "{motion:?}: row {row}");
        assert!(
            grid.visible_column_range().contains(&column),
            "{motion:?}: column {column}"
        );
    }
}

#[test]
fn wide_results_scroll_horizontally_and_survive_resizes() {
    let columns: Vec<String> = (1..=12).map(|index| format!("column_{index:02}")).collect();
    let rows = (1..=6)
        .map(|row| {
            QueryRow::from_iter(
                (1..=12).map(|column| format!("row {row} value in column {column}")),
            )
        })
        .collect();
    let mut grid = GridState::new(
        ResultSet::new(columns, rows),
        QueryContext::new("SELECT * FROM wide"),
        Dialect::MySql,
    );
    grid.handle(GridEvent::Resize { width: 60, rows: 3 });
    assert!(grid.visible_column_range().len() < 12);

    let mut scrolled = false;
    let steps = [
        GridEvent::Move(Motion::Right),
        GridEvent::Move(Motion::Right),
        GridEvent::Move(Motion::Right),
        GridEvent::Move(Motion::Right),
        GridEvent::Move(Motion::LastColumn),
        GridEvent::Move(Motion::LastRow),
        GridEvent::Resize { width: 40, rows: 2 },
        GridEvent::Move(Motion::Left),
        GridEvent::Resize { width: 200, rows: 10 },
        GridEvent::Move(Motion::FirstColumn),
        GridEvent::Resize { width: 30, rows: 1 },
        GridEvent::Move(Motion::Right),
        GridEvent::Move(Motion::PageUp),
        GridEvent::Move(Motion::LastColumn),
    ];
    for step in steps {
        let label = format!("{step:?}");
        grid.handle(step);
        let (row, column) = grid.cursor();
        assert!(grid.visible_row_range().contains(&row), "{label}: row {row}");
        assert!(
            grid.visible_column_range().contains(&column),
            "{label}: column {column}"
        );
        scrolled |= grid.offsets().1 > 0;
    }
    assert!(scrolled, "a 60-cell terminal should scroll across 12 wide columns");
    assert_eq!(grid.cursor().1, 11);
}

#[tokio::test]
async fn parameters_bind_in_order_of_first_use() {
    let connection = FakeConnection::with_users(1);
    let sql = "SELECT * FROM users WHERE id = :id OR name = :name|'user1' OR id = :id";
    let defs = extract_parameters(sql);
    let supplied: HashMap<String, String> = [("id".to_string(), "1".to_string())].into();
    let values = resolve_parameters(&defs, &supplied);
    let substituted =
        substitute_parameters(sql, &values, |position| connection.placeholder(position))
            .expect("parameters should substitute");

    connection
        .execute_query(&substituted.sql, &substituted.args)
        .await
        .expect("query should run");
    let (executed, args) = connection.last_query();
    assert_eq!(
        executed,
        "SELECT * FROM users WHERE id = $1 OR name = $2 OR id = $1"
    );
    assert_eq!(args, vec!["1".to_string(), "user1".to_string()]);
}
