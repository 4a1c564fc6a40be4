//! Regex-level clause rewriting: row limits, the outermost ORDER BY, and the
//! DELETE statements the grid hands to the editor.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::dialect::{Dialect, LimitSyntax};
use crate::result_set::NULL_DISPLAY;

static LIMIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\s+\d+").expect("valid LIMIT pattern"));
static FETCH_FIRST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bFETCH\s+FIRST\s+\d+").expect("valid FETCH FIRST pattern")
});
static ROWNUM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bROWNUM\s*[<>=]").expect("valid ROWNUM pattern"));
static ORDER_BY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+ORDER\s+BY\s+").expect("valid ORDER BY pattern"));
static ORDER_BY_END_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:LIMIT|OFFSET|FETCH)\b|\s*;").expect("valid ORDER BY end pattern")
});
static ORDER_TERM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*([\w.$]+|"[^"]+"|`[^`]+`)(?:\s+(ASC|DESC)\b)?"#)
        .expect("valid ORDER BY term pattern")
});
static LIMIT_TAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s+((?:LIMIT\s+\d+(?:\s*,\s*\d+|\s+OFFSET\s+\d+)?)|(?:OFFSET\s+\d+(?:\s+ROWS?)?(?:\s+FETCH\s+(?:FIRST|NEXT)\s+\d+\s+ROWS?\s+ONLY)?)|(?:FETCH\s+(?:FIRST|NEXT)\s+\d+\s+ROWS?\s+ONLY))\s*$",
    )
    .expect("valid LIMIT tail pattern")
});
static DELETE_PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*DELETE\s+FROM\b").expect("valid DELETE pattern"));
static UPDATE_PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*UPDATE\s+\S+\s+SET\b").expect("valid UPDATE pattern"));
static SINGLE_ASSIGNMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\bSET\s+([\w.`"]+)\s*=\s*('(?:[^']|'')*'|[^\s,']+)\s+WHERE\b"#)
        .expect("valid SET assignment pattern")
});
static WHERE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bWHERE\b").expect("valid WHERE pattern"));
static SINGLE_TABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)^\s*SELECT\s+.+?\s+FROM\s+([A-Za-z_][\w$]*(?:\.[A-Za-z_][\w$]*)?|`[^`]+`|"[^"]+")(?:\s+(?:AS\s+)?[A-Za-z_]\w*)?\s*(?:;\s*)?(?:$|\b(?:WHERE|ORDER|GROUP|HAVING|LIMIT|OFFSET|FETCH)\b)"#,
    )
    .expect("valid single table pattern")
});

const RESULT_KEYWORDS: [&str; 7] = [
    "SELECT", "WITH", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "PRAGMA",
];

const UPDATE_HEADER: &str = "-- UPDATE Statement\n\
-- Edit the value after SET, keep the WHERE clause, then save and quit.\n\
--\n";

const DELETE_WARNING_HEADER: &str = "-- DELETE Statement\n\
-- WARNING: This will permanently delete data!\n\
-- Ensure the WHERE clause is present and correct before saving.\n\
--\n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("no table to delete from")]
    MissingTable,
    #[error("no primary key column to match on")]
    MissingPrimaryKey,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeleteValidationError {
    #[error("empty SQL statement")]
    Empty,
    #[error("not a DELETE statement")]
    NotDelete,
    #[error("DELETE statement must include a WHERE clause")]
    MissingWhere,
    #[error("only a single DELETE statement can be executed")]
    MultipleStatements,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpdateValidationError {
    #[error("empty SQL statement")]
    Empty,
    #[error("not an UPDATE ... SET statement")]
    NotUpdate,
    #[error("UPDATE statement must include a WHERE clause")]
    MissingWhere,
    #[error("only a single UPDATE statement can be executed")]
    MultipleStatements,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    /// Column is sorted with the database default, no keyword is written.
    #[default]
    Unspecified,
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Unspecified => None,
            Self::Ascending => Some("ASC"),
            Self::Descending => Some("DESC"),
        }
    }

    fn from_keyword(keyword: Option<&str>) -> Self {
        match keyword.map(str::to_ascii_uppercase).as_deref() {
            Some("ASC") => Self::Ascending,
            Some("DESC") => Self::Descending,
            _ => Self::Unspecified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderBy {
    #[must_use]
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    fn render(&self) -> String {
        match self.direction.keyword() {
            Some(keyword) => format!("ORDER BY {} {keyword}", self.column),
            None => format!("ORDER BY {}", self.column),
        }
    }
}

/// First keyword after any leading `--` comment lines, uppercased.
fn leading_keyword(sql: &str) -> Option<String> {
    sql.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("--"))
        .and_then(|line| {
            line.split(|ch: char| ch.is_whitespace() || ch == '(' || ch == ';')
                .next()
                .map(str::to_ascii_uppercase)
        })
}

#[must_use]
pub fn is_result_producing(sql: &str) -> bool {
    leading_keyword(sql).is_some_and(|keyword| RESULT_KEYWORDS.contains(&keyword.as_str()))
}

#[must_use]
pub fn has_row_limit(sql: &str, dialect: Dialect) -> bool {
    match dialect.limit_syntax() {
        LimitSyntax::Limit => LIMIT_PATTERN.is_match(sql),
        LimitSyntax::FetchFirst => {
            FETCH_FIRST_PATTERN.is_match(sql) || ROWNUM_PATTERN.is_match(sql)
        }
        LimitSyntax::Unsupported => false,
    }
}

/// Appends the dialect's row cap to result-producing statements that lack
/// one. Anything else comes back unchanged, so applying this twice is the
/// same as applying it once.
#[must_use]
pub fn apply_row_limit(sql: &str, limit: usize, dialect: Dialect) -> String {
    if limit == 0 || !is_result_producing(sql) || has_row_limit(sql, dialect) {
        return sql.to_string();
    }
    let Some(clause) = dialect.limit_clause(limit) else {
        return sql.to_string();
    };

    let body = sql.trim().trim_end_matches(';').trim_end();
    format!("{body}\n{clause}")
}

/// Byte range of the last ORDER BY clause that is not nested inside
/// parentheses. The range starts at the whitespace preceding `ORDER` and ends
/// before the next LIMIT, OFFSET, FETCH, terminator, or end of text.
#[must_use]
pub fn find_outer_order_by(sql: &str) -> Option<Range<usize>> {
    let outer = ORDER_BY_PATTERN
        .find_iter(sql)
        .filter(|found| {
            let prefix = &sql[..found.start()];
            prefix.matches('(').count() == prefix.matches(')').count()
        })
        .last()?;

    let end = ORDER_BY_END_PATTERN
        .find(&sql[outer.end()..])
        .map_or(sql.len(), |marker| outer.end() + marker.start());
    Some(outer.start()..end)
}

#[must_use]
pub fn extract_order_by(sql: &str) -> Option<OrderBy> {
    let range = find_outer_order_by(sql)?;
    let clause = &sql[range];
    let terms = ORDER_BY_PATTERN
        .find(clause)
        .map_or(clause, |found| &clause[found.end()..]);

    let captures = ORDER_TERM_PATTERN.captures(terms)?;
    Some(OrderBy {
        column: captures[1].to_string(),
        direction: SortDirection::from_keyword(captures.get(2).map(|found| found.as_str())),
    })
}

/// Splits a trailing LIMIT/OFFSET/FETCH tail off the statement.
#[must_use]
pub fn split_limit_tail(sql: &str) -> (&str, Option<&str>) {
    match LIMIT_TAIL_PATTERN.captures(sql) {
        Some(captures) => {
            let whole = captures.get(0).map_or(sql.len(), |found| found.start());
            (&sql[..whole], captures.get(1).map(|found| found.as_str()))
        }
        None => (sql, None),
    }
}

/// Replaces the outermost ORDER BY with `order` (or drops it when `None`),
/// leaving subquery ORDER BYs and any LIMIT/OFFSET tail intact.
#[must_use]
pub fn rewrite_order_by(sql: &str, order: Option<&OrderBy>) -> String {
    let trimmed = sql.trim().trim_end_matches(';').trim_end();
    let (body, tail) = split_limit_tail(trimmed);

    let mut rewritten = match find_outer_order_by(body) {
        Some(range) => format!("{}{}", &body[..range.start], &body[range.end..]),
        None => body.to_string(),
    };
    rewritten = rewritten.trim().to_string();

    if let Some(order) = order {
        push_clause(&mut rewritten, &order.render());
    }
    if let Some(tail) = tail {
        push_clause(&mut rewritten, tail);
    }
    rewritten
}

/// Appends `clause` on the same line unless that line ends in a comment,
/// which would swallow it.
fn push_clause(sql: &mut String, clause: &str) {
    let last_line = sql.lines().last().unwrap_or_default().trim();
    if strip_comments(last_line) == last_line {
        sql.push(' ');
    } else {
        sql.push('\n');
    }
    sql.push_str(clause);
}

/// `literal` must already be quoted by the connection's dialect.
pub fn build_delete_statement(
    table: &str,
    primary_key: &str,
    literal: &str,
) -> Result<String, RewriteError> {
    let table = table.trim();
    let primary_key = primary_key.trim();
    if table.is_empty() {
        return Err(RewriteError::MissingTable);
    }
    if primary_key.is_empty() {
        return Err(RewriteError::MissingPrimaryKey);
    }
    Ok(format!("DELETE FROM {table} WHERE {primary_key} = {literal}"))
}

/// File content handed to the editor for a pending delete.
#[must_use]
pub fn delete_editor_content(statement: &str) -> String {
    format!("{DELETE_WARNING_HEADER}{statement};\n")
}

/// Removes `--` and `/* */` comments outside quotes and flattens what is left
/// onto a single line.
fn strip_comments(sql: &str) -> String {
    let mut cleaned = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut in_backtick = false;

    while let Some(ch) = chars.next() {
        let quoted = in_single_quote || in_double_quote || in_backtick;
        if !quoted && ch == '-' && chars.peek() == Some(&'-') {
            while chars.next_if(|next| *next != '\n').is_some() {}
            continue;
        }
        if !quoted && ch == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut previous = ' ';
            for next in chars.by_ref() {
                if previous == '*' && next == '/' {
                    break;
                }
                previous = next;
            }
            cleaned.push(' ');
            continue;
        }

        match ch {
            '\'' if !in_double_quote && !in_backtick => in_single_quote = !in_single_quote,
            '"' if !in_single_quote && !in_backtick => in_double_quote = !in_double_quote,
            '`' if !in_single_quote && !in_double_quote => in_backtick = !in_backtick,
            _ => {}
        }
        cleaned.push(ch);
    }

    cleaned
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Checks an editor round-trip result and returns the single-line statement
/// to execute.
pub fn validate_delete_statement(sql: &str) -> Result<String, DeleteValidationError> {
    let cleaned = strip_comments(sql);
    if cleaned.is_empty() {
        return Err(DeleteValidationError::Empty);
    }
    if !DELETE_PREFIX_PATTERN.is_match(&cleaned) {
        return Err(DeleteValidationError::NotDelete);
    }
    if !WHERE_PATTERN.is_match(&cleaned) {
        return Err(DeleteValidationError::MissingWhere);
    }
    if split_statements(&cleaned).len() > 1 {
        return Err(DeleteValidationError::MultipleStatements);
    }

    Ok(cleaned.trim_end_matches(';').trim_end().to_string())
}

/// Literals must already be quoted by the connection's dialect.
pub fn build_update_statement(
    table: &str,
    column: &str,
    value_literal: &str,
    primary_key: &str,
    key_literal: &str,
) -> Result<String, RewriteError> {
    let table = table.trim();
    let primary_key = primary_key.trim();
    if table.is_empty() {
        return Err(RewriteError::MissingTable);
    }
    if primary_key.is_empty() {
        return Err(RewriteError::MissingPrimaryKey);
    }
    Ok(format!(
        "UPDATE {table}\nSET {column} = {value_literal}\nWHERE {primary_key} = {key_literal}"
    ))
}

#[must_use]
pub fn update_editor_content(statement: &str) -> String {
    format!("{UPDATE_HEADER}{statement};\n")
}

pub fn validate_update_statement(sql: &str) -> Result<String, UpdateValidationError> {
    let cleaned = strip_comments(sql);
    if cleaned.is_empty() {
        return Err(UpdateValidationError::Empty);
    }
    if !UPDATE_PREFIX_PATTERN.is_match(&cleaned) {
        return Err(UpdateValidationError::NotUpdate);
    }
    if !WHERE_PATTERN.is_match(&cleaned) {
        return Err(UpdateValidationError::MissingWhere);
    }
    if split_statements(&cleaned).len() > 1 {
        return Err(UpdateValidationError::MultipleStatements);
    }

    Ok(cleaned.trim_end_matches(';').trim_end().to_string())
}

/// Display value a single-assignment UPDATE writes into `column`, when it can
/// be read back without asking the database.
#[must_use]
pub fn assigned_value(statement: &str, column: &str) -> Option<String> {
    let captures = SINGLE_ASSIGNMENT_PATTERN.captures(statement)?;
    let target = captures[1].trim_matches(|ch| ch == '`' || ch == '"');
    if !target.eq_ignore_ascii_case(column) {
        return None;
    }

    let raw = &captures[2];
    if let Some(inner) = raw.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')) {
        return Some(inner.replace("''", "'"));
    }
    if raw.eq_ignore_ascii_case("NULL") {
        return Some(NULL_DISPLAY.to_string());
    }
    Some(raw.to_string())
}

/// Table of a plain `SELECT ... FROM <table>` query; `None` for joins, comma
/// lists and derived tables.
#[must_use]
pub fn detect_table(sql: &str) -> Option<String> {
    let cleaned = strip_comments(sql);
    SINGLE_TABLE_PATTERN
        .captures(&cleaned)
        .map(|captures| captures[1].to_string())
}

fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();

    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut in_backtick = false;
    let mut in_block_comment = false;

    while let Some(ch) = chars.next() {
        if in_block_comment {
            if ch == '*' && chars.peek() == Some(&'/') {
                chars.next();
                in_block_comment = false;
            }
            continue;
        }

        let quoted = in_single_quote || in_double_quote || in_backtick;
        if !quoted && ch == '/' && chars.peek() == Some(&'*') {
            chars.next();
            in_block_comment = true;
            continue;
        }

        match ch {
            '\'' if !in_double_quote && !in_backtick => in_single_quote = !in_single_quote,
            '"' if !in_single_quote && !in_backtick => in_double_quote = !in_double_quote,
            '`' if !in_single_quote && !in_double_quote => in_backtick = !in_backtick,
            ';' if !quoted => {
                let statement = current.trim();
                if !statement.is_empty() {
                    statements.push(statement.to_string());
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    let trailing = current.trim();
    if !trailing.is_empty() {
        statements.push(trailing.to_string());
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::{
        apply_row_limit, assigned_value, build_delete_statement, build_update_statement,
        delete_editor_content, detect_table, extract_order_by, find_outer_order_by,
        is_result_producing, rewrite_order_by, split_limit_tail, update_editor_content,
        validate_delete_statement, validate_update_statement, DeleteValidationError, OrderBy,
        RewriteError, SortDirection, UpdateValidationError,
    };
    use crate::dialect::Dialect;

    #[test]
    fn classifies_result_producing_statements() {
        assert!(is_result_producing("select * from users"));
        assert!(is_result_producing("WITH recent AS (SELECT 1) SELECT * FROM recent"));
        assert!(is_result_producing("  PRAGMA table_info(users)"));
        assert!(is_result_producing("-- latest\nSELECT 1"));
        assert!(!is_result_producing("UPDATE users SET name = 'x'"));
        assert!(!is_result_producing("SELECTED"));
        assert!(!is_result_producing(""));
    }

    #[test]
    fn appends_limit_for_standard_dialects() {
        assert_eq!(
            apply_row_limit("SELECT * FROM users;", 50, Dialect::Postgres),
            "SELECT * FROM users\nLIMIT 50"
        );
        assert_eq!(
            apply_row_limit("SELECT * FROM users", 50, Dialect::Oracle),
            "SELECT * FROM users\nFETCH FIRST 50 ROWS ONLY"
        );
    }

    #[test]
    fn keeps_existing_limits_and_non_queries() {
        let limited = "SELECT * FROM users limit 5";
        assert_eq!(apply_row_limit(limited, 50, Dialect::MySql), limited);
        let rownum = "SELECT * FROM users WHERE ROWNUM <= 5";
        assert_eq!(apply_row_limit(rownum, 50, Dialect::Oracle), rownum);
        let update = "UPDATE users SET a = 1";
        assert_eq!(apply_row_limit(update, 50, Dialect::MySql), update);
        assert_eq!(apply_row_limit("SELECT 1", 0, Dialect::MySql), "SELECT 1");
        assert_eq!(apply_row_limit("SELECT 1", 5, Dialect::Generic), "SELECT 1");
    }

    #[test]
    fn row_limit_is_idempotent() {
        for dialect in [
            Dialect::Postgres,
            Dialect::MySql,
            Dialect::Sqlite,
            Dialect::Oracle,
            Dialect::Generic,
        ] {
            for sql in [
                "SELECT * FROM t",
                "select a from b order by a;",
                "SHOW TABLES",
                "DELETE FROM t WHERE id = 1",
                "SELECT * FROM t LIMIT 3",
            ] {
                let once = apply_row_limit(sql, 25, dialect);
                let twice = apply_row_limit(&once, 25, dialect);
                assert_eq!(once, twice, "{dialect:?}: {sql}");
            }
        }
    }

    #[test]
    fn outer_order_by_skips_subqueries() {
        let sql = "SELECT * FROM (SELECT x FROM y ORDER BY z) t ORDER BY a DESC";
        let range = find_outer_order_by(sql).expect("outer ORDER BY expected");
        assert_eq!(&sql[range], " ORDER BY a DESC");

        let inner_only = "SELECT * FROM (SELECT x FROM y ORDER BY z) t";
        assert!(find_outer_order_by(inner_only).is_none());
    }

    #[test]
    fn last_outer_order_by_wins() {
        let sql = "SELECT a FROM t ORDER BY a UNION SELECT b FROM u ORDER BY b ASC";
        assert_eq!(
            extract_order_by(sql),
            Some(OrderBy::new("b", SortDirection::Ascending))
        );
    }

    #[test]
    fn order_by_clause_ends_before_limit() {
        let sql = "SELECT * FROM t ORDER BY name desc LIMIT 10 OFFSET 5";
        let range = find_outer_order_by(sql).expect("ORDER BY expected");
        assert_eq!(&sql[range], " ORDER BY name desc");
        assert_eq!(
            extract_order_by(sql),
            Some(OrderBy::new("name", SortDirection::Descending))
        );
    }

    #[test]
    fn rewrite_replaces_only_the_outer_clause() {
        let sql = "SELECT * FROM (SELECT x FROM y ORDER BY z) t ORDER BY a DESC";
        let rewritten = rewrite_order_by(sql, Some(&OrderBy::new("b", SortDirection::Ascending)));
        assert_eq!(
            rewritten,
            "SELECT * FROM (SELECT x FROM y ORDER BY z) t ORDER BY b ASC"
        );
    }

    #[test]
    fn rewrite_then_extract_round_trips() {
        for direction in [
            SortDirection::Unspecified,
            SortDirection::Ascending,
            SortDirection::Descending,
        ] {
            let order = OrderBy::new("created_at", direction);
            let rewritten = rewrite_order_by("SELECT * FROM events", Some(&order));
            assert_eq!(extract_order_by(&rewritten), Some(order));
        }
    }

    #[test]
    fn rewrite_preserves_limit_tail() {
        let sql = "SELECT * FROM t ORDER BY a\nLIMIT 100;";
        assert_eq!(
            rewrite_order_by(sql, Some(&OrderBy::new("b", SortDirection::Descending))),
            "SELECT * FROM t ORDER BY b DESC LIMIT 100"
        );
        assert_eq!(rewrite_order_by(sql, None), "SELECT * FROM t LIMIT 100");

        let oracle = "SELECT * FROM t\nFETCH FIRST 5 ROWS ONLY";
        assert_eq!(
            rewrite_order_by(oracle, Some(&OrderBy::new("a", SortDirection::Ascending))),
            "SELECT * FROM t ORDER BY a ASC FETCH FIRST 5 ROWS ONLY"
        );
    }

    #[test]
    fn rewrite_moves_past_a_trailing_line_comment() {
        let sql = "SELECT * FROM users -- active only";
        let order = OrderBy::new("name", SortDirection::Ascending);
        let rewritten = rewrite_order_by(sql, Some(&order));
        assert_eq!(rewritten, "SELECT * FROM users -- active only\nORDER BY name ASC");
        assert_eq!(extract_order_by(&rewritten), Some(order));

        let limited = apply_row_limit(sql, 50, Dialect::MySql);
        assert_eq!(
            rewrite_order_by(&limited, None),
            "SELECT * FROM users -- active only\nLIMIT 50"
        );
    }

    #[test]
    fn limit_tail_split_handles_mysql_offset_form() {
        assert_eq!(
            split_limit_tail("SELECT * FROM t LIMIT 5, 10"),
            ("SELECT * FROM t", Some("LIMIT 5, 10"))
        );
        assert_eq!(split_limit_tail("SELECT 1"), ("SELECT 1", None));
    }

    #[test]
    fn delete_validation_accepts_guarded_deletes() {
        assert_eq!(
            validate_delete_statement("DELETE FROM t WHERE id = 1"),
            Ok("DELETE FROM t WHERE id = 1".to_string())
        );
        let statement = build_delete_statement("t", "id", "1").expect("statement should build");
        let edited = delete_editor_content(&statement);
        assert_eq!(
            validate_delete_statement(&edited),
            Ok("DELETE FROM t WHERE id = 1".to_string())
        );
    }

    #[test]
    fn delete_synthesis_needs_table_and_key() {
        assert_eq!(
            build_delete_statement(" ", "id", "1"),
            Err(RewriteError::MissingTable)
        );
        assert_eq!(
            build_delete_statement("t", "", "1"),
            Err(RewriteError::MissingPrimaryKey)
        );
        assert_eq!(
            build_delete_statement("users", "email", "'a@b.c'").as_deref(),
            Ok("DELETE FROM users WHERE email = 'a@b.c'")
        );
    }

    #[test]
    fn delete_validation_rejects_unsafe_input() {
        assert_eq!(
            validate_delete_statement("DELETE FROM t"),
            Err(DeleteValidationError::MissingWhere)
        );
        assert_eq!(
            validate_delete_statement("UPDATE t SET x=1 WHERE id=1"),
            Err(DeleteValidationError::NotDelete)
        );
        assert_eq!(
            validate_delete_statement("-- nothing here\n\n   \n--"),
            Err(DeleteValidationError::Empty)
        );
        assert_eq!(
            validate_delete_statement("DELETE FROM t WHERE id = 1; DROP TABLE t"),
            Err(DeleteValidationError::MultipleStatements)
        );
    }

    #[test]
    fn inline_comments_cannot_hide_the_where_clause() {
        assert_eq!(
            validate_delete_statement(
                "-- header\nDELETE FROM users -- remove one row\nWHERE id = 5;\n"
            ),
            Ok("DELETE FROM users WHERE id = 5".to_string())
        );
        assert_eq!(
            validate_delete_statement("DELETE FROM users -- WHERE id = 5\n;"),
            Err(DeleteValidationError::MissingWhere)
        );
        assert_eq!(
            validate_delete_statement("DELETE FROM users /* WHERE id = 5 */"),
            Err(DeleteValidationError::MissingWhere)
        );
        assert_eq!(
            validate_delete_statement("DELETE FROM t WHERE note = '-- not a comment'"),
            Ok("DELETE FROM t WHERE note = '-- not a comment'".to_string())
        );
        assert_eq!(
            validate_update_statement("UPDATE users SET name = 'x' -- new name\nWHERE id = 5"),
            Ok("UPDATE users SET name = 'x' WHERE id = 5".to_string())
        );
        assert_eq!(
            validate_update_statement("UPDATE users SET name = 'x' -- WHERE id = 5"),
            Err(UpdateValidationError::MissingWhere)
        );
    }

    #[test]
    fn semicolons_inside_literals_are_not_statement_breaks() {
        assert_eq!(
            validate_delete_statement("DELETE FROM t WHERE note = 'a;b';"),
            Ok("DELETE FROM t WHERE note = 'a;b'".to_string())
        );
    }

    #[test]
    fn update_round_trip_reads_back_the_new_value() {
        let statement = build_update_statement("users", "name", "'ada'", "id", "7")
            .expect("statement should build");
        let edited = update_editor_content(&statement).replace("'ada'", "'O''Hara'");
        let cleaned = validate_update_statement(&edited).expect("update should validate");
        assert_eq!(cleaned, "UPDATE users SET name = 'O''Hara' WHERE id = 7");
        assert_eq!(assigned_value(&cleaned, "name").as_deref(), Some("O'Hara"));
        assert_eq!(assigned_value(&cleaned, "email"), None);
        assert_eq!(
            assigned_value("UPDATE t SET n = null WHERE id = 1", "n").as_deref(),
            Some("NULL")
        );
        assert_eq!(assigned_value("UPDATE t SET a = 1, b = 2 WHERE id = 1", "a"), None);
    }

    #[test]
    fn update_validation_requires_where() {
        assert_eq!(
            validate_update_statement("UPDATE t SET a = 1"),
            Err(UpdateValidationError::MissingWhere)
        );
        assert_eq!(
            validate_update_statement("DELETE FROM t WHERE id = 1"),
            Err(UpdateValidationError::NotUpdate)
        );
        assert_eq!(
            validate_update_statement("--\n"),
            Err(UpdateValidationError::Empty)
        );
    }

    #[test]
    fn detects_single_table_queries() {
        assert_eq!(detect_table("SELECT * FROM users").as_deref(), Some("users"));
        assert_eq!(
            detect_table("select id, name from app.users u where id > 3").as_deref(),
            Some("app.users")
        );
        assert_eq!(detect_table("SELECT * FROM users;").as_deref(), Some("users"));
        assert_eq!(detect_table("SELECT * FROM a JOIN b ON a.id = b.id"), None);
        assert_eq!(detect_table("SELECT * FROM a, b"), None);
        assert_eq!(detect_table("SELECT * FROM (SELECT 1) x"), None);
    }
}
