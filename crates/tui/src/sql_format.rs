//! Query header formatting: one clause per line, keywords highlighted.

use std::sync::LazyLock;

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use regex::Regex;

use crate::theme::Theme;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)'(?:[^']|'')*'?|"[^"]*"?|--[^\n]*|/\*.*?(?:\*/|$)|[A-Za-z_][A-Za-z0-9_$]*|\s+|."#,
    )
    .expect("valid SQL token pattern")
});

const CLAUSE_KEYWORDS: [&str; 20] = [
    "SELECT", "FROM", "WHERE", "JOIN", "LEFT", "RIGHT", "INNER", "FULL", "CROSS", "ORDER",
    "GROUP", "HAVING", "LIMIT", "OFFSET", "FETCH", "UNION", "SET", "VALUES", "RETURNING", "WITH",
];

const JOIN_MODIFIERS: [&str; 6] = ["LEFT", "RIGHT", "INNER", "FULL", "CROSS", "OUTER"];

const HIGHLIGHT_KEYWORDS: [&str; 26] = [
    "AND", "OR", "ON", "AS", "IN", "NOT", "NULL", "IS", "LIKE", "BETWEEN", "EXISTS", "CASE",
    "WHEN", "THEN", "ELSE", "END", "DISTINCT", "ALL", "BY", "ASC", "DESC", "OUTER", "INSERT",
    "INTO", "UPDATE", "DELETE",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Literal,
    Comment,
    Space,
    Symbol,
}

fn classify(token: &str) -> TokenKind {
    if token.starts_with("--") || token.starts_with("/*") {
        TokenKind::Comment
    } else if token.starts_with('\'') || token.starts_with('"') {
        TokenKind::Literal
    } else if token.chars().all(char::is_whitespace) {
        TokenKind::Space
    } else if token
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
    {
        TokenKind::Word
    } else {
        TokenKind::Symbol
    }
}

fn is_keyword(word: &str) -> bool {
    let upper = word.to_ascii_uppercase();
    CLAUSE_KEYWORDS.contains(&upper.as_str()) || HIGHLIGHT_KEYWORDS.contains(&upper.as_str())
}

/// Splits `sql` into display lines. Top-level clauses start a new line and
/// top-level `AND`/`OR` start an indented one; subqueries stay inline.
#[must_use]
pub fn format_sql(sql: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut previous_word = String::new();
    let mut inside_between = false;

    let mut break_line = |current: &mut String, indent: &str| {
        let finished = current.trim_end().to_string();
        if !finished.is_empty() {
            lines.push(finished);
        }
        current.clear();
        current.push_str(indent);
    };

    for token in TOKEN_RE.find_iter(sql.trim()).map(|found| found.as_str()) {
        match classify(token) {
            TokenKind::Space => {
                if !current.trim().is_empty() && !current.ends_with(' ') {
                    current.push(' ');
                }
            }
            TokenKind::Comment => {
                if token.starts_with("--") {
                    break_line(&mut current, "");
                    current.push_str(token);
                    break_line(&mut current, "");
                } else {
                    current.push_str(token);
                }
            }
            TokenKind::Word => {
                let upper = token.to_ascii_uppercase();
                if depth == 0 {
                    let continues_join = upper == "JOIN" || upper == "OUTER";
                    let after_modifier = JOIN_MODIFIERS.contains(&previous_word.as_str());
                    let starts_clause = CLAUSE_KEYWORDS.contains(&upper.as_str());
                    if starts_clause && !(continues_join && after_modifier) {
                        break_line(&mut current, "");
                    } else if upper == "AND" && inside_between {
                        inside_between = false;
                    } else if upper == "AND" || upper == "OR" {
                        break_line(&mut current, "  ");
                    }
                    if upper == "BETWEEN" {
                        inside_between = true;
                    }
                }
                current.push_str(token);
                previous_word = upper;
            }
            TokenKind::Literal => current.push_str(token),
            TokenKind::Symbol => {
                match token {
                    "(" => depth += 1,
                    ")" => depth = depth.saturating_sub(1),
                    _ => {}
                }
                current.push_str(token);
            }
        }
    }
    break_line(&mut current, "");
    lines
}

/// One formatted line with keywords, literals and comments styled.
#[must_use]
pub fn highlight_line<'a>(line: &'a str, theme: &Theme) -> Line<'a> {
    let spans = TOKEN_RE
        .find_iter(line)
        .map(|found| {
            let token = found.as_str();
            let style = match classify(token) {
                TokenKind::Word if is_keyword(token) => theme.keyword,
                TokenKind::Comment => theme.comment,
                TokenKind::Literal => theme.info,
                _ => Style::default(),
            };
            Span::styled(token, style)
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::format_sql;

    #[test]
    fn clauses_start_new_lines() {
        assert_eq!(
            format_sql("select id, name from users where id > 3 order by name desc limit 100"),
            [
                "select id, name",
                "from users",
                "where id > 3",
                "order by name desc",
                "limit 100",
            ]
        );
    }

    #[test]
    fn joins_and_conditions_are_grouped() {
        assert_eq!(
            format_sql(
                "SELECT u.id FROM users u LEFT OUTER JOIN orders o ON o.user_id = u.id \
                 WHERE u.age BETWEEN 18 AND 30 AND o.total > 10 OR u.vip"
            ),
            [
                "SELECT u.id",
                "FROM users u",
                "LEFT OUTER JOIN orders o ON o.user_id = u.id",
                "WHERE u.age BETWEEN 18 AND 30",
                "  AND o.total > 10",
                "  OR u.vip",
            ]
        );
    }

    #[test]
    fn subqueries_literals_and_comments_are_preserved() {
        assert_eq!(
            format_sql(
                "-- recent\nSELECT * FROM t WHERE id IN (SELECT id FROM s WHERE x = 'from where')"
            ),
            [
                "-- recent",
                "SELECT *",
                "FROM t",
                "WHERE id IN (SELECT id FROM s WHERE x = 'from where')",
            ]
        );
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(
            format_sql("  SELECT\n\t1\n\n  FROM   dual  "),
            ["SELECT 1", "FROM dual"]
        );
        assert!(format_sql("   ").is_empty());
    }
}
