use std::sync::LazyLock;

use regex::Regex;

static SET_VALUE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)SET\s+\w+\s*=\s*'").expect("valid SET value pattern"));
static WHERE_VALUE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)WHERE\s+\w+\s*=\s*'").expect("valid WHERE value pattern"));

/// Where the external editor should place its cursor. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    /// Just inside the quoted value of `SET col = '...'`.
    SetValue,
    /// Just inside the quoted value of `WHERE col = '...'`.
    WhereValue,
    EndOfFile,
}

/// 1-based `(line, column)` for `hint` within `content`.
#[must_use]
pub fn cursor_position(content: &str, hint: CursorHint) -> (usize, usize) {
    let pattern = match hint {
        CursorHint::SetValue => Some(&*SET_VALUE_PATTERN),
        CursorHint::WhereValue => Some(&*WHERE_VALUE_PATTERN),
        CursorHint::EndOfFile => None,
    };

    pattern
        .and_then(|pattern| {
            content.lines().enumerate().find_map(|(index, line)| {
                pattern
                    .find(line)
                    .map(|found| (index + 1, line[..found.end()].chars().count() + 1))
            })
        })
        .unwrap_or_else(|| end_of_file(content))
}

/// Just past the last non-empty line.
fn end_of_file(content: &str) -> (usize, usize) {
    let lines: Vec<&str> = content.lines().collect();
    lines
        .iter()
        .enumerate()
        .rev()
        .find(|(_, line)| !line.trim().is_empty())
        .map_or((lines.len().max(1), 1), |(index, line)| {
            (index + 1, line.chars().count() + 1)
        })
}
