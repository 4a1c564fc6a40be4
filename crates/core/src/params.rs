//! Named `:param` / `:param|default` substitution.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

static PARAMETER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":(\w+)(?:\|('(?:[^'\\]|\\.)*'|[^'\s\\]+))?").expect("valid parameter pattern")
});

/// Names that would collide with the command line's own flags.
pub const RESERVED_NAMES: [&str; 7] = ["edit", "last", "l", "help", "h", "version", "v"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParameterError {
    #[error("missing value for parameter: {name}")]
    Missing { name: String },
    #[error("unknown parameter: {name}")]
    Unknown { name: String },
    #[error("parameter name '{name}' conflicts with reserved flag")]
    Reserved { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDef {
    pub name: String,
    pub default: Option<String>,
}

impl ParameterDef {
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.as_deref().is_none_or(str::is_empty)
    }
}

/// Statement text with placeholders plus the argument list to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substituted {
    pub sql: String,
    pub args: Vec<String>,
}

/// Matches that are real parameters: a `::type` cast or a `12:30` literal is
/// not one.
fn parameter_matches(sql: &str) -> impl Iterator<Item = Captures<'_>> {
    PARAMETER_PATTERN.captures_iter(sql).filter(move |captures| {
        let start = captures.get(0).map_or(0, |whole| whole.start());
        !sql[..start]
            .chars()
            .next_back()
            .is_some_and(|previous| previous == ':' || previous.is_alphanumeric())
    })
}

fn unquote_default(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    else {
        return raw.to_string();
    };

    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                value.push(escaped);
            }
        } else {
            value.push(ch);
        }
    }
    value
}

/// Declared parameters in order of first appearance. The first occurrence
/// that carries a default wins.
#[must_use]
pub fn extract_parameters(sql: &str) -> Vec<ParameterDef> {
    let mut defs: Vec<ParameterDef> = Vec::new();

    for captures in parameter_matches(sql) {
        let name = &captures[1];
        let default = captures.get(2).map(|raw| unquote_default(raw.as_str()));
        match defs.iter_mut().find(|def| def.name == name) {
            Some(existing) => {
                if existing.default.is_none() {
                    existing.default = default;
                }
            }
            None => defs.push(ParameterDef {
                name: name.to_string(),
                default,
            }),
        }
    }

    defs
}

/// Defaults overridden by supplied values; supplied names that are not
/// declared are ignored here and rejected by [`validate_supplied`].
#[must_use]
pub fn resolve_parameters(
    defs: &[ParameterDef],
    supplied: &HashMap<String, String>,
) -> HashMap<String, String> {
    defs.iter()
        .filter_map(|def| {
            supplied
                .get(&def.name)
                .or(def.default.as_ref())
                .map(|value| (def.name.clone(), value.clone()))
        })
        .collect()
}

#[must_use]
pub fn missing_required(defs: &[ParameterDef], values: &HashMap<String, String>) -> Vec<String> {
    defs.iter()
        .filter(|def| def.is_required())
        .filter(|def| values.get(&def.name).is_none_or(String::is_empty))
        .map(|def| def.name.clone())
        .collect()
}

pub fn validate_supplied(
    supplied: &HashMap<String, String>,
    defs: &[ParameterDef],
) -> Result<(), ParameterError> {
    let names: BTreeSet<&String> = supplied.keys().collect();
    match names
        .into_iter()
        .find(|name| !defs.iter().any(|def| &def.name == *name))
    {
        Some(name) => Err(ParameterError::Unknown { name: name.clone() }),
        None => Ok(()),
    }
}

pub fn validate_names(defs: &[ParameterDef]) -> Result<(), ParameterError> {
    match defs
        .iter()
        .find(|def| RESERVED_NAMES.contains(&def.name.as_str()))
    {
        Some(def) => Err(ParameterError::Reserved {
            name: def.name.clone(),
        }),
        None => Ok(()),
    }
}

/// Replaces every parameter with `placeholder(n)`, where `n` is the 1-based
/// order of the name's first appearance. Each distinct name contributes one
/// argument; a name without a value fails the whole substitution.
pub fn substitute_parameters<P>(
    sql: &str,
    values: &HashMap<String, String>,
    placeholder: P,
) -> Result<Substituted, ParameterError>
where
    P: Fn(usize) -> String,
{
    let mut order: Vec<String> = Vec::new();
    let mut args = Vec::new();
    for captures in parameter_matches(sql) {
        let name = &captures[1];
        if order.iter().any(|seen| seen == name) {
            continue;
        }
        let value = values.get(name).ok_or_else(|| ParameterError::Missing {
            name: name.to_string(),
        })?;
        order.push(name.to_string());
        args.push(value.clone());
    }

    if order.is_empty() {
        return Ok(Substituted {
            sql: sql.to_string(),
            args,
        });
    }

    let mut rewritten = String::with_capacity(sql.len());
    let mut cursor = 0;
    for captures in parameter_matches(sql) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        let Some(position) = order.iter().position(|seen| seen == &captures[1]) else {
            continue;
        };
        rewritten.push_str(&sql[cursor..whole.start()]);
        rewritten.push_str(&placeholder(position + 1));
        cursor = whole.end();
    }
    rewritten.push_str(&sql[cursor..]);

    Ok(Substituted {
        sql: rewritten,
        args,
    })
}
