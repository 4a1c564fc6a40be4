use std::sync::LazyLock;

use regex::Regex;

use crate::result_set::NULL_DISPLAY;

static CANONICAL_NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(?:0|[1-9]\d*)(?:\.\d+)?$").expect("valid canonical number pattern")
});

const NUMERIC_TYPES: [&str; 20] = [
    "tinyint", "smallint", "mediumint", "int", "integer", "bigint", "int2", "int4", "int8",
    "decimal", "numeric", "dec", "float", "float4", "float8", "double", "real", "number",
    "serial", "bigserial",
];

/// SQL variant whose placeholder and pagination syntax the rewriter has to honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
    Oracle,
    #[default]
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSyntax {
    Limit,
    FetchFirst,
    Unsupported,
}

impl Dialect {
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Self::Postgres,
            "mysql" | "mariadb" => Self::MySql,
            "sqlite" | "sqlite3" => Self::Sqlite,
            "oracle" | "godror" => Self::Oracle,
            _ => Self::Generic,
        }
    }

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::Oracle => "oracle",
            Self::Generic => "generic",
        }
    }

    /// Positional placeholder for the 1-based argument `position`.
    #[must_use]
    pub fn placeholder(self, position: usize) -> String {
        match self {
            Self::Postgres => format!("${position}"),
            Self::Oracle => format!(":{position}"),
            Self::MySql | Self::Sqlite | Self::Generic => "?".to_string(),
        }
    }

    #[must_use]
    pub fn limit_syntax(self) -> LimitSyntax {
        match self {
            Self::Postgres | Self::MySql | Self::Sqlite => LimitSyntax::Limit,
            Self::Oracle => LimitSyntax::FetchFirst,
            Self::Generic => LimitSyntax::Unsupported,
        }
    }

    #[must_use]
    pub fn limit_clause(self, limit: usize) -> Option<String> {
        match self.limit_syntax() {
            LimitSyntax::Limit => Some(format!("LIMIT {limit}")),
            LimitSyntax::FetchFirst => Some(format!("FETCH FIRST {limit} ROWS ONLY")),
            LimitSyntax::Unsupported => None,
        }
    }

    /// Renders a grid cell as a SQL literal. The NULL sentinel becomes `NULL`.
    /// Numbers stay bare only in columns declared numeric, or in columns of
    /// unknown type when written in canonical form; everything else is
    /// single-quoted.
    #[must_use]
    pub fn quote_literal(self, value: &str, declared_type: Option<&str>) -> String {
        let trimmed = value.trim();
        if trimmed == NULL_DISPLAY {
            return "NULL".to_string();
        }
        let bare = match declared_type {
            Some(declared) => {
                is_numeric_type(declared) && trimmed.parse::<f64>().is_ok_and(f64::is_finite)
            }
            None => CANONICAL_NUMBER_PATTERN.is_match(trimmed),
        };
        if bare {
            trimmed.to_string()
        } else {
            format!("'{}'", value.replace('\'', "''"))
        }
    }
}

fn is_numeric_type(declared: &str) -> bool {
    let base = declared
        .trim()
        .split(|ch: char| ch == '(' || ch.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    NUMERIC_TYPES.contains(&base.as_str())
}
