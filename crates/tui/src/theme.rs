use qgrid_core::settings::ColorScheme;
use ratatui::style::{Color, Modifier, Style};

pub const PRIMARY_KEY_ICON: &str = "⚿";
pub const SORT_ASCENDING_ICON: &str = "↑";
pub const SORT_DESCENDING_ICON: &str = "↓";
pub const SORT_UNSPECIFIED_ICON: &str = "↕";
pub const ELLIPSIS: &str = "…";
pub const COLUMN_SEPARATOR: &str = "│";

/// Styles resolved once from the configured color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub title: Style,
    pub header: Style,
    pub cell: Style,
    pub cursor: Style,
    pub selected: Style,
    pub blink: Style,
    pub border: Style,
    pub keyword: Style,
    pub comment: Style,
    pub muted: Style,
    pub info: Style,
    pub error: Style,
}

impl Theme {
    #[must_use]
    pub fn from_scheme(scheme: ColorScheme) -> Self {
        let indexed = Color::Indexed;
        Self {
            title: Style::default()
                .fg(indexed(scheme.primary))
                .add_modifier(Modifier::BOLD),
            header: Style::default()
                .fg(indexed(scheme.primary))
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            cell: Style::default().fg(indexed(scheme.normal)),
            cursor: Style::default()
                .fg(indexed(scheme.normal))
                .bg(indexed(scheme.highlight))
                .add_modifier(Modifier::BOLD),
            selected: Style::default()
                .fg(indexed(scheme.normal))
                .bg(indexed(scheme.highlight)),
            blink: Style::default()
                .fg(Color::Black)
                .bg(indexed(scheme.success))
                .add_modifier(Modifier::BOLD),
            border: Style::default().fg(indexed(scheme.muted)),
            keyword: Style::default()
                .fg(indexed(scheme.accent))
                .add_modifier(Modifier::BOLD),
            comment: Style::default()
                .fg(indexed(scheme.muted))
                .add_modifier(Modifier::ITALIC),
            muted: Style::default().fg(indexed(scheme.muted)),
            info: Style::default().fg(indexed(scheme.success)),
            error: Style::default()
                .fg(indexed(scheme.error))
                .add_modifier(Modifier::BOLD),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_scheme(ColorScheme::DEFAULT)
    }
}

/// One display cell wide so it fits the header's icon slot.
#[must_use]
pub fn type_icon(declared: &str) -> &'static str {
    let upper = declared.to_ascii_uppercase();
    let has = |needles: &[&str]| needles.iter().any(|needle| upper.contains(needle));

    if has(&["GEOMETRY", "POINT", "POLYGON", "LINESTRING"]) {
        "◉"
    } else if has(&["CHAR", "TEXT", "STRING", "CLOB"]) {
        "α"
    } else if has(&["INT", "SERIAL"]) {
        "№"
    } else if has(&["DECIMAL", "NUMERIC", "FLOAT", "DOUBLE", "REAL", "NUMBER", "MONEY"]) {
        "≈"
    } else if upper.contains("DATE") && !upper.contains("TIME") {
        "⊞"
    } else if upper.contains("TIME") {
        "◷"
    } else if has(&["BOOL", "BIT"]) {
        "✓"
    } else if has(&["BLOB", "BINARY", "BYTEA", "RAW", "IMAGE"]) {
        "◆"
    } else if upper.contains("JSON") {
        "{"
    } else if has(&["UUID", "GUID"]) {
        "◈"
    } else if upper.contains("ARRAY") || upper.ends_with("[]") {
        "≡"
    } else if has(&["ENUM", "SET"]) {
        "⋮"
    } else if upper.contains("XML") {
        "⟨"
    } else {
        "•"
    }
}
