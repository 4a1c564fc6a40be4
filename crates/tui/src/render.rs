use qgrid_core::grid::{GridState, StatusKind};
use qgrid_core::layout::display_width;
use qgrid_core::sql_rewriter::SortDirection;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthChar;

use crate::sql_format::{format_sql, highlight_line};
use crate::theme::{
    type_icon, Theme, COLUMN_SEPARATOR, ELLIPSIS, PRIMARY_KEY_ICON, SORT_ASCENDING_ICON,
    SORT_DESCENDING_ICON, SORT_UNSPECIFIED_ICON,
};

const MAX_QUERY_LINES: usize = 8;
const FOOTER_HEIGHT: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenAreas {
    pub query: Rect,
    pub grid: Rect,
    pub footer: Rect,
}

#[must_use]
pub fn screen_areas(area: Rect, query_lines: usize) -> ScreenAreas {
    let query_height = u16::try_from(query_lines.clamp(1, MAX_QUERY_LINES)).unwrap_or(1) + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(query_height),
            Constraint::Min(3),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);
    ScreenAreas {
        query: chunks[0],
        grid: chunks[1],
        footer: chunks[2],
    }
}

/// Terminal width and the number of data rows the grid pane can show.
#[must_use]
pub fn grid_viewport(area: Rect, grid: &GridState) -> (usize, usize) {
    let lines = format_sql(grid.query().effective()).len();
    let pane = screen_areas(area, lines).grid;
    // Two border lines plus the column header.
    let rows = usize::from(pane.height.saturating_sub(3)).max(1);
    (usize::from(area.width), rows)
}

/// Pads or truncates `text` to exactly `width` display cells, marking cut
/// text with an ellipsis. Control characters render as spaces.
#[must_use]
pub fn fit_cell(text: &str, width: usize) -> String {
    let clean: String = text
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect();
    let current = display_width(&clean);
    if current <= width {
        return format!("{clean}{}", " ".repeat(width - current));
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in clean.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > width - 1 {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push_str(ELLIPSIS);
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Column title with its primary-key, type and sort icons.
#[must_use]
pub fn header_label(
    name: &str,
    declared_type: Option<&str>,
    is_primary_key: bool,
    sort: Option<SortDirection>,
) -> String {
    let mut label = String::new();
    if is_primary_key {
        label.push_str(PRIMARY_KEY_ICON);
        label.push(' ');
    }
    if let Some(declared) = declared_type.filter(|declared| !declared.is_empty()) {
        label.push_str(type_icon(declared));
        label.push(' ');
    }
    label.push_str(name);
    if let Some(direction) = sort {
        label.push(' ');
        label.push_str(match direction {
            SortDirection::Ascending => SORT_ASCENDING_ICON,
            SortDirection::Descending => SORT_DESCENDING_ICON,
            SortDirection::Unspecified => SORT_UNSPECIFIED_ICON,
        });
    }
    label
}

/// `rows×cols`, elapsed time and cursor position.
#[must_use]
pub fn footer_summary(grid: &GridState) -> String {
    let result = grid.result();
    let (row, column) = grid.cursor();
    let position = if result.is_empty() {
        "[0/0]".to_string()
    } else {
        format!("[{}/{}]", row + 1, column + 1)
    };
    format!(
        "{}x{} | In {:.2}s | {position}",
        result.row_count(),
        result.column_count(),
        grid.elapsed().as_secs_f64()
    )
}

fn key_hints(grid: &GridState) -> String {
    let mutations = match (grid.table(), grid.primary_key()) {
        (Some(_), Some(_)) => "u:update d:delete ",
        (Some(_), None) => "u/d: no primary key ",
        (None, _) => "",
    };
    format!("{mutations}v:select y:yank s:sort e:edit ?:help q:quit")
}

pub fn render(frame: &mut Frame<'_>, grid: &GridState, theme: &Theme, show_help: bool) {
    let query_lines = format_sql(grid.query().effective());
    let areas = screen_areas(frame.area(), query_lines.len());

    render_query(frame, areas.query, &query_lines, theme);
    render_grid(frame, areas.grid, grid, theme);
    render_footer(frame, areas.footer, grid, theme);

    if show_help {
        render_help_popup(frame, theme);
    }
}

fn render_query(frame: &mut Frame<'_>, area: Rect, lines: &[String], theme: &Theme) {
    let mut text = lines
        .iter()
        .take(MAX_QUERY_LINES)
        .map(|line| highlight_line(line, theme))
        .collect::<Vec<_>>();
    if lines.len() > MAX_QUERY_LINES {
        if let Some(last) = text.last_mut() {
            last.push_span(Span::styled(format!(" {ELLIPSIS}"), theme.muted));
        }
    }
    let query = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border)
            .title(Span::styled(" query ", theme.title)),
    );
    frame.render_widget(query, area);
}

fn render_grid(frame: &mut Frame<'_>, area: Rect, grid: &GridState, theme: &Theme) {
    let title = grid.table().map_or_else(
        || " results ".to_string(),
        |table| format!(" {table} "),
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(Span::styled(title, theme.title));

    let result = grid.result();
    let mut lines = Vec::new();
    if result.is_empty() {
        lines.push(Line::from(Span::styled("Nothing to show here...", theme.muted)));
    } else {
        lines.push(header_line(grid, theme));
        for row in grid.visible_row_range() {
            lines.push(row_line(grid, theme, row));
        }
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).alignment(Alignment::Left),
        area,
    );
}

fn header_line<'a>(grid: &GridState, theme: &Theme) -> Line<'a> {
    let result = grid.result();
    let widths = grid.column_widths();
    let mut spans = Vec::new();

    for (position, column) in grid.visible_column_range().enumerate() {
        if position > 0 {
            spans.push(Span::styled(COLUMN_SEPARATOR, theme.border));
        }
        let name = &result.columns()[column];
        let declared = result
            .column_types()
            .get(column)
            .and_then(|declared| declared.as_deref());
        let sort = grid
            .sort()
            .is_sorted_by(name)
            .then_some(grid.sort().direction);
        let label = header_label(name, declared, grid.primary_key() == Some(name.as_str()), sort);
        let width = widths.get(column).copied().unwrap_or(0);
        spans.push(Span::styled(fit_cell(&label, width), theme.header));
    }
    Line::from(spans)
}

fn cell_style(grid: &GridState, theme: &Theme, row: usize, column: usize) -> Style {
    if grid.blink().is_some_and(|blink| blink.covers(row, column)) {
        theme.blink
    } else if grid.cursor() == (row, column) {
        theme.cursor
    } else if grid.is_visual() && grid.selection().contains(row, column) {
        theme.selected
    } else {
        theme.cell
    }
}

fn row_line<'a>(grid: &GridState, theme: &Theme, row: usize) -> Line<'a> {
    let result = grid.result();
    let widths = grid.column_widths();
    let mut spans = Vec::new();

    for (position, column) in grid.visible_column_range().enumerate() {
        if position > 0 {
            spans.push(Span::styled(COLUMN_SEPARATOR, theme.border));
        }
        let width = widths.get(column).copied().unwrap_or(0);
        spans.push(Span::styled(
            fit_cell(result.cell(row, column), width),
            cell_style(grid, theme, row, column),
        ));
    }
    Line::from(spans)
}

fn render_footer(frame: &mut Frame<'_>, area: Rect, grid: &GridState, theme: &Theme) {
    let summary = Line::from(vec![
        Span::styled(footer_summary(grid), theme.muted),
        Span::raw("  "),
        Span::styled(key_hints(grid), theme.muted),
    ]);
    let status = match grid.status() {
        Some(message) => {
            let style = match message.kind {
                StatusKind::Info => theme.info,
                StatusKind::Error => theme.error,
            };
            Line::from(Span::styled(message.text.clone(), style))
        }
        None if grid.is_visual() => Line::from(Span::styled("-- VISUAL --", theme.keyword)),
        None => Line::from(""),
    };
    frame.render_widget(Paragraph::new(vec![summary, status]), area);
}

fn render_help_popup(frame: &mut Frame<'_>, theme: &Theme) {
    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);
    let help = Paragraph::new(vec![
        Line::from("Grid keymap"),
        Line::from("hjkl / arrows: move"),
        Line::from("g / G: first / last row"),
        Line::from("0 / $: first / last column"),
        Line::from("Ctrl+u / Ctrl+d: page up / down"),
        Line::from("v: toggle visual selection, Esc: cancel"),
        Line::from("y: copy cell or selection"),
        Line::from("s: cycle sort on column"),
        Line::from("u: update cell, d: delete row"),
        Line::from("e: edit query"),
        Line::from("?: toggle help, q: quit"),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border)
            .title(Span::styled(" help ", theme.title)),
    );
    frame.render_widget(help, area);
}

fn centered_rect(width_percent: u16, height_percent: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100_u16 - height_percent) / 2),
            Constraint::Percentage(height_percent),
            Constraint::Percentage((100_u16 - height_percent) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100_u16 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100_u16 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}
