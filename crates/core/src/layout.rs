//! Column width fitting for the result grid.
//!
//! Widths are an estimate: only the first `sample_rows` rows are measured.
//! Nothing here looks at cursor or selection state, so the same inputs always
//! produce the same layout.

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

use crate::result_set::QueryRow;

/// Display cells reserved in a header for one icon plus its spacer.
pub const ICON_SLOT_WIDTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub min_width: usize,
    pub max_width: usize,
    pub border_width: usize,
    pub sample_rows: usize,
    /// Columns of the terminal kept free around the grid.
    pub margin: usize,
    pub min_available_width: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_width: 8,
            max_width: 50,
            border_width: 1,
            sample_rows: 100,
            margin: 4,
            min_available_width: 20,
        }
    }
}

impl LayoutConfig {
    #[must_use]
    pub fn available_width(&self, terminal_width: usize) -> usize {
        terminal_width
            .saturating_sub(self.margin)
            .max(self.min_available_width)
    }

    fn clamp(&self, width: usize) -> usize {
        width.clamp(self.min_width, self.max_width.max(self.min_width))
    }

    fn borders(&self, column_count: usize) -> usize {
        column_count.saturating_sub(1) * self.border_width
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutInput<'a> {
    pub columns: &'a [String],
    pub column_types: &'a [Option<String>],
    pub primary_key: Option<&'a str>,
    pub sort_column: Option<&'a str>,
    pub rows: &'a [QueryRow],
    pub available_width: usize,
}

#[must_use]
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Header width including the primary-key, type and sort icon slots.
#[must_use]
pub fn header_width(name: &str, has_type: bool, is_primary_key: bool, is_sorted: bool) -> usize {
    let icons = [has_type, is_primary_key, is_sorted]
        .into_iter()
        .filter(|reserved| *reserved)
        .count();
    display_width(name) + icons * ICON_SLOT_WIDTH
}

/// Step 1: per-column `max(header, widest sampled cell)`, clamped.
#[must_use]
pub fn candidate_widths(input: &LayoutInput<'_>, config: &LayoutConfig) -> Vec<usize> {
    let sample = &input.rows[..input.rows.len().min(config.sample_rows)];

    input
        .columns
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let has_type = input
                .column_types
                .get(index)
                .is_some_and(|data_type| data_type.as_deref().is_some_and(|t| !t.is_empty()));
            let header = header_width(
                name,
                has_type,
                input.primary_key == Some(name.as_str()),
                input.sort_column == Some(name.as_str()),
            );
            let content = sample
                .iter()
                .filter_map(|row| row.get(index))
                .map(display_width)
                .max()
                .unwrap_or(0);
            config.clamp(header.max(content))
        })
        .collect()
}

/// Shrinks the currently widest column one cell at a time until the total
/// (plus borders) fits `available`, or every column sits at `min_width`.
pub fn shrink_widest(widths: &mut [usize], available: usize, config: &LayoutConfig) {
    let borders = config.borders(widths.len());
    let mut total: usize = widths.iter().sum::<usize>() + borders;

    while total > available {
        let Some((widest, width)) = widths
            .iter()
            .copied()
            .enumerate()
            .max_by(|(left_index, left), (right_index, right)| {
                left.cmp(right).then(right_index.cmp(left_index))
            })
        else {
            return;
        };
        if width <= config.min_width {
            return;
        }
        widths[widest] -= 1;
        total -= 1;
    }
}

/// Spreads `surplus` evenly; the first `surplus % len` columns get one more.
pub fn distribute_surplus(widths: &mut [usize], surplus: usize, config: &LayoutConfig) {
    if widths.is_empty() {
        return;
    }
    let per_column = surplus / widths.len();
    let remainder = surplus % widths.len();
    for (index, width) in widths.iter_mut().enumerate() {
        let extra = per_column + usize::from(index < remainder);
        *width = (*width + extra).min(config.max_width.max(*width));
    }
}

/// Steps 2 and 3: scale down or widen candidates to the available width.
#[must_use]
pub fn fit_widths(mut widths: Vec<usize>, available: usize, config: &LayoutConfig) -> Vec<usize> {
    if widths.is_empty() {
        return widths;
    }

    let borders = config.borders(widths.len());
    let content: usize = widths.iter().sum();
    let needed = content + borders;

    if needed > available {
        #[allow(clippy::cast_precision_loss)]
        let scale = available.saturating_sub(borders) as f64 / content as f64;
        for width in &mut widths {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_precision_loss
            )]
            let scaled = (*width as f64 * scale).floor() as usize;
            *width = scaled.max(config.min_width);
        }
        shrink_widest(&mut widths, available, config);
    } else if needed < available {
        distribute_surplus(&mut widths, available - needed, config);
    }

    widths
}

#[must_use]
pub fn column_widths(input: &LayoutInput<'_>, config: &LayoutConfig) -> Vec<usize> {
    fit_widths(candidate_widths(input, config), input.available_width, config)
}

/// Step 4: how many consecutive columns starting at `offset` fit. At least
/// one whenever a column exists at `offset`.
#[must_use]
pub fn visible_columns(
    widths: &[usize],
    offset: usize,
    available: usize,
    config: &LayoutConfig,
) -> usize {
    let mut used = 0;
    let mut count = 0;

    for (position, width) in widths.iter().skip(offset).enumerate() {
        let border = if position == 0 { 0 } else { config.border_width };
        if used + width + border > available {
            break;
        }
        used += width + border;
        count += 1;
    }

    if count == 0 && offset < widths.len() {
        1
    } else {
        count
    }
}
