use crate::layout::display_width;
use crate::result_set::ResultSet;

/// A grid cell as `(row, column)`.
pub type Cell = (usize, usize);

/// Inclusive rectangle spanned by an anchor and the cursor. Which corner is
/// the anchor does not change the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub first_row: usize,
    pub last_row: usize,
    pub first_column: usize,
    pub last_column: usize,
}

impl Selection {
    #[must_use]
    pub fn single(cell: Cell) -> Self {
        Self::spanning(cell, cell)
    }

    #[must_use]
    pub fn spanning(anchor: Cell, cursor: Cell) -> Self {
        Self {
            first_row: anchor.0.min(cursor.0),
            last_row: anchor.0.max(cursor.0),
            first_column: anchor.1.min(cursor.1),
            last_column: anchor.1.max(cursor.1),
        }
    }

    #[must_use]
    pub fn contains(&self, row: usize, column: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_column..=self.last_column).contains(&column)
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.last_row - self.first_row + 1
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.last_column - self.first_column + 1
    }

    /// Aligned text block of the selected cells: every column but the last
    /// padded to its widest entry, columns joined by two spaces. The header row is only
    /// emitted when `with_header` is set.
    #[must_use]
    pub fn copy_text(&self, result: &ResultSet, with_header: bool) -> String {
        let columns = self.first_column..=self.last_column;
        let mut lines: Vec<Vec<&str>> = Vec::with_capacity(self.row_count() + 1);

        if with_header {
            lines.push(
                columns
                    .clone()
                    .map(|column| result.columns().get(column).map_or("", String::as_str))
                    .collect(),
            );
        }
        for row in self.first_row..=self.last_row {
            lines.push(
                columns
                    .clone()
                    .map(|column| result.cell(row, column))
                    .collect(),
            );
        }

        let mut widths = vec![0; self.column_count()];
        for line in &lines {
            for (width, cell) in widths.iter_mut().zip(line) {
                *width = (*width).max(display_width(cell));
            }
        }

        lines
            .iter()
            .map(|line| {
                let last = line.len().saturating_sub(1);
                line.iter()
                    .zip(&widths)
                    .enumerate()
                    .map(|(index, (cell, width))| {
                        if index == last {
                            return (*cell).to_string();
                        }
                        let padding = width.saturating_sub(display_width(cell));
                        format!("{cell}{}", " ".repeat(padding))
                    })
                    .collect::<Vec<_>>()
                    .join("  ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
