use crate::sql_rewriter::{OrderBy, SortDirection};

/// What the third toggle on the same column does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortCycle {
    /// Result grids: drop both column and direction.
    #[default]
    ClearColumn,
    /// Table listings: keep the column, drop only the direction.
    KeepColumn,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    #[must_use]
    pub fn from_order_by(order: Option<OrderBy>) -> Self {
        match order {
            Some(order) => Self {
                column: Some(order.column),
                direction: order.direction,
            },
            None => Self::default(),
        }
    }

    #[must_use]
    pub fn is_sorted_by(&self, column: &str) -> bool {
        self.column.as_deref() == Some(column)
    }

    #[must_use]
    pub fn order_by(&self) -> Option<OrderBy> {
        self.column
            .as_ref()
            .map(|column| OrderBy::new(column.clone(), self.direction))
    }

    /// Advances the cycle for `column`: another column starts ascending,
    /// the same column goes unspecified → ascending → descending → `cycle`.
    pub fn toggle(&mut self, column: &str, cycle: SortCycle) {
        if !self.is_sorted_by(column) {
            self.column = Some(column.to_string());
            self.direction = SortDirection::Ascending;
            return;
        }

        self.direction = match self.direction {
            SortDirection::Unspecified => SortDirection::Ascending,
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => {
                if cycle == SortCycle::ClearColumn {
                    self.column = None;
                }
                SortDirection::Unspecified
            }
        };
    }
}
