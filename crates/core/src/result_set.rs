/// How a SQL NULL is rendered in a grid cell. Distinct from the empty string.
pub const NULL_DISPLAY: &str = "NULL";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryRow {
    pub values: Vec<String>,
}

impl QueryRow {
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn get(&self, column: usize) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for QueryRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Columns and rows returned by one query execution.
///
/// Rows are immutable apart from [`ResultSet::remove_row`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSet {
    columns: Vec<String>,
    column_types: Vec<Option<String>>,
    rows: Vec<QueryRow>,
}

impl ResultSet {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<QueryRow>) -> Self {
        let column_types = vec![None; columns.len()];
        Self {
            columns,
            column_types,
            rows,
        }
    }

    /// Attaches declared types by column name; unmatched columns stay unknown.
    #[must_use]
    pub fn with_column_types(mut self, declared: &[(String, String)]) -> Self {
        self.column_types = self
            .columns
            .iter()
            .map(|column| {
                declared
                    .iter()
                    .find(|(name, _)| name == column)
                    .map(|(_, data_type)| data_type.clone())
            })
            .collect();
        self
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn column_types(&self) -> &[Option<String>] {
        &self.column_types
    }

    #[must_use]
    pub fn rows(&self) -> &[QueryRow] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Cell text, or the empty string for ragged rows.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|values| values.get(column))
            .unwrap_or("")
    }

    /// Returns `false` when the cell does not exist.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) -> bool {
        match self
            .rows
            .get_mut(row)
            .and_then(|values| values.values.get_mut(column))
        {
            Some(cell) => {
                *cell = value.into();
                true
            }
            None => false,
        }
    }

    /// Removes exactly one row; later rows shift up by one.
    pub fn remove_row(&mut self, row: usize) -> Option<QueryRow> {
        (row < self.rows.len()).then(|| self.rows.remove(row))
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryRow, ResultSet};

    fn sample() -> ResultSet {
        ResultSet::new(
            vec!["id".to_string(), "name".to_string()],
            vec![
                QueryRow::from_iter(["1", "ada"]),
                QueryRow::from_iter(["2", "grace"]),
                QueryRow::from_iter(["3"]),
            ],
        )
    }

    #[test]
    fn remove_row_shifts_following_rows() {
        let mut result = sample();
        let removed = result.remove_row(0).expect("row 0 should exist");
        assert_eq!(removed.get(1), Some("ada"));
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.cell(0, 1), "grace");
        assert!(result.remove_row(7).is_none());
    }

    #[test]
    fn ragged_rows_read_as_empty_cells() {
        let result = sample();
        assert_eq!(result.cell(2, 1), "");
        assert_eq!(result.cell(9, 0), "");
    }

    #[test]
    fn column_types_attach_by_name() {
        let result = sample().with_column_types(&[("name".to_string(), "varchar(20)".to_string())]);
        assert_eq!(result.column_types()[0], None);
        assert_eq!(result.column_types()[1].as_deref(), Some("varchar(20)"));
        assert_eq!(result.column_index("name"), Some(1));
    }
}
