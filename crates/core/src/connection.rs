use async_trait::async_trait;
use thiserror::Error;

use crate::dialect::Dialect;
use crate::result_set::ResultSet;

/// Failure reported by the database driver, kept verbatim for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConnectionError {
    message: String,
}

impl ConnectionError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableMetadata {
    pub primary_key: Option<String>,
    pub column_types: Vec<(String, String)>,
}

/// The grid's view of an open database connection. Opening, closing and
/// pinging belong to whoever constructs the implementation.
#[async_trait]
pub trait SqlConnection: Send + Sync {
    async fn execute_query(
        &self,
        statement: &str,
        args: &[String],
    ) -> Result<ResultSet, ConnectionError>;

    async fn execute(&self, statement: &str) -> Result<(), ConnectionError>;

    async fn table_metadata(&self, _table: &str) -> Result<Option<TableMetadata>, ConnectionError> {
        Ok(None)
    }

    fn dialect(&self) -> Dialect;

    fn dialect_tag(&self) -> &'static str {
        self.dialect().tag()
    }

    fn placeholder(&self, position: usize) -> String {
        self.dialect().placeholder(position)
    }
}
