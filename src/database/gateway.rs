use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A single result row, keyed by column name
pub type Row = Map<String, Value>;

/// Errors raised by a [`Gateway`]
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Unexpected row format: {0}")]
    UnexpectedRow(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Positional parameter value, bound by the driver
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Null,
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlParam::Null)
    }
}

/// Executes one parameterized statement and returns its rows.
///
/// Statements must produce rows (a SELECT, or a mutation with RETURNING).
/// No retry and no transaction wrapping: each call is a single statement.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>, DatabaseError>;

    /// Round trip used by the health endpoint
    async fn ping(&self) -> Result<(), DatabaseError> {
        self.execute("SELECT 1", &[]).await.map(|_| ())
    }

    /// Release pooled connections. Called once after the server drains.
    async fn close(&self) {}
}
