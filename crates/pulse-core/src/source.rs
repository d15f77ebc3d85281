//! The read-query capability the metrics pipeline depends on.
//!
//! Concrete drivers live outside this crate; they only need to turn a
//! [`Query`] into [`Row`]s.

use crate::error::QueryError;

/// A named, parameterless read query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    /// Short name used in logs.
    pub name: &'static str,
    pub sql: &'static str,
}

/// A single column value as returned by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
}

/// One result row: ordered `(column, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column append.
    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    fn require(&self, column: &str) -> Result<&Value, QueryError> {
        self.get(column)
            .ok_or_else(|| QueryError::MissingColumn(column.to_string()))
    }

    pub fn int(&self, column: &str) -> Result<i64, QueryError> {
        match self.require(column)? {
            Value::Int(v) => Ok(*v),
            _ => Err(QueryError::UnexpectedType {
                column: column.to_string(),
                expected: "an integer",
            }),
        }
    }

    /// Integer column that must not be negative (counts, views).
    pub fn count(&self, column: &str) -> Result<u64, QueryError> {
        let value = self.int(column)?;
        u64::try_from(value).map_err(|_| QueryError::NegativeCount {
            column: column.to_string(),
            value,
        })
    }

    pub fn text(&self, column: &str) -> Result<&str, QueryError> {
        match self.require(column)? {
            Value::Text(v) => Ok(v),
            _ => Err(QueryError::UnexpectedType {
                column: column.to_string(),
                expected: "text",
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Executes read queries against a data store.
///
/// A source owns its connection. The scheduler calls [`close`](Self::close)
/// exactly once when it stops; after that every `execute` should fail with
/// [`QueryError::Closed`].
pub trait QuerySource {
    fn execute(&mut self, query: &Query) -> Result<Vec<Row>, QueryError>;

    /// Release the underlying connection.
    ///
    /// The default implementation has nothing to release.
    fn close(&mut self) -> Result<(), QueryError> {
        Ok(())
    }
}

impl<S: QuerySource + ?Sized> QuerySource for Box<S> {
    fn execute(&mut self, query: &Query) -> Result<Vec<Row>, QueryError> {
        (**self).execute(query)
    }

    fn close(&mut self) -> Result<(), QueryError> {
        (**self).close()
    }
}
