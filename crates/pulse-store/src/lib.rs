//! PostgreSQL-backed [`QuerySource`] for the pulse dashboard.
//!
//! One blocking connection is opened at startup and kept for the whole
//! session. The session time zone is set right after connecting so that
//! date boundaries in the metric queries follow the configured zone.

use std::time::Duration;

use postgres::types::Type;
use postgres::{Client, NoTls};
use pulse_core::config::ConnectionParams;
use pulse_core::error::{ConnectionError, QueryError};
use pulse_core::source::{Query, QuerySource, Row, Value};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const APPLICATION_NAME: &str = "pulse-dashboard";

/// How a column type maps onto [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int8,
    Int4,
    Int2,
    Text,
}

fn column_kind(ty: &Type) -> Option<ColumnKind> {
    if *ty == Type::INT8 {
        Some(ColumnKind::Int8)
    } else if *ty == Type::INT4 {
        Some(ColumnKind::Int4)
    } else if *ty == Type::INT2 {
        Some(ColumnKind::Int2)
    } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(ty) {
        Some(ColumnKind::Text)
    } else {
        None
    }
}

/// Statement run once per session to pin the time zone.
///
/// The zone name is validated by `Config`, so it carries no quotes.
fn time_zone_statement(time_zone: &str) -> String {
    format!("SET TIME ZONE '{time_zone}'")
}

pub struct PostgresSource {
    client: Option<Client>,
    target: String,
}

impl std::fmt::Debug for PostgresSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSource")
            .field("target", &self.target)
            .field("open", &self.client.is_some())
            .finish()
    }
}

impl PostgresSource {
    /// Open the connection and set the session time zone.
    pub fn connect(params: &ConnectionParams, time_zone: &str) -> Result<Self, ConnectionError> {
        let target = params.target();
        let fail = |reason: String| ConnectionError {
            target: target.clone(),
            reason,
        };

        let mut client = postgres::Config::new()
            .host(&params.host)
            .port(params.port)
            .dbname(&params.database)
            .user(&params.user)
            .password(&params.password)
            .application_name(APPLICATION_NAME)
            .connect_timeout(CONNECT_TIMEOUT)
            .connect(NoTls)
            .map_err(|e| fail(e.to_string()))?;

        client
            .batch_execute(&time_zone_statement(time_zone))
            .map_err(|e| fail(format!("cannot set time zone {time_zone}: {e}")))?;

        tracing::info!(db = %target, time_zone, "connected to database");
        Ok(Self {
            client: Some(client),
            target,
        })
    }
}

fn convert_row(row: &postgres::Row) -> Result<Row, QueryError> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let kind = column_kind(column.type_()).ok_or_else(|| QueryError::UnexpectedType {
            column: name.to_string(),
            expected: "an integer or text column",
        })?;
        let read_err = |e: postgres::Error| QueryError::Execution(format!("column {name}: {e}"));

        let value = match kind {
            ColumnKind::Int8 => row.try_get::<_, Option<i64>>(idx).map_err(read_err)?.map(Value::Int),
            ColumnKind::Int4 => row
                .try_get::<_, Option<i32>>(idx)
                .map_err(read_err)?
                .map(|v| Value::Int(v.into())),
            ColumnKind::Int2 => row
                .try_get::<_, Option<i16>>(idx)
                .map_err(read_err)?
                .map(|v| Value::Int(v.into())),
            ColumnKind::Text => row.try_get::<_, Option<String>>(idx).map_err(read_err)?.map(Value::Text),
        };
        out.push(name, value.unwrap_or(Value::Null));
    }
    Ok(out)
}

impl QuerySource for PostgresSource {
    fn execute(&mut self, query: &Query) -> Result<Vec<Row>, QueryError> {
        let client = self.client.as_mut().ok_or(QueryError::Closed)?;
        let rows = client
            .query(query.sql, &[])
            .map_err(|e| QueryError::Execution(e.to_string()))?;
        tracing::trace!(query = query.name, rows = rows.len(), "query executed");
        rows.iter().map(convert_row).collect()
    }

    fn close(&mut self) -> Result<(), QueryError> {
        match self.client.take() {
            Some(client) => {
                client
                    .close()
                    .map_err(|e| QueryError::Execution(e.to_string()))?;
                tracing::info!(db = %self.target, "database connection closed");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_and_text_types_are_supported() {
        assert_eq!(column_kind(&Type::INT8), Some(ColumnKind::Int8));
        assert_eq!(column_kind(&Type::INT4), Some(ColumnKind::Int4));
        assert_eq!(column_kind(&Type::INT2), Some(ColumnKind::Int2));
        assert_eq!(column_kind(&Type::VARCHAR), Some(ColumnKind::Text));
        assert_eq!(column_kind(&Type::TEXT), Some(ColumnKind::Text));
    }

    #[test]
    fn other_types_are_rejected() {
        assert_eq!(column_kind(&Type::FLOAT8), None);
        assert_eq!(column_kind(&Type::TIMESTAMPTZ), None);
        assert_eq!(column_kind(&Type::NUMERIC), None);
    }

    #[test]
    fn time_zone_statement_quotes_zone() {
        assert_eq!(
            time_zone_statement("America/New_York"),
            "SET TIME ZONE 'America/New_York'"
        );
    }

    #[test]
    fn unreachable_host_is_a_connection_error() {
        let params = ConnectionParams {
            host: "127.0.0.1".into(),
            port: 1,
            database: "campus".into(),
            user: "ro".into(),
            password: "never-shown".into(),
        };
        let err = PostgresSource::connect(&params, "UTC").unwrap_err();
        assert_eq!(err.target, "ro@127.0.0.1:1/campus");
        assert!(!err.to_string().contains("never-shown"));
    }
}
