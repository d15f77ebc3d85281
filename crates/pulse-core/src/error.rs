//! Error taxonomy for the dashboard.
//!
//! Startup errors ([`ConfigError`], [`ConnectionError`]) are fatal. Per-tick
//! errors ([`CollectionError`]) are contained in the snapshot and displayed.
//! [`RenderError`] marks a broken contract between a metric and its value.

use std::fmt;

use crate::metric::{MetricId, MetricShape};

/// Missing or invalid configuration. Fatal before the scheduler starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key has no value in any configuration source.
    Missing(&'static str),
    /// A key has a value that cannot be used.
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    /// The refresh interval resolved to zero.
    NonPositiveInterval,
    /// A configuration file could not be parsed.
    Parse(String),
    /// A configuration file could not be read.
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required configuration value: {key}"),
            Self::Invalid { key, value, reason } => {
                write!(f, "invalid value for {key} ({value:?}): {reason}")
            }
            Self::NonPositiveInterval => write!(f, "refresh interval must be a positive duration"),
            Self::Parse(msg) => write!(f, "failed to parse configuration: {msg}"),
            Self::Io(msg) => write!(f, "failed to read configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// The data store could not be reached at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionError {
    /// `user@host:port/database`; never carries the password.
    pub target: String,
    pub reason: String,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to connect to {}: {}", self.target, self.reason)
    }
}

impl std::error::Error for ConnectionError {}

/// A single query failed or returned rows that could not be shaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    Execution(String),
    MissingColumn(String),
    UnexpectedType {
        column: String,
        expected: &'static str,
    },
    NegativeCount {
        column: String,
        value: i64,
    },
    /// A single-row query returned no rows.
    EmptyResult,
    /// The source was already closed.
    Closed,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Execution(msg) => write!(f, "query failed: {msg}"),
            Self::MissingColumn(col) => write!(f, "column {col} missing from result"),
            Self::UnexpectedType { column, expected } => {
                write!(f, "column {column} is not {expected}")
            }
            Self::NegativeCount { column, value } => {
                write!(f, "column {column} holds negative count {value}")
            }
            Self::EmptyResult => write!(f, "query returned no rows"),
            Self::Closed => write!(f, "query source is closed"),
        }
    }
}

impl std::error::Error for QueryError {}

/// One enabled metric failed during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    Query { metric: MetricId, cause: QueryError },
    /// The registry has no evaluator for this metric.
    Unregistered(MetricId),
}

impl CollectionError {
    pub fn metric(&self) -> MetricId {
        match self {
            Self::Query { metric, .. } => *metric,
            Self::Unregistered(metric) => *metric,
        }
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query { metric, cause } => write!(f, "{metric}: {cause}"),
            Self::Unregistered(metric) => write!(f, "{metric}: no evaluator registered"),
        }
    }
}

impl std::error::Error for CollectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Query { cause, .. } => Some(cause),
            Self::Unregistered(_) => None,
        }
    }
}

/// A snapshot entry whose value does not match its metric's declared shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    ShapeMismatch {
        metric: MetricId,
        expected: MetricShape,
        found: MetricShape,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch {
                metric,
                expected,
                found,
            } => write!(
                f,
                "metric {metric} declares a {expected} value but the snapshot holds a {found}"
            ),
        }
    }
}

impl std::error::Error for RenderError {}
