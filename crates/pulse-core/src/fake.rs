//! In-memory query sources for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::QueryError;
use crate::source::{Query, QuerySource, Row, Value};

/// Answers queries by name from a fixed table and records every call.
#[derive(Default)]
pub struct ScriptedSource {
    responses: HashMap<&'static str, Result<Vec<Row>, QueryError>>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<Mutex<bool>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, name: &'static str, rows: Vec<Row>) -> Self {
        self.responses.insert(name, Ok(rows));
        self
    }

    pub fn respond_count(self, name: &'static str, count: i64) -> Self {
        self.respond(name, vec![Row::new().with("count", Value::Int(count))])
    }

    pub fn fail(mut self, name: &'static str, msg: &str) -> Self {
        self.responses
            .insert(name, Err(QueryError::Execution(msg.to_string())));
        self
    }
}

impl QuerySource for ScriptedSource {
    fn execute(&mut self, query: &Query) -> Result<Vec<Row>, QueryError> {
        if *self.closed.lock().unwrap() {
            return Err(QueryError::Closed);
        }
        self.calls.lock().unwrap().push(query.name.to_string());
        self.responses
            .get(query.name)
            .cloned()
            .unwrap_or_else(|| Err(QueryError::Execution(format!("no script for {}", query.name))))
    }

    fn close(&mut self) -> Result<(), QueryError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// A source whose connection is gone: every query fails the same way.
#[derive(Default)]
pub struct DeadSource {
    pub attempts: usize,
}

impl QuerySource for DeadSource {
    fn execute(&mut self, _query: &Query) -> Result<Vec<Row>, QueryError> {
        self.attempts += 1;
        Err(QueryError::Execution("server closed the connection unexpectedly".into()))
    }
}

pub fn post_row(title: &str, author: &str, score: i64, views: i64) -> Row {
    Row::new()
        .with("title", Value::Text(title.into()))
        .with("author_name", Value::Text(author.into()))
        .with("score", Value::Int(score))
        .with("view_count", Value::Int(views))
}
