use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use query_engine_execution::connection::Connection;
use query_engine_execution::error::Error;
use query_engine_execution::metrics::{self, Metrics};
use query_engine_metadata::metadata::Metadata;
use query_engine_sql::sql::execution_plan::Row;

/// Books and their authors.
pub fn bookshop() -> Metadata {
    serde_json::from_value(serde_json::json!({
        "entities": {
            "Books": {
                "tableName": "BOOKS",
                "keys": ["ID"],
                "columns": {
                    "ID": { "name": "ID", "type": "integer", "nullable": "NonNullable" },
                    "title": { "name": "TITLE", "type": "string" },
                    "author_ID": { "name": "AUTHOR_ID", "type": "integer" }
                },
                "associations": {
                    "author": {
                        "target": "Authors",
                        "cardinality": "toOne",
                        "managed": { "foreignKey": "author_ID" }
                    }
                }
            },
            "Authors": {
                "tableName": "AUTHORS",
                "keys": ["ID"],
                "columns": {
                    "ID": { "name": "ID", "type": "integer", "nullable": "NonNullable" },
                    "name": { "name": "NAME", "type": "string" }
                }
            }
        }
    }))
    .unwrap()
}

pub fn metrics() -> Metrics {
    metrics::initialise_metrics(&mut prometheus::Registry::new()).unwrap()
}

pub fn rows(value: serde_json::Value) -> Vec<Row> {
    serde_json::from_value(value).unwrap()
}

/// A connection answering with canned results, in order, and recording what it was asked.
#[derive(Default)]
pub struct MockConnection {
    pub responses: Mutex<VecDeque<Result<Vec<Row>, Error>>>,
    pub executed: Mutex<Vec<(String, Vec<serde_json::Value>)>>,
    pub delay: Option<Duration>,
}

impl MockConnection {
    pub fn answering(responses: Vec<Result<Vec<Row>, Error>>) -> MockConnection {
        MockConnection {
            responses: Mutex::new(responses.into()),
            ..MockConnection::default()
        }
    }

    pub fn executed(&self) -> Vec<(String, Vec<serde_json::Value>)> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&self, sql: &str, params: &[serde_json::Value]) -> Result<Vec<Row>, Error> {
        self.executed
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }
}

/// A connection with transactions, logging every call.
#[derive(Default)]
pub struct TransactionalConnection {
    pub calls: Mutex<Vec<String>>,
    /// Statements containing this text fail.
    pub failing: Option<String>,
    /// Committing fails with a serialization failure.
    pub failing_commit: bool,
}

impl TransactionalConnection {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connection for TransactionalConnection {
    async fn execute(&self, sql: &str, _params: &[serde_json::Value]) -> Result<Vec<Row>, Error> {
        self.calls.lock().unwrap().push(sql.to_string());
        match &self.failing {
            Some(failing) if sql.contains(failing.as_str()) => {
                Err(Error::database(Some("23505"), "duplicate key value"))
            }
            _ => Ok(vec![]),
        }
    }

    async fn begin(&self) -> Result<(), Error> {
        self.calls.lock().unwrap().push("BEGIN".to_string());
        Ok(())
    }

    async fn commit(&self) -> Result<(), Error> {
        self.calls.lock().unwrap().push("COMMIT".to_string());
        if self.failing_commit {
            return Err(Error::database(Some("40001"), "could not serialize access"));
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<(), Error> {
        self.calls.lock().unwrap().push("ROLLBACK".to_string());
        Ok(())
    }
}
