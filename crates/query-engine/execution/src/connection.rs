//! The database a compiled statement runs against.

use async_trait::async_trait;
use query_engine_sql::sql::execution_plan::Row;

use crate::error::Error;

/// A connection to the backing database.
///
/// Implementations bind `params` positionally to the placeholders of `sql`.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run a statement and return its rows, keyed by column name in select list order.
    async fn execute(&self, sql: &str, params: &[serde_json::Value]) -> Result<Vec<Row>, Error>;

    /// Start a transaction. Connections without transactions ignore this.
    async fn begin(&self) -> Result<(), Error> {
        tracing::warn!("transactions are not supported by this connection, ignoring begin");
        Ok(())
    }

    async fn commit(&self) -> Result<(), Error> {
        tracing::warn!("transactions are not supported by this connection, ignoring commit");
        Ok(())
    }

    async fn rollback(&self) -> Result<(), Error> {
        tracing::warn!("transactions are not supported by this connection, ignoring rollback");
        Ok(())
    }
}
