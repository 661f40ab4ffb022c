//! Execute compiled statements against the database.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};

use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::{ExecutionPlan, Row};
use query_engine_translation::translation::{self, CompiledStatement};

use crate::connection::Connection;
use crate::error::Error;
use crate::metrics::Metrics;

/// The output column of a count query.
pub const COUNT_COLUMN: &str = "$count";

/// What a statement returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Rows in the requested shape. Mutations return whatever the database reports.
    pub rows: Vec<Row>,
    /// The total number of rows, when the SELECT asked for it.
    pub count: Option<u64>,
}

/// Run a compiled statement.
pub async fn execute(
    connection: &dyn Connection,
    metrics: &Metrics,
    statement: &CompiledStatement,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<QueryResult, Error> {
    match statement {
        CompiledStatement::Query(plan) => {
            execute_select(connection, metrics, plan, timeout, cancel).await
        }
        CompiledStatement::Mutation(statement) => {
            let rows = execute_mutation(connection, metrics, statement, timeout, cancel).await?;
            Ok(QueryResult { rows, count: None })
        }
    }
}

/// Run a SELECT and its count query, and nest the rows as requested.
pub async fn execute_select(
    connection: &dyn Connection,
    metrics: &Metrics,
    plan: &ExecutionPlan,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<QueryResult, Error> {
    let rows = run(connection, metrics, &plan.query, timeout, cancel)
        .instrument(info_span!("Execute query"))
        .await?;

    let count = match &plan.count_query {
        None => None,
        Some(count_query) => {
            let rows = run(connection, metrics, count_query, timeout, cancel)
                .instrument(info_span!("Execute count query"))
                .await?;
            Some(read_count(&rows)?)
        }
    };

    let rows = async { translation::reshape_rows(rows, &plan.expansions) }
        .instrument(info_span!("Reshape rows"))
        .await;

    Ok(QueryResult { rows, count })
}

/// Run an INSERT, UPDATE, DELETE or MERGE.
pub async fn execute_mutation(
    connection: &dyn Connection,
    metrics: &Metrics,
    statement: &sql::string::SQL,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<Row>, Error> {
    run(connection, metrics, statement, timeout, cancel)
        .instrument(info_span!("Execute mutation"))
        .await
}

/// Run mutations one after the other inside a transaction.
///
/// The first failure, of a statement or of the commit, rolls the transaction back and is
/// returned.
pub async fn execute_in_transaction(
    connection: &dyn Connection,
    metrics: &Metrics,
    statements: &[sql::string::SQL],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<Vec<Row>>, Error> {
    connection.begin().await?;

    let mut results = Vec::with_capacity(statements.len());
    for statement in statements {
        match execute_mutation(connection, metrics, statement, timeout, cancel).await {
            Ok(rows) => results.push(rows),
            Err(err) => return Err(roll_back(connection, err).await),
        }
    }

    match connection.commit().await {
        Ok(()) => Ok(results),
        Err(err) => Err(roll_back(connection, err).await),
    }
}

/// Roll back after a failure, which is handed back. Failing to roll back is only logged.
async fn roll_back(connection: &dyn Connection, err: Error) -> Error {
    if let Err(rollback_err) = connection.rollback().await {
        tracing::error!("rollback failed: {}", rollback_err);
    }
    err
}

/// Pretty print a statement, for logs and explain output.
pub fn explain(statement: &sql::string::SQL) -> String {
    sqlformat::format(
        &statement.sql,
        &sqlformat::QueryParams::None,
        sqlformat::FormatOptions::default(),
    )
}

async fn run(
    connection: &dyn Connection,
    metrics: &Metrics,
    statement: &sql::string::SQL,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<Row>, Error> {
    tracing::info!(
        generated_sql = %explain(statement),
        params = ?&statement.params,
    );

    let params: Vec<serde_json::Value> = statement
        .params
        .iter()
        .map(sql::string::Param::to_json)
        .collect();

    let timer = metrics.query_execution_seconds.start_timer();
    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        result = tokio::time::timeout(timeout, connection.execute(&statement.sql, &params)) => {
            result.unwrap_or(Err(Error::Timeout(timeout)))
        }
    };
    timer.observe_duration();

    match &result {
        Ok(rows) => {
            metrics.query_total.inc();
            tracing::debug!(rows = rows.len());
        }
        Err(err) => {
            metrics.query_errors_total.inc();
            tracing::error!("{}", err);
        }
    }
    result
}

/// Read the total out of the single row of a count query.
fn read_count(rows: &[Row]) -> Result<u64, Error> {
    let value = rows
        .first()
        .and_then(|row| row.get(COUNT_COLUMN).or_else(|| row.values().next()))
        .ok_or_else(|| Error::UnexpectedResult("count query returned no rows".to_string()))?;

    let count = match value {
        serde_json::Value::Number(number) => number.as_u64(),
        // drivers commonly hand back 64 bit integers as text
        serde_json::Value::String(text) => text.parse().ok(),
        _ => None,
    };
    count.ok_or_else(|| Error::UnexpectedResult(format!("count query returned {value}")))
}
