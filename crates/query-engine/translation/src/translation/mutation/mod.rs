//! Translate INSERT, UPDATE, DELETE and MERGE statements.

pub mod delete;
pub mod insert;
pub mod merge;
pub mod update;

use query_engine_sql::sql;

/// Every value of a mutation is bound, `null` included.
fn bind(value: &serde_json::Value) -> sql::ast::Expression {
    sql::ast::Expression::Value(sql::ast::Value::Param(value.clone()))
}
