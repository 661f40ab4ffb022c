//! Provide a SQL AST, a way to convert it to a parameterized SQL string,
//! and helpers for building and describing queries.

pub mod ast;
pub mod convert;
pub mod execution_plan;
pub mod helpers;
pub mod identifier;
pub mod string;
