//! SQL AST and string representation used by the query engine.

pub mod sql;
