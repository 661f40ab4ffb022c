//! The query tree: an abstract description of a single database operation,
//! handed to the translation engine by the caller.

pub mod expression;
pub mod query;

pub use expression::Token;
pub use query::*;
