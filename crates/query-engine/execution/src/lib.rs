//! Run compiled statements against a database connection.
//!
//! The connection itself is supplied by the caller through the [`connection::Connection`]
//! trait; this crate adds timeouts, cancellation, error classification, metrics and the
//! reshaping of flat rows into the requested nesting.

pub mod connection;
pub mod error;
pub mod metrics;
pub mod query;
pub mod settings;
