//! Query engine abstraction layer
//!
//! This module provides a trait-based abstraction over the query engine,
//! allowing the gateway to be driven by PostgreSQL in production and by
//! in-memory engines in tests.

pub mod engine;
pub mod postgres;
pub mod schema;
pub mod types;

// Re-export main types
pub use engine::{Connection, Connector};
pub use schema::{ColumnInfo, TableInfo};
pub use types::{CellValue, QueryOutcome, ResultPage, ResultSet};
