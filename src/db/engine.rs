//! Query engine traits
//!
//! Defines the interface that query engine backends must implement.
//! This abstraction allows for:
//! - Swapping the engine behind the gateway
//! - Easy testing with in-memory implementations
//! - Consistent error handling

use crate::config::CatalogTarget;
use crate::db::types::ResultPage;
use crate::error::DbResult;
use std::future::Future;

/// Factory for engine connections
///
/// A connector carries the process-wide endpoint and credentials; each call to
/// [`Connector::connect`] binds a new handle to one catalog/schema target.
pub trait Connector: Send + Sync + 'static {
    /// Connection handle type produced by this connector
    type Conn: Connection;

    /// Open a handle bound to `target`
    ///
    /// # Errors
    /// Returns `DbError::ConnectionFailed` if the engine cannot be reached
    fn connect(&self, target: &CatalogTarget)
    -> impl Future<Output = DbResult<Self::Conn>> + Send;
}

/// A handle to the query engine scoped to one catalog/schema
pub trait Connection: Send + Sync + 'static {
    /// Execute a SQL statement and return every result page in arrival order
    ///
    /// # Errors
    /// Returns `DbError::QueryFailed` if the engine rejects or fails the query
    fn fetch_pages(&self, sql: &str) -> impl Future<Output = DbResult<Vec<ResultPage>>> + Send;
}
