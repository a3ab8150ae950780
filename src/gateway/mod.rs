//! Query execution gateway
//!
//! Everything between an untrusted SQL string and the query engine:
//! statement validation, connection pooling, result caching and execution.

pub mod cache;
pub mod executor;
pub mod pool;
pub mod validator;

pub use cache::{CacheStats, Fingerprint, QueryCache};
pub use executor::Gateway;
pub use pool::ConnectionPool;
pub use validator::{Rejection, validate};
