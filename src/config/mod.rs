//! Configuration management
//!
//! Handles the engine endpoint, catalog targets, gateway settings and the
//! reloadable table access policy.

pub mod access;
pub mod connections;
pub mod settings;

pub use access::{AccessControl, AccessPolicy, AccessSnapshot};
pub use connections::{CatalogTarget, ConnectionConfig, SslMode};
pub use settings::{GatewayConfig, load_config};
