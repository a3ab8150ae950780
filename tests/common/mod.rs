//! Common test utilities and helpers
//!
//! An in-memory engine that answers per catalog, so gateway behavior can be
//! exercised without a live database.

#![allow(dead_code)]

use querygate::config::{CatalogTarget, ConnectionConfig, GatewayConfig};
use querygate::db::engine::{Connection, Connector};
use querygate::db::types::{CellValue, ResultPage};
use querygate::error::{DbError, DbResult};
use querygate::gateway::Gateway;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Catalog whose connections always fail
pub const BROKEN_CATALOG: &str = "broken";

/// Catalog whose queries fail after connecting
pub const FAILING_CATALOG: &str = "failing";

/// In-memory engine
///
/// - `information_schema.columns` lookups list `orders(id, order_date)` and
///   `<catalog>_events(id)` for the target catalog
/// - queries mentioning `daily_sales` return a three-day series
/// - queries mentioning `single_day` return one row
/// - anything else returns `n = 1`
#[derive(Default)]
pub struct FakeConnector {
    pub connects: Arc<AtomicUsize>,
    pub queries: Arc<AtomicUsize>,
}

pub struct FakeConnection {
    catalog: String,
    queries: Arc<AtomicUsize>,
}

impl Connector for FakeConnector {
    type Conn = FakeConnection;

    async fn connect(&self, target: &CatalogTarget) -> DbResult<FakeConnection> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if target.catalog == BROKEN_CATALOG {
            return Err(DbError::ConnectionFailed("connection refused".into()));
        }
        Ok(FakeConnection {
            catalog: target.catalog.clone(),
            queries: Arc::clone(&self.queries),
        })
    }
}

impl Connection for FakeConnection {
    async fn fetch_pages(&self, sql: &str) -> DbResult<Vec<ResultPage>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.catalog == FAILING_CATALOG {
            return Err(DbError::QueryFailed("catalog offline".into()));
        }

        if sql.contains("information_schema.columns") {
            let events = format!("{}_events", self.catalog);
            return Ok(vec![
                page(
                    &["table_name", "column_name", "data_type"],
                    vec![
                        vec![text("orders"), text("id"), text("integer")],
                        vec![text("orders"), text("order_date"), text("date")],
                    ],
                ),
                ResultPage {
                    columns: None,
                    rows: vec![vec![text(&events), text("id"), text("bigint")]],
                },
            ]);
        }

        if sql.contains("daily_sales") {
            return Ok(vec![page(
                &["sale_date", "total"],
                vec![
                    vec![text("2025-01-01"), CellValue::Integer(10)],
                    vec![text("2025-01-02"), CellValue::Integer(20)],
                    vec![text("2025-01-03"), CellValue::Integer(30)],
                ],
            )]);
        }

        if sql.contains("single_day") {
            return Ok(vec![page(
                &["sale_date", "total"],
                vec![vec![text("2025-01-01"), CellValue::Integer(10)]],
            )]);
        }

        Ok(vec![page(&["n"], vec![vec![CellValue::Integer(1)]])])
    }
}

pub fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn page(columns: &[&str], rows: Vec<Vec<CellValue>>) -> ResultPage {
    ResultPage {
        columns: Some(columns.iter().map(|c| c.to_string()).collect()),
        rows,
    }
}

/// Gateway config pointing at `targets` (catalog names, schema `public`)
pub fn test_config(targets: &[&str]) -> GatewayConfig {
    let engine = ConnectionConfig::from_url("postgres://tester@localhost/unused").unwrap();
    GatewayConfig::new(
        engine,
        targets
            .iter()
            .map(|catalog| CatalogTarget::new(*catalog, "public"))
            .collect(),
    )
}

/// Gateway over a fresh [`FakeConnector`], returning its counters
pub fn test_gateway(
    config: GatewayConfig,
) -> (Gateway<FakeConnector>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let connector = FakeConnector::default();
    let connects = Arc::clone(&connector.connects);
    let queries = Arc::clone(&connector.queries);
    (Gateway::new(config, connector).unwrap(), connects, queries)
}
