//! Query execution gateway
//!
//! Orchestrates validation, the result cache, the connection pool and the
//! engine call, and fans table discovery out across every configured target.

use crate::config::{AccessControl, AccessPolicy, CatalogTarget, GatewayConfig};
use crate::db::engine::{Connection, Connector};
use crate::db::schema::{TableInfo, tables_from_columns};
use crate::db::types::{QueryOutcome, ResultSet};
use crate::error::{ConfigError, DbError, GatewayResult};
use crate::gateway::cache::{CacheStats, QueryCache};
use crate::gateway::pool::ConnectionPool;
use crate::gateway::validator;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// The read-only execution gateway
///
/// Owns the cache and the pool; construct one per process and share it
/// behind an `Arc`.
pub struct Gateway<C: Connector> {
    config: GatewayConfig,
    pool: ConnectionPool<C>,
    cache: QueryCache,
    access: AccessControl,
    schema_cache: RwLock<SchemaCache>,
}

/// Discovered tables, unfiltered
#[derive(Default)]
struct SchemaCache {
    /// Bumped by every refresh; a discovery started under an older
    /// generation does not store its result
    generation: u64,
    /// `None` until first discovery
    tables: Option<Arc<Vec<TableInfo>>>,
}

impl<C: Connector> Gateway<C> {
    /// Build a gateway over `connector`
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if the configuration has no targets
    pub fn new(config: GatewayConfig, connector: C) -> GatewayResult<Self> {
        config.validate()?;
        let pool = ConnectionPool::new(connector, config.pool.max_connections);
        let cache = QueryCache::new(config.cache.max_entries, config.cache.ttl());
        tracing::info!(
            targets = config.targets.len(),
            cache_entries = config.cache.max_entries,
            pool_size = config.pool.max_connections,
            "Gateway initialized"
        );
        Ok(Self {
            config,
            pool,
            cache,
            access: AccessControl::default(),
            schema_cache: RwLock::new(SchemaCache::default()),
        })
    }

    /// Replace the initial access policy
    pub fn with_access_policy(self, policy: AccessPolicy) -> Self {
        self.access.replace(policy);
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn pool(&self) -> &ConnectionPool<C> {
        &self.pool
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    fn default_target(&self) -> GatewayResult<&CatalogTarget> {
        self.config
            .default_target()
            .ok_or_else(|| ConfigError::Invalid("no catalog targets configured".into()).into())
    }

    /// Execute `sql` against the default target
    ///
    /// # Errors
    /// `GatewayError::RejectedStatement` if the statement is not read-only,
    /// `GatewayError::Engine` if the engine call fails or times out
    pub async fn execute(&self, sql: &str, use_cache: bool) -> GatewayResult<QueryOutcome> {
        let target = self.default_target()?.clone();
        self.execute_on(&target, sql, use_cache).await
    }

    /// Execute `sql` against a specific target
    pub async fn execute_on(
        &self,
        target: &CatalogTarget,
        sql: &str,
        use_cache: bool,
    ) -> GatewayResult<QueryOutcome> {
        validator::validate(sql)?;

        let scope = target.pool_key();
        let start = Instant::now();
        if use_cache {
            if let Some(result) = self.cache.lookup(&scope, sql) {
                return Ok(QueryOutcome {
                    result,
                    from_cache: true,
                    execution_time: start.elapsed(),
                });
            }
        }

        let result = self.run(target, sql).await?;
        let execution_time = start.elapsed();

        tracing::debug!(
            target_key = %target,
            rows = result.row_count(),
            elapsed_ms = execution_time.as_millis() as u64,
            "Query executed"
        );

        if use_cache {
            self.cache.store(&scope, sql, result.clone());
        }

        Ok(QueryOutcome {
            result,
            from_cache: false,
            execution_time,
        })
    }

    /// Connect (if needed) and fetch, both under the query timeout
    async fn run(&self, target: &CatalogTarget, sql: &str) -> Result<ResultSet, DbError> {
        let fetch = async {
            let conn = self.pool.acquire(target).await?;
            conn.fetch_pages(sql).await
        };
        let pages = tokio::time::timeout(self.config.query.timeout(), fetch)
            .await
            .map_err(|_| DbError::Timeout)??;

        let result = ResultSet::from_pages(pages);
        if result.columns.is_empty() && !result.rows.is_empty() {
            return Err(DbError::NoColumns);
        }
        Ok(result)
    }

    /// Describe every table visible through the configured targets
    ///
    /// Each target is queried independently; a failing target is logged and
    /// left out. The unfiltered result is cached until [`Gateway::refresh_schema`].
    pub async fn describe_tables(&self) -> Vec<TableInfo> {
        let (cached, generation) = {
            let cache = self.schema_cache.read().await;
            (cache.tables.clone(), cache.generation)
        };
        let tables = match cached {
            Some(tables) => tables,
            None => {
                let discovered = Arc::new(self.discover().await);
                let mut cache = self.schema_cache.write().await;
                if cache.generation == generation {
                    cache.tables = Some(Arc::clone(&discovered));
                } else {
                    tracing::debug!("Schema refreshed during discovery, result not cached");
                }
                discovered
            }
        };

        let snapshot = self.access.snapshot();
        tables
            .iter()
            .filter(|t| snapshot.policy.allows(&t.qualified_name(), &t.name))
            .cloned()
            .collect()
    }

    async fn discover(&self) -> Vec<TableInfo> {
        let lookups = self.config.targets.iter().map(|target| async move {
            let sql = describe_sql(target);
            (target, self.execute_on(target, &sql, false).await)
        });

        let mut tables = Vec::new();
        for (target, outcome) in futures::future::join_all(lookups).await {
            match outcome {
                Ok(outcome) => tables.extend(tables_from_columns(
                    &target.catalog,
                    &target.schema,
                    &outcome.result,
                )),
                Err(e) => {
                    tracing::warn!(target_key = %target, error = %e, "Table discovery failed");
                }
            }
        }
        tables
    }

    /// Drop discovered tables so the next describe re-queries every target
    pub async fn refresh_schema(&self) {
        let mut cache = self.schema_cache.write().await;
        cache.generation += 1;
        cache.tables = None;
        tracing::info!(generation = cache.generation, "Schema cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }

    /// Swap in a new access policy, returning its version
    pub fn reload_access(&self, policy: AccessPolicy) -> u64 {
        self.access.replace(policy)
    }
}

/// Column listing for one target
fn describe_sql(target: &CatalogTarget) -> String {
    format!(
        "SELECT table_name, column_name, data_type \
         FROM information_schema.columns \
         WHERE table_catalog = {} AND table_schema = {} \
         ORDER BY table_name, ordinal_position",
        quote_literal(&target.catalog),
        quote_literal(&target.schema),
    )
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
