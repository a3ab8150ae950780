//! Per-catalog connection pool
//!
//! One handle per `catalog.schema` key, created on first use and kept for
//! the pool's lifetime. Once `max_connections` keys are resident, further
//! keys get a fresh handle per call that is never admitted.

use crate::config::CatalogTarget;
use crate::db::engine::Connector;
use crate::error::DbResult;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

type Slot<T> = Arc<OnceCell<Arc<T>>>;

pub struct ConnectionPool<C: Connector> {
    connector: C,
    /// Reserved slots; a slot is filled once its handle is constructed
    slots: Mutex<HashMap<String, Slot<C::Conn>>>,
    max_connections: usize,
}

impl<C: Connector> ConnectionPool<C> {
    pub fn new(connector: C, max_connections: usize) -> Self {
        Self {
            connector,
            slots: Mutex::new(HashMap::new()),
            max_connections,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot<C::Conn>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the handle for `target`, constructing it on first use
    ///
    /// Concurrent callers for the same key share a single construction.
    ///
    /// # Errors
    /// Returns `DbError::ConnectionFailed` if a new handle cannot be opened
    pub async fn acquire(&self, target: &CatalogTarget) -> DbResult<Arc<C::Conn>> {
        let key = target.pool_key();

        // Reserve or find the slot under the lock; construct outside it
        let slot = {
            let mut slots = self.lock();
            match slots.get(&key) {
                Some(slot) => Some(Arc::clone(slot)),
                None if slots.len() < self.max_connections => {
                    let slot: Slot<C::Conn> = Arc::new(OnceCell::new());
                    slots.insert(key.clone(), Arc::clone(&slot));
                    Some(slot)
                }
                None => None,
            }
        };

        let Some(slot) = slot else {
            tracing::debug!(key = %key, "Pool full, opening unpooled connection");
            return Ok(Arc::new(self.connector.connect(target).await?));
        };

        let result = slot
            .get_or_try_init(|| async {
                tracing::debug!(key = %key, "Opening pooled connection");
                self.connector.connect(target).await.map(Arc::new)
            })
            .await;

        match result {
            Ok(conn) => Ok(Arc::clone(conn)),
            Err(e) => {
                // Release the reservation so a later call can retry
                let mut slots = self.lock();
                if slots.get(&key).is_some_and(|s| Arc::ptr_eq(s, &slot)) && !slot.initialized() {
                    slots.remove(&key);
                }
                Err(e)
            }
        }
    }

    /// Number of reserved keys
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, target: &CatalogTarget) -> bool {
        self.lock().contains_key(&target.pool_key())
    }

    pub fn capacity(&self) -> usize {
        self.max_connections
    }
}
