//! Table access policy
//!
//! The access policy decides which discovered tables are exposed to callers.
//! It is held as a versioned snapshot: readers grab the current `Arc` and
//! reloads swap in a whole new policy at once.

use crate::error::ConfigResult;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Tables visible through the gateway
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessPolicy {
    /// Table names, either bare (`orders`) or qualified (`sales.public.orders`).
    /// Empty means every table is visible.
    #[serde(default)]
    pub allowed_tables: Vec<String>,
}

impl AccessPolicy {
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Whether a table is visible under this policy
    pub fn allows(&self, qualified_name: &str, table: &str) -> bool {
        self.allowed_tables.is_empty()
            || self
                .allowed_tables
                .iter()
                .any(|t| t.eq_ignore_ascii_case(table) || t.eq_ignore_ascii_case(qualified_name))
    }
}

/// A policy together with the version it was installed under
#[derive(Debug, Clone)]
pub struct AccessSnapshot {
    pub version: u64,
    pub policy: AccessPolicy,
}

/// Holder of the current access snapshot
#[derive(Debug)]
pub struct AccessControl {
    current: ArcSwap<AccessSnapshot>,
}

impl AccessControl {
    pub fn new(policy: AccessPolicy) -> Self {
        Self {
            current: ArcSwap::from_pointee(AccessSnapshot { version: 1, policy }),
        }
    }

    /// Current snapshot; stays consistent for as long as the caller holds it
    pub fn snapshot(&self) -> Arc<AccessSnapshot> {
        self.current.load_full()
    }

    /// Install a new policy and return its version
    pub fn replace(&self, policy: AccessPolicy) -> u64 {
        let mut installed = 0;
        self.current.rcu(|old| {
            installed = old.version + 1;
            AccessSnapshot {
                version: installed,
                policy: policy.clone(),
            }
        });
        tracing::info!(version = installed, "Access policy replaced");
        installed
    }

    /// Re-read a policy file and swap it in
    pub fn reload_from(&self, path: &Path) -> ConfigResult<u64> {
        let content = std::fs::read_to_string(path)?;
        let policy = AccessPolicy::from_toml(&content)?;
        Ok(self.replace(policy))
    }
}

impl Default for AccessControl {
    fn default() -> Self {
        Self::new(AccessPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_policy_allows_everything() {
        let policy = AccessPolicy::default();
        assert!(policy.allows("a.b.c", "c"));
    }

    #[test]
    fn test_policy_matches_bare_or_qualified() {
        let policy = AccessPolicy {
            allowed_tables: vec!["orders".into(), "hr.public.staff".into()],
        };
        assert!(policy.allows("sales.public.orders", "orders"));
        assert!(policy.allows("hr.public.staff", "staff"));
        assert!(!policy.allows("other.public.staff", "staff"));
    }

    #[test]
    fn test_replace_bumps_version() {
        let access = AccessControl::default();
        let before = access.snapshot();
        assert_eq!(before.version, 1);

        let v = access.replace(AccessPolicy {
            allowed_tables: vec!["x".into()],
        });
        assert_eq!(v, 2);

        // Old snapshot is untouched
        assert!(before.policy.allowed_tables.is_empty());
        assert_eq!(access.snapshot().policy.allowed_tables, vec!["x"]);
    }

    #[test]
    fn test_reload_from_file() {
        let dir = std::env::temp_dir().join(format!("querygate-access-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("access.toml");
        std::fs::write(&path, "allowed_tables = [\"orders\"]\n").unwrap();

        let access = AccessControl::default();
        let v = access.reload_from(&path).unwrap();
        assert_eq!(v, 2);
        assert_eq!(access.snapshot().policy.allowed_tables, vec!["orders"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
