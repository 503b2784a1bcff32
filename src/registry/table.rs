//! In-memory registry table.
//!
//! # Invariants
//! - A service name present in the table maps to a non-empty sequence
//! - No duplicate url within one service's sequence
//! - Sequence order is the round-robin rotation order

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// One running process of a service, identified by its url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstance {
    pub url: String,
    /// Last successful probe (or registration), in epoch milliseconds.
    pub last_health_check: u64,
}

/// Outcome of pruning the table against probe results.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneReport {
    /// `(service, url)` pairs that were dropped.
    pub evicted: Vec<(String, String)>,
    /// Service names that disappeared because they became empty.
    pub emptied: Vec<String>,
}

impl PruneReport {
    pub fn changed(&self) -> bool {
        !self.evicted.is_empty()
    }
}

/// Service name → ordered instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryTable(BTreeMap<String, VecDeque<ServiceInstance>>);

impl RegistryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instance to the tail of its service. Returns false when the
    /// url is already registered under that name.
    pub fn insert(&mut self, service: &str, url: &str, now: u64) -> bool {
        let instances = self.0.entry(service.to_string()).or_default();
        if instances.iter().any(|i| i.url == url) {
            return false;
        }
        instances.push_back(ServiceInstance {
            url: url.to_string(),
            last_health_check: now,
        });
        true
    }

    /// Remove an instance, dropping the service once it is empty.
    /// Returns false when nothing matched.
    pub fn remove(&mut self, service: &str, url: &str) -> bool {
        let Some(instances) = self.0.get_mut(service) else {
            return false;
        };
        let before = instances.len();
        instances.retain(|i| i.url != url);
        let removed = instances.len() != before;
        if instances.is_empty() {
            self.0.remove(service);
        }
        removed
    }

    /// Move the head instance to the tail and return its url.
    pub fn rotate(&mut self, service: &str) -> Option<String> {
        let instances = self.0.get_mut(service)?;
        let head = instances.pop_front()?;
        let url = head.url.clone();
        instances.push_back(head);
        Some(url)
    }

    pub fn get(&self, service: &str) -> Option<&VecDeque<ServiceInstance>> {
        self.0.get(service)
    }

    pub fn contains(&self, service: &str) -> bool {
        self.0.contains_key(service)
    }

    pub fn service_names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Every registered `(service, url)` pair, in table order.
    pub fn instances(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .flat_map(|(name, instances)| {
                instances.iter().map(move |i| (name.clone(), i.url.clone()))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of services.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Apply probe results. Instances in `failed` are dropped; instances in
    /// `healthy` get `last_health_check = now`. Instances in neither set were
    /// not probed (registered mid-sweep) and are left alone.
    pub fn prune(
        &mut self,
        healthy: &HashSet<(String, String)>,
        failed: &HashSet<(String, String)>,
        now: u64,
    ) -> PruneReport {
        let mut report = PruneReport::default();

        for (name, instances) in self.0.iter_mut() {
            instances.retain_mut(|instance| {
                let key = (name.clone(), instance.url.clone());
                if failed.contains(&key) {
                    report.evicted.push(key);
                    return false;
                }
                if healthy.contains(&key) {
                    instance.last_health_check = now;
                }
                true
            });
            if instances.is_empty() {
                report.emptied.push(name.clone());
            }
        }

        for name in &report.emptied {
            self.0.remove(name);
        }
        report
    }

    /// Restore the invariants on a table read from disk.
    pub fn normalize(&mut self) {
        self.0.retain(|_, instances| {
            let mut seen = HashSet::new();
            instances.retain(|i| seen.insert(i.url.clone()));
            !instances.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(service: &str, url: &str) -> (String, String) {
        (service.to_string(), url.to_string())
    }

    #[test]
    fn test_round_robin_follows_registration_order() {
        let mut table = RegistryTable::new();
        let urls = ["http://a:1", "http://b:2", "http://c:3"];
        for url in urls {
            table.insert("itemService", url, 0);
        }

        let picked: Vec<_> = (0..3).map(|_| table.rotate("itemService").unwrap()).collect();
        assert_eq!(picked, urls);

        // N+1 wraps around to the first
        assert_eq!(table.rotate("itemService").unwrap(), urls[0]);
    }

    #[test]
    fn test_new_instance_joins_at_tail() {
        let mut table = RegistryTable::new();
        table.insert("userService", "http://a:1", 0);
        table.insert("userService", "http://b:2", 0);
        assert_eq!(table.rotate("userService").unwrap(), "http://a:1");

        // Order is now [b, a]; c lands after both
        table.insert("userService", "http://c:3", 0);
        assert_eq!(table.rotate("userService").unwrap(), "http://b:2");
        assert_eq!(table.rotate("userService").unwrap(), "http://a:1");
        assert_eq!(table.rotate("userService").unwrap(), "http://c:3");
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut table = RegistryTable::new();
        assert!(table.insert("listService", "http://a:1", 10));
        assert!(!table.insert("listService", "http://a:1", 20));

        let instances = table.get("listService").unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].last_health_check, 10);
    }

    #[test]
    fn test_remove_last_instance_drops_service() {
        let mut table = RegistryTable::new();
        table.insert("itemService", "http://a:1", 0);
        assert!(table.remove("itemService", "http://a:1"));
        assert!(!table.contains("itemService"));
        assert!(table.rotate("itemService").is_none());

        // Absent name or url is a no-op
        assert!(!table.remove("itemService", "http://a:1"));
        assert!(!table.remove("ghost", "http://x:9"));
    }

    #[test]
    fn test_prune_drops_only_failed() {
        let mut table = RegistryTable::new();
        table.insert("userService", "http://a:1", 0);
        table.insert("userService", "http://b:2", 0);

        let healthy = HashSet::from([key("userService", "http://a:1")]);
        let failed = HashSet::from([key("userService", "http://b:2")]);
        let report = table.prune(&healthy, &failed, 99);

        assert!(report.changed());
        assert!(report.emptied.is_empty());
        let remaining = table.get("userService").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].url, "http://a:1");
        assert_eq!(remaining[0].last_health_check, 99);
    }

    #[test]
    fn test_prune_all_failed_removes_name() {
        let mut table = RegistryTable::new();
        table.insert("userService", "http://a:1", 0);
        table.insert("userService", "http://b:2", 0);

        let failed = HashSet::from([key("userService", "http://a:1"), key("userService", "http://b:2")]);
        let report = table.prune(&HashSet::new(), &failed, 1);

        assert_eq!(report.emptied, vec!["userService".to_string()]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_prune_keeps_unprobed_instances() {
        let mut table = RegistryTable::new();
        table.insert("itemService", "http://late:1", 5);

        let report = table.prune(&HashSet::new(), &HashSet::new(), 50);
        assert!(!report.changed());
        assert_eq!(table.get("itemService").unwrap()[0].last_health_check, 5);
    }

    #[test]
    fn test_normalize_restores_invariants() {
        let mut table: RegistryTable = serde_json::from_str(
            r#"{
                "empty": [],
                "itemService": [
                    {"url": "http://a:1", "lastHealthCheck": 1},
                    {"url": "http://a:1", "lastHealthCheck": 2}
                ]
            }"#,
        )
        .unwrap();

        table.normalize();
        assert!(!table.contains("empty"));
        assert_eq!(table.get("itemService").unwrap().len(), 1);
    }
}
