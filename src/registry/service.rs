//! Service registry operations.
//!
//! # Concurrency
//! One async mutex guards the table. Every mutation changes the table and
//! persists it while holding the lock, which makes rotation linearizable and
//! serializes writes to the store. Network probes never run under the lock.
//!
//! A failed save leaves the table marked unsaved. The next mutating call
//! persists even when it changes nothing itself, so a retried `register`
//! only reports success once the entry is on disk.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::error::PersistenceError;
use crate::observability::metrics;
use crate::registry::store::RegistryStore;
use crate::registry::table::{now_millis, PruneReport, RegistryTable};

/// In-memory index over the persisted registry.
#[derive(Debug)]
pub struct ServiceRegistry {
    table: Mutex<RegistryTable>,
    store: RegistryStore,
    /// Set when the last save failed. Only touched under the table lock.
    unsaved: AtomicBool,
}

impl ServiceRegistry {
    /// Load the persisted table (creating it if absent).
    pub async fn open(store: RegistryStore) -> Result<Self, PersistenceError> {
        let table = store.load().await?;
        for name in table.service_names() {
            let count = table.get(&name).map_or(0, |i| i.len());
            metrics::record_registry_size(&name, count);
        }
        Ok(Self {
            table: Mutex::new(table),
            store,
            unsaved: AtomicBool::new(false),
        })
    }

    /// Register `url` under `service`. Idempotent; returns the url.
    pub async fn register(&self, service: &str, url: &str) -> Result<String, PersistenceError> {
        let mut table = self.table.lock().await;
        if table.insert(service, url, now_millis()) {
            self.persist(&table).await?;
            metrics::record_registry_size(service, instance_count(&table, service));
            tracing::info!(service = %service, url = %url, "Service registered");
        } else {
            tracing::debug!(service = %service, url = %url, "Service already registered");
            self.persist_if_unsaved(&table).await?;
        }
        Ok(url.to_string())
    }

    /// Remove `url` from `service`. No-op when the name or url is absent.
    pub async fn unregister(&self, service: &str, url: &str) -> Result<(), PersistenceError> {
        let mut table = self.table.lock().await;
        if !table.remove(service, url) {
            return self.persist_if_unsaved(&table).await;
        }
        tracing::info!(service = %service, url = %url, "Service unregistered");
        metrics::record_registry_size(service, instance_count(&table, service));
        self.persist(&table).await
    }

    /// Pick the next instance round-robin. The rotation is persisted.
    pub async fn discover(&self, service: &str) -> Result<Option<String>, PersistenceError> {
        let mut table = self.table.lock().await;
        let Some(url) = table.rotate(service) else {
            return Ok(None);
        };
        self.persist(&table).await?;
        tracing::trace!(service = %service, url = %url, "Instance discovered");
        Ok(Some(url))
    }

    /// Copy of the full table. Does not rotate.
    pub async fn snapshot(&self) -> RegistryTable {
        self.table.lock().await.clone()
    }

    pub async fn service_names(&self) -> Vec<String> {
        self.table.lock().await.service_names()
    }

    /// Every registered `(service, url)` pair.
    pub async fn instances(&self) -> Vec<(String, String)> {
        self.table.lock().await.instances()
    }

    /// Apply one health sweep's probe results. Persists only when an
    /// instance was dropped.
    pub async fn apply_probe_results(
        &self,
        healthy: &HashSet<(String, String)>,
        failed: &HashSet<(String, String)>,
    ) -> Result<PruneReport, PersistenceError> {
        let mut table = self.table.lock().await;
        let report = table.prune(healthy, failed, now_millis());

        for (service, url) in &report.evicted {
            tracing::warn!(service = %service, url = %url, "Health check failed, removing instance");
            metrics::record_eviction(service);
            metrics::record_registry_size(service, instance_count(&table, service));
        }

        if report.changed() {
            self.persist(&table).await?;
        }
        Ok(report)
    }

    async fn persist(&self, table: &RegistryTable) -> Result<(), PersistenceError> {
        let result = self.store.save(table).await;
        self.unsaved.store(result.is_err(), Ordering::Relaxed);
        result.inspect_err(|e| {
            tracing::error!(path = %self.store.path().display(), error = %e, "Failed to persist service registry");
        })
    }

    async fn persist_if_unsaved(&self, table: &RegistryTable) -> Result<(), PersistenceError> {
        if self.unsaved.load(Ordering::Relaxed) {
            tracing::info!("Retrying save of previously unsaved registry changes");
            self.persist(table).await
        } else {
            Ok(())
        }
    }
}

fn instance_count(table: &RegistryTable, service: &str) -> usize {
    table.get(service).map_or(0, |i| i.len())
}
