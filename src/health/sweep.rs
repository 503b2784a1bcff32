//! Periodic health sweep over the service registry.
//!
//! # Responsibilities
//! - Probe every registered instance on a fixed interval
//! - Drop instances that fail, refresh the ones that pass

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};

use crate::error::PersistenceError;
use crate::health::probe::Prober;
use crate::registry::service::ServiceRegistry;
use crate::registry::table::PruneReport;

pub struct HealthSweeper {
    registry: Arc<ServiceRegistry>,
    prober: Prober,
    interval: Duration,
}

impl HealthSweeper {
    pub fn new(registry: Arc<ServiceRegistry>, prober: Prober, interval: Duration) -> Self {
        Self {
            registry,
            prober,
            interval,
        }
    }

    /// Sweep every `interval` until shutdown. The first sweep runs one
    /// interval after start.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Health sweeper starting");

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        tracing::error!(error = %e, "Health sweep could not persist registry");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe all instances concurrently, then prune under the registry lock.
    pub async fn sweep_once(&self) -> Result<PruneReport, PersistenceError> {
        let targets = self.registry.instances().await;

        let mut probes = JoinSet::new();
        for (service, url) in targets {
            let prober = self.prober.clone();
            probes.spawn(async move {
                let alive = prober.is_alive(&url).await;
                ((service, url), alive)
            });
        }

        let mut healthy = HashSet::new();
        let mut failed = HashSet::new();
        while let Some(result) = probes.join_next().await {
            match result {
                Ok((key, true)) => {
                    healthy.insert(key);
                }
                Ok((key, false)) => {
                    failed.insert(key);
                }
                Err(e) => tracing::error!(error = %e, "Health probe task failed"),
            }
        }

        let report = self.registry.apply_probe_results(&healthy, &failed).await?;
        tracing::debug!(
            healthy = healthy.len(),
            evicted = report.evicted.len(),
            "Health sweep complete"
        );
        Ok(report)
    }
}
