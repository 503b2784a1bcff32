//! Per-process gateway state.

use std::path::Path;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::error::PersistenceError;
use crate::health::{HealthSweeper, Prober};
use crate::http::client::{build_client, HttpClient};
use crate::registry::{RegistryStore, ServiceRegistry};
use crate::resilience::BreakerBank;

/// Everything a request handler needs, built once at startup.
///
/// The registry is shared with the health sweeper; the breaker bank is only
/// ever touched by request handling.
#[derive(Clone)]
pub struct GatewayState {
    pub registry: Arc<ServiceRegistry>,
    pub breakers: Arc<BreakerBank>,
    pub client: HttpClient,
    pub prober: Prober,
    pub config: Arc<GatewayConfig>,
}

impl GatewayState {
    /// Load the persisted registry and create the breaker bank.
    pub async fn bootstrap(config: GatewayConfig) -> Result<Self, PersistenceError> {
        let store = RegistryStore::new(Path::new(&config.registry.path));
        let registry = Arc::new(ServiceRegistry::open(store).await?);
        let client = build_client();
        let prober = Prober::new(client.clone(), config.registry.probe_timeout());

        Ok(Self {
            registry,
            breakers: Arc::new(BreakerBank::new(config.breaker)),
            client,
            prober,
            config: Arc::new(config),
        })
    }

    /// Health sweeper bound to this state's registry.
    pub fn health_sweeper(&self) -> HealthSweeper {
        HealthSweeper::new(
            self.registry.clone(),
            self.prober.clone(),
            self.config.registry.health_interval(),
        )
    }
}
