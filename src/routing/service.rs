//! Statically known downstream services.
//!
//! Only these names get a circuit breaker. Any other name still resolves
//! through the registry, it just bypasses the breaker.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A downstream service the gateway ships breaker state for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum KnownService {
    #[serde(rename = "userService")]
    User,
    #[serde(rename = "itemService")]
    Item,
    #[serde(rename = "listService")]
    List,
}

impl KnownService {
    pub const ALL: [KnownService; 3] = [KnownService::User, KnownService::Item, KnownService::List];

    /// Registry name of the service.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownService::User => "userService",
            KnownService::Item => "itemService",
            KnownService::List => "listService",
        }
    }
}

impl fmt::Display for KnownService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned for names outside the known set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownService;

impl FromStr for KnownService {
    type Err = UnknownService;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KnownService::ALL
            .into_iter()
            .find(|svc| svc.as_str() == s)
            .ok_or(UnknownService)
    }
}
