use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::cache::StateCache;
use crate::error::HostError;
use crate::record::Record;

/// A query result row, as returned by the host's SQL surface.
pub type QueryRow = serde_json::Map<String, serde_json::Value>;

/// The host surface the engine consumes: the query engine for prior
/// aggregate state and the persistence path for computed records.
#[async_trait]
pub trait HostGateway: Send + Sync {
    /// Run a SQL query. A table that does not exist yet surfaces as
    /// `HostError::NotFound`, which callers treat as empty prior state.
    async fn query(&self, sql: &str) -> Result<Vec<QueryRow>, HostError>;

    /// Durably persist one record. Not retried; failures are logged by the
    /// caller and the cycle continues.
    async fn write(&self, record: Record) -> Result<(), HostError>;
}

/// Everything a processor needs for one cycle: the host gateway, the
/// cross-invocation state cache, and the cycle's wall clock.
///
/// The clock is injected so cooldown behavior is testable; production
/// callers use `CycleContext::new`, which stamps `Utc::now()`.
pub struct CycleContext<'a> {
    pub host: &'a dyn HostGateway,
    pub cache: &'a dyn StateCache,
    pub now: DateTime<Utc>,
}

impl<'a> CycleContext<'a> {
    pub fn new(host: &'a dyn HostGateway, cache: &'a dyn StateCache) -> Self {
        Self { host, cache, now: Utc::now() }
    }

    pub fn with_now(host: &'a dyn HostGateway, cache: &'a dyn StateCache, now: DateTime<Utc>) -> Self {
        Self { host, cache, now }
    }
}
