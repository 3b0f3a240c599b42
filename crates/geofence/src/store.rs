use async_trait::async_trait;

use crate::AllowedZone;

/// The zone snapshot could not be loaded from the backing store.
#[derive(Debug, thiserror::Error)]
#[error("zone store unavailable: {reason}")]
pub struct ZoneStoreError {
    reason: String,
}

impl ZoneStoreError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// I/O boundary for allowed zones. Implementations may block or fail
/// independently of the distance math; their timeout policy is their own.
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// The currently active zones. Fetched per validation, so updates made
    /// through the administrative surface take effect on the next check-in.
    async fn active_zones(&self) -> Result<Vec<AllowedZone>, ZoneStoreError>;
}

/// Fixed zone list, for deployments that provision zones through
/// configuration instead of a database.
pub struct StaticZoneStore {
    zones: Vec<AllowedZone>,
}

impl StaticZoneStore {
    pub fn new(zones: Vec<AllowedZone>) -> Self {
        Self { zones }
    }
}

#[async_trait]
impl ZoneStore for StaticZoneStore {
    async fn active_zones(&self) -> Result<Vec<AllowedZone>, ZoneStoreError> {
        Ok(self.zones.iter().filter(|zone| zone.active).cloned().collect())
    }
}
