use std::sync::Arc;

use crate::{AllowedZone, Coordinate, GeofenceValidator, GeofenceViolation, ZoneStore, ZoneStoreError};

/// Check-in gate outcome when the location is not accepted.
#[derive(Debug, thiserror::Error)]
pub enum GeofenceError {
    #[error(transparent)]
    Rejected(#[from] GeofenceViolation),
    /// The zone snapshot could not be fetched. Surfaced as a server-side
    /// failure: accepting would disable the control, rejecting would blame
    /// callers for a storage outage.
    #[error(transparent)]
    Unavailable(#[from] ZoneStoreError),
}

/// Ties the pure validator to the zone store boundary.
pub struct GeofenceService {
    validator: GeofenceValidator,
    store: Arc<dyn ZoneStore>,
}

impl GeofenceService {
    pub fn new(enabled: bool, store: Arc<dyn ZoneStore>) -> Self {
        Self {
            validator: GeofenceValidator::new(enabled),
            store,
        }
    }

    pub fn validator(&self) -> &GeofenceValidator {
        &self.validator
    }

    /// Gate a check-in location against the current zone snapshot.
    pub async fn validate_check_in(&self, coordinate: Coordinate) -> Result<(), GeofenceError> {
        // When the outcome cannot depend on the snapshot, skip the fetch.
        if !self.validator.is_enabled() || coordinate.is_unset() {
            return Ok(());
        }

        let zones = self.store.active_zones().await?;

        self.validator.validate_check_in(coordinate, &zones).map_err(Into::into)
    }

    /// Closest zone and distance for diagnostics; `None` without zones.
    pub async fn nearest_zone(&self, coordinate: Coordinate) -> Result<Option<(AllowedZone, f64)>, GeofenceError> {
        let zones = self.store.active_zones().await?;

        Ok(self
            .validator
            .nearest_zone(coordinate, &zones)
            .map(|(zone, distance)| (zone.clone(), distance)))
    }

    /// The active zone snapshot, for administrative listing.
    pub async fn active_zones(&self) -> Result<Vec<AllowedZone>, GeofenceError> {
        Ok(self.store.active_zones().await?)
    }
}
