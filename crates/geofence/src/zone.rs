use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// A circular area where check-ins are accepted.
///
/// Zone lifecycle (creation, updates, deactivation) belongs to an external
/// administrative surface; the validator consumes read-only snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowedZone {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub active: bool,
}

impl AllowedZone {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
