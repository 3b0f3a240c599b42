//! Geofencing for check-ins: great-circle distance, allowed zones, and the
//! accept/reject decision.

mod distance;
mod service;
mod store;
mod validator;
mod zone;

pub use distance::{Coordinate, EARTH_RADIUS_METERS, haversine_distance};
pub use service::{GeofenceError, GeofenceService};
pub use store::{StaticZoneStore, ZoneStore, ZoneStoreError};
pub use validator::{GeofenceValidator, GeofenceViolation};
pub use zone::AllowedZone;
