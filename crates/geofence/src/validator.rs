use crate::{AllowedZone, Coordinate, haversine_distance};

/// Why a supplied check-in location was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeofenceViolation {
    /// Geofencing is on but the zone snapshot is empty. Rejecting here keeps
    /// an empty configuration from silently disabling the control.
    #[error("no allowed zones are configured")]
    NoZonesConfigured,
    #[error("check-in location is outside the allowed area")]
    OutsideAllowedArea,
}

/// Pure accept/reject decision over a zone snapshot.
///
/// Holds no zone state itself; every call sees whatever snapshot the caller
/// fetched, so zone updates take effect immediately.
#[derive(Debug, Clone, Copy)]
pub struct GeofenceValidator {
    enabled: bool,
}

impl GeofenceValidator {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decision ladder: disabled accepts everything; an unset coordinate is
    /// accepted (the caller chose not to supply a location, which takes
    /// precedence over the empty-snapshot rejection); an empty snapshot
    /// rejects; otherwise the coordinate must fall within at least one
    /// zone's radius, boundary inclusive.
    pub fn validate_check_in(&self, coordinate: Coordinate, zones: &[AllowedZone]) -> Result<(), GeofenceViolation> {
        if !self.enabled {
            return Ok(());
        }

        if coordinate.is_unset() {
            return Ok(());
        }

        if zones.is_empty() {
            return Err(GeofenceViolation::NoZonesConfigured);
        }

        for zone in zones {
            if haversine_distance(coordinate, zone.center()) <= zone.radius_meters {
                return Ok(());
            }
        }

        Err(GeofenceViolation::OutsideAllowedArea)
    }

    /// The closest zone and its distance in meters, regardless of radius.
    /// Diagnostics only; independent of the accept/reject decision. Ties go
    /// to the first zone in snapshot order.
    pub fn nearest_zone<'a>(&self, coordinate: Coordinate, zones: &'a [AllowedZone]) -> Option<(&'a AllowedZone, f64)> {
        let mut nearest: Option<(&AllowedZone, f64)> = None;

        for zone in zones {
            let distance = haversine_distance(coordinate, zone.center());

            if nearest.is_none_or(|(_, best)| distance < best) {
                nearest = Some((zone, distance));
            }
        }

        nearest
    }
}
