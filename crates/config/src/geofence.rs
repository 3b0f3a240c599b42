//! Geofencing configuration.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeofenceConfig {
    /// When disabled, every check-in location is accepted.
    pub enabled: bool,
    /// Radius applied to zones that do not specify one.
    pub default_radius_meters: f64,
    /// Zones provisioned through configuration, served by the static store.
    pub zones: Vec<ZoneConfig>,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            default_radius_meters: 100.0,
            zones: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneConfig {
    /// Defaults to the zone name when omitted.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Falls back to `default_radius_meters` when omitted.
    #[serde(default)]
    pub radius_meters: Option<f64>,
    #[serde(default = "default_zone_active")]
    pub active: bool,
}

fn default_zone_active() -> bool {
    true
}
