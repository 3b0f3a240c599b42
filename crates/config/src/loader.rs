use std::path::Path;

use anyhow::{Context as _, bail};
use indoc::indoc;
use secrecy::ExposeSecret;

use crate::{AuthConfig, Config, GeofenceConfig, LimiterConfig};

const VALID_ROLES: &[&str] = &["admin", "employee"];

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file {}", path.display()))?;

    let config: Config = toml::from_str(&content)?;
    validate(&config)?;

    Ok(config)
}

pub(crate) fn validate(config: &Config) -> anyhow::Result<()> {
    validate_limiter("rate_limit.global", &config.rate_limit.global)?;
    validate_limiter("rate_limit.login", &config.rate_limit.login)?;
    validate_auth(&config.auth)?;
    validate_geofence(&config.geofence)?;

    Ok(())
}

fn validate_limiter(section: &str, limiter: &LimiterConfig) -> anyhow::Result<()> {
    if !limiter.refill_per_second.is_finite() || limiter.refill_per_second <= 0.0 {
        bail!("[{section}] refill_per_second must be a positive, finite number");
    }

    if limiter.burst == 0 {
        bail!("[{section}] burst must be at least 1, otherwise every request is rejected");
    }

    if limiter.sweep_interval.is_zero() {
        bail!("[{section}] sweep_interval must be greater than zero");
    }

    if limiter.max_idle.is_zero() {
        bail!("[{section}] max_idle must be greater than zero");
    }

    Ok(())
}

fn validate_auth(auth: &AuthConfig) -> anyhow::Result<()> {
    if auth.secret.expose_secret().is_empty() {
        bail!(indoc! {r#"
            No token signing secret configured. Set one in the [auth] section:

              [auth]
              secret = "{{ env.TURNSTILE_SECRET }}"

            Every instance validating the same tokens must share this secret.
        "#});
    }

    if auth.access_token_ttl.is_zero() {
        bail!("[auth] access_token_ttl must be greater than zero");
    }

    if auth.refresh_token_ttl.is_zero() {
        bail!("[auth] refresh_token_ttl must be greater than zero");
    }

    for user in &auth.users {
        if !VALID_ROLES.contains(&user.role.as_str()) {
            bail!(
                "Role '{}' for user '{}' is not valid; expected one of: {}",
                user.role,
                user.email,
                VALID_ROLES.join(", ")
            );
        }

        let digest_ok =
            user.password_sha256.len() == 64 && user.password_sha256.bytes().all(|b| b.is_ascii_hexdigit());

        if !digest_ok {
            bail!(
                "User '{}' password_sha256 must be a 64-character hex SHA-256 digest",
                user.email
            );
        }
    }

    Ok(())
}

fn validate_geofence(geofence: &GeofenceConfig) -> anyhow::Result<()> {
    if !geofence.default_radius_meters.is_finite() || geofence.default_radius_meters <= 0.0 {
        bail!("[geofence] default_radius_meters must be a positive, finite number");
    }

    for zone in &geofence.zones {
        if zone.name.is_empty() {
            bail!("Every [[geofence.zones]] entry needs a non-empty name");
        }

        if !(-90.0..=90.0).contains(&zone.latitude) || !(-180.0..=180.0).contains(&zone.longitude) {
            bail!(
                "Zone '{}' has coordinates outside the valid range (latitude -90..=90, longitude -180..=180)",
                zone.name
            );
        }

        let radius = zone.radius_meters.unwrap_or(geofence.default_radius_meters);

        if !radius.is_finite() || radius <= 0.0 {
            bail!("Zone '{}' must have a radius greater than zero", zone.name);
        }
    }

    if geofence.enabled && geofence.zones.is_empty() {
        log::warn!(
            "geofencing is enabled but no zones are provisioned in configuration; \
             check-ins that supply coordinates will be rejected unless the zone store has entries"
        );
    }

    Ok(())
}
