use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::Utc;
use context::RequestIdentity;
use geofence::{AllowedZone, Coordinate};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
pub(crate) struct LoginResponse {
    access_token: String,
    refresh_token: String,
    token_type: &'static str,
    expires_in: u64,
}

pub(crate) async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .directory()
        .verify_credentials(&request.email, &request.password)
        .await
        .map_err(|error| {
            log::error!("user directory lookup failed: {error}");
            ApiError::service_unavailable("user directory unavailable")
        })?;

    let Some(user) = user else {
        // One message for both unknown email and wrong password.
        return Err(ApiError::unauthorized("invalid email or password"));
    };

    let now = Utc::now();
    let credentials = state.credentials();

    let access_token = credentials.issue_access_token(&user.id, &user.email, &user.role, now)?;
    let refresh_token = credentials.issue_refresh_token(&user.id, &user.email, &user.role, now)?;

    log::debug!("issued access and refresh tokens for subject {}", user.id);

    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in: credentials.access_ttl().as_secs(),
    }))
}

#[derive(Deserialize)]
pub(crate) struct CheckInRequest {
    /// Both coordinates defaulting to zero means "no location supplied".
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
}

#[derive(Serialize)]
pub(crate) struct CheckInResponse {
    status: &'static str,
    subject_id: String,
}

pub(crate) async fn check_in(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Json(request): Json<CheckInRequest>,
) -> Result<Json<CheckInResponse>, ApiError> {
    let coordinate = Coordinate::new(request.latitude, request.longitude);

    if !coordinate.is_unset() && !coordinate.in_bounds() {
        return Err(ApiError::bad_request("coordinates are out of range"));
    }

    state
        .geofence()
        .validate_check_in(coordinate)
        .await
        .map_err(ApiError::from_geofence)?;

    // Persisting the attendance record belongs to the storage layer behind
    // this service; the gate's verdict is what this endpoint owns.
    log::debug!("check-in location accepted for subject {}", identity.subject_id);

    Ok(Json(CheckInResponse {
        status: "accepted",
        subject_id: identity.subject_id,
    }))
}

#[derive(Deserialize)]
pub(crate) struct NearestZoneQuery {
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize)]
pub(crate) struct NearestZoneResponse {
    zone: AllowedZone,
    distance_meters: f64,
}

/// Diagnostics for clients: the closest zone regardless of its radius.
pub(crate) async fn nearest_zone(
    State(state): State<AppState>,
    Query(query): Query<NearestZoneQuery>,
) -> Result<Json<NearestZoneResponse>, ApiError> {
    let coordinate = Coordinate::new(query.latitude, query.longitude);

    if !coordinate.in_bounds() {
        return Err(ApiError::bad_request("coordinates are out of range"));
    }

    let nearest = state
        .geofence()
        .nearest_zone(coordinate)
        .await
        .map_err(ApiError::from_geofence)?;

    let Some((zone, distance_meters)) = nearest else {
        return Err(ApiError::not_found("no zones are configured"));
    };

    Ok(Json(NearestZoneResponse { zone, distance_meters }))
}

pub(crate) async fn list_zones(State(state): State<AppState>) -> Result<Json<Vec<AllowedZone>>, ApiError> {
    let zones = state.geofence().active_zones().await.map_err(ApiError::from_geofence)?;

    Ok(Json(zones))
}
