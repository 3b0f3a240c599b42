//! HTTP seam around the admission core: rate limiting and authentication
//! middleware, the check-in endpoints, and the serve loop.

mod auth;
mod directory;
mod error;
mod handlers;
pub mod logger;
mod rate_limit;

use std::{net::SocketAddr, sync::Arc};

use ::rate_limit::{RateLimitManager, Scope};
use axum::{
    Router,
    routing::{get, post},
};
use axum_server::tls_rustls::RustlsConfig;
use config::Config;
use credentials::CredentialManager;
use geofence::{AllowedZone, GeofenceService, StaticZoneStore};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use auth::{AuthLayer, RequireRoleLayer};
use self::rate_limit::RateLimitLayer;

pub use directory::{DirectoryError, StaticUserDirectory, UserDirectory, UserRecord};
pub use error::Error;

pub(crate) type Result<T> = std::result::Result<T, Error>;

pub struct ServeConfig {
    pub listen_address: SocketAddr,
    pub config: Config,
}

/// Everything the routes need, behind one cheap clone.
#[derive(Clone)]
pub(crate) struct AppState(Arc<AppStateInner>);

struct AppStateInner {
    credentials: Arc<CredentialManager>,
    geofence: GeofenceService,
    rate_limits: Arc<RateLimitManager>,
    directory: Arc<dyn UserDirectory>,
}

impl AppState {
    fn from_config(config: &Config) -> Self {
        let zones = config
            .geofence
            .zones
            .iter()
            .map(|zone| AllowedZone {
                id: zone.id.clone().unwrap_or_else(|| zone.name.clone()),
                name: zone.name.clone(),
                latitude: zone.latitude,
                longitude: zone.longitude,
                radius_meters: zone.radius_meters.unwrap_or(config.geofence.default_radius_meters),
                active: zone.active,
            })
            .collect();

        Self::from_parts(
            Arc::new(CredentialManager::new(
                &config.auth.secret,
                config.auth.access_token_ttl,
                config.auth.refresh_token_ttl,
            )),
            GeofenceService::new(config.geofence.enabled, Arc::new(StaticZoneStore::new(zones))),
            Arc::new(RateLimitManager::new(config.rate_limit.clone())),
            Arc::new(StaticUserDirectory::new(config.auth.users.clone())),
        )
    }

    fn from_parts(
        credentials: Arc<CredentialManager>,
        geofence: GeofenceService,
        rate_limits: Arc<RateLimitManager>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self(Arc::new(AppStateInner {
            credentials,
            geofence,
            rate_limits,
            directory,
        }))
    }

    pub(crate) fn credentials(&self) -> &Arc<CredentialManager> {
        &self.0.credentials
    }

    pub(crate) fn geofence(&self) -> &GeofenceService {
        &self.0.geofence
    }

    pub(crate) fn rate_limits(&self) -> &Arc<RateLimitManager> {
        &self.0.rate_limits
    }

    pub(crate) fn directory(&self) -> &dyn UserDirectory {
        self.0.directory.as_ref()
    }
}

pub async fn serve(ServeConfig { listen_address, config }: ServeConfig) -> crate::Result<()> {
    let state = AppState::from_config(&config);

    // Sweepers run for the lifetime of the server and are cancelled on the
    // way out.
    state.rate_limits().start();

    let app = router(state.clone(), &config);

    let listener = TcpListener::bind(listen_address).await.map_err(Error::Bind)?;

    match &config.server.tls {
        Some(tls) => {
            let rustls_config = RustlsConfig::from_pem_file(&tls.certificate, &tls.key)
                .await
                .map_err(|e| Error::Tls(e.to_string()))?;

            log::info!("listening on https://{listen_address}");

            let std_listener = listener.into_std().map_err(Error::Bind)?;

            axum_server::from_tcp_rustls(std_listener, rustls_config)
                .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .map_err(|e| Error::Server(std::io::Error::other(e)))?;
        }
        None => {
            log::info!("listening on http://{listen_address}");

            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .with_graceful_shutdown(shutdown_signal())
                .await
                .map_err(Error::Server)?;
        }
    }

    state.rate_limits().shutdown().await;

    Ok(())
}

fn router(state: AppState, config: &Config) -> Router {
    let auth = AuthLayer::new(Arc::clone(state.credentials()));

    let global_limiter = RateLimitLayer::new(
        Scope::Global,
        config.server.client_ip.clone(),
        Arc::clone(state.rate_limits()),
    );

    let login_limiter = RateLimitLayer::new(
        Scope::Login,
        config.server.client_ip.clone(),
        Arc::clone(state.rate_limits()),
    );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/login", post(handlers::login).layer(login_limiter))
        .route("/api/presence/check-in", post(handlers::check_in).layer(auth.clone()))
        .route(
            "/api/presence/nearest-zone",
            get(handlers::nearest_zone).layer(auth.clone()),
        )
        .route(
            "/api/zones",
            get(handlers::list_zones)
                .layer::<RequireRoleLayer, std::convert::Infallible>(RequireRoleLayer::new(&["admin"]))
                .layer(auth),
        )
        .layer(CorsLayer::permissive())
        .layer(global_limiter)
        .with_state(state)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install the shutdown signal handler");

    log::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use chrono::Utc;
    use config::{LimiterConfig, StaticUserConfig, ZoneConfig};
    use geofence::{ZoneStore, ZoneStoreError};
    use http::{Request, Response, StatusCode};
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use tower::ServiceExt;

    use super::*;

    // SHA-256 of the string "password".
    const PASSWORD_DIGEST: &str = "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8";

    fn test_config() -> Config {
        let mut config = Config::default();

        config.server.client_ip.x_real_ip = true;

        config.auth.secret = SecretString::from("a-test-only-signing-secret");
        config.auth.users = vec![
            StaticUserConfig {
                id: "u-admin".to_owned(),
                email: "admin@example.com".to_owned(),
                password_sha256: PASSWORD_DIGEST.to_owned(),
                role: "admin".to_owned(),
            },
            StaticUserConfig {
                id: "u-emp".to_owned(),
                email: "employee@example.com".to_owned(),
                password_sha256: PASSWORD_DIGEST.to_owned(),
                role: "employee".to_owned(),
            },
        ];

        config.rate_limit.login = LimiterConfig {
            refill_per_second: 0.01,
            burst: 2,
            ..LimiterConfig::login()
        };

        config.geofence.enabled = true;
        config.geofence.zones = vec![ZoneConfig {
            id: Some("hq".to_owned()),
            name: "Head Office".to_owned(),
            latitude: -6.2088,
            longitude: 106.8456,
            radius_meters: Some(100.0),
            active: true,
        }];

        config
    }

    fn app() -> (Router, AppState) {
        let config = test_config();
        let state = AppState::from_config(&config);

        (router(state.clone(), &config), state)
    }

    async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn login_request(email: &str, password: &str, ip: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header("content-type", "application/json")
            .header("x-real-ip", ip)
            .body(Body::from(
                serde_json::json!({ "email": email, "password": password }).to_string(),
            ))
            .unwrap()
    }

    fn check_in_request(token: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/presence/check-in")
            .header("content-type", "application/json")
            .header("x-real-ip", "10.0.0.9")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn access_token(state: &AppState, subject: &str, role: &str) -> String {
        state
            .credentials()
            .issue_access_token(subject, &format!("{subject}@example.com"), role, Utc::now())
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_open() {
        let (app, _) = app();

        let request = Request::builder()
            .uri("/health")
            .header("x-real-ip", "10.0.0.1")
            .body(Body::empty())
            .unwrap();

        let response = send(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_issues_tokens_that_authenticate() {
        let (app, _) = app();

        let response = send(&app, login_request("admin@example.com", "password", "10.0.0.2")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["token_type"], "Bearer");

        let token = body["access_token"].as_str().unwrap().to_owned();

        let response = send(
            &app,
            check_in_request(&token, serde_json::json!({ "latitude": -6.2088, "longitude": 106.8456 })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let (app, _) = app();

        let response = send(&app, login_request("admin@example.com", "hunter2", "10.0.0.3")).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "invalid email or password");
    }

    #[tokio::test]
    async fn login_is_rate_limited_after_burst() {
        let (app, _) = app();

        for _ in 0..2 {
            let response = send(&app, login_request("admin@example.com", "hunter2", "10.0.0.4")).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        let response = send(&app, login_request("admin@example.com", "hunter2", "10.0.0.4")).await;

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));

        // A different client key still has its own budget.
        let response = send(&app, login_request("admin@example.com", "hunter2", "10.0.0.5")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_token_is_unauthenticated() {
        let (app, _) = app();

        let request = Request::builder()
            .method("POST")
            .uri("/api/presence/check-in")
            .header("content-type", "application/json")
            .header("x-real-ip", "10.0.0.6")
            .body(Body::from("{}"))
            .unwrap();

        let response = send(&app, request).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("www-authenticate"));
    }

    #[tokio::test]
    async fn expired_token_gets_a_distinct_message() {
        let (app, state) = app();

        let expired = state
            .credentials()
            .issue_access_token("u-emp", "employee@example.com", "employee", Utc::now() - chrono::Duration::days(2))
            .unwrap();

        let response = send(&app, check_in_request(&expired, serde_json::json!({}))).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "token has expired");
    }

    #[tokio::test]
    async fn tampered_token_is_invalid() {
        let (app, state) = app();

        let mut token = access_token(&state, "u-emp", "employee");
        token.push('x');

        let response = send(&app, check_in_request(&token, serde_json::json!({}))).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "token is not valid");
    }

    #[tokio::test]
    async fn employee_cannot_list_zones() {
        let (app, state) = app();
        let token = access_token(&state, "u-emp", "employee");

        let request = Request::builder()
            .uri("/api/zones")
            .header("x-real-ip", "10.0.0.7")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let response = send(&app, request).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_lists_zones() {
        let (app, state) = app();
        let token = access_token(&state, "u-admin", "admin");

        let request = Request::builder()
            .uri("/api/zones")
            .header("x-real-ip", "10.0.0.8")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let response = send(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body[0]["id"], "hq");
    }

    #[tokio::test]
    async fn check_in_outside_all_zones_is_forbidden() {
        let (app, state) = app();
        let token = access_token(&state, "u-emp", "employee");

        let response = send(
            &app,
            check_in_request(&token, serde_json::json!({ "latitude": -6.3, "longitude": 106.9 })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await["error"],
            "check-in location is outside the allowed area"
        );
    }

    #[tokio::test]
    async fn check_in_without_coordinates_is_accepted() {
        let (app, state) = app();
        let token = access_token(&state, "u-emp", "employee");

        let response = send(&app, check_in_request(&token, serde_json::json!({}))).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "accepted");
    }

    #[tokio::test]
    async fn check_in_with_out_of_range_coordinates_is_bad_request() {
        let (app, state) = app();
        let token = access_token(&state, "u-emp", "employee");

        let response = send(
            &app,
            check_in_request(&token, serde_json::json!({ "latitude": 91.0, "longitude": 0.0 })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn nearest_zone_reports_distance() {
        let (app, state) = app();
        let token = access_token(&state, "u-emp", "employee");

        let request = Request::builder()
            .uri("/api/presence/nearest-zone?latitude=-6.2088&longitude=106.8456")
            .header("x-real-ip", "10.0.0.10")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let response = send(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["zone"]["id"], "hq");
        assert_eq!(body["distance_meters"], 0.0);
    }

    struct BrokenZoneStore;

    #[async_trait::async_trait]
    impl ZoneStore for BrokenZoneStore {
        async fn active_zones(&self) -> std::result::Result<Vec<AllowedZone>, ZoneStoreError> {
            Err(ZoneStoreError::new("connection refused"))
        }
    }

    #[tokio::test]
    async fn zone_store_outage_is_a_server_side_failure() {
        let config = test_config();

        let state = AppState::from_parts(
            Arc::new(CredentialManager::new(
                &config.auth.secret,
                config.auth.access_token_ttl,
                config.auth.refresh_token_ttl,
            )),
            GeofenceService::new(true, Arc::new(BrokenZoneStore)),
            Arc::new(RateLimitManager::new(config.rate_limit.clone())),
            Arc::new(StaticUserDirectory::new(config.auth.users.clone())),
        );

        let app = router(state.clone(), &config);
        let token = access_token(&state, "u-emp", "employee");

        let response = send(
            &app,
            check_in_request(&token, serde_json::json!({ "latitude": -6.2088, "longitude": 106.8456 })),
        )
        .await;

        // Neither accepted nor blamed on the caller.
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await["error"],
            "geofencing is temporarily unavailable"
        );
    }
}
