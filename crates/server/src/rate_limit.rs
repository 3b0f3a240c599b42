//! Rate limiting middleware for HTTP requests.

use std::{
    fmt::Display,
    future::Future,
    net::{IpAddr, SocketAddr},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{body::Body, extract::ConnectInfo};
use config::ClientIpConfig;
use http::{Request, Response, StatusCode, header};
use rate_limit::{RateLimitManager, Scope};
use serde::Serialize;
use tower::Layer;

/// Admission gate in front of a route. One instance with [`Scope::Global`]
/// wraps the whole router; a second with [`Scope::Login`] additionally wraps
/// the login route.
#[derive(Clone)]
pub(crate) struct RateLimitLayer {
    scope: Scope,
    client_ip: ClientIpConfig,
    manager: Arc<RateLimitManager>,
}

impl RateLimitLayer {
    pub(crate) fn new(scope: Scope, client_ip: ClientIpConfig, manager: Arc<RateLimitManager>) -> Self {
        Self {
            scope,
            client_ip,
            manager,
        }
    }
}

impl<Service> Layer<Service> for RateLimitLayer
where
    Service: Send + Clone,
{
    type Service = RateLimitService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        RateLimitService {
            next,
            layer: self.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct RateLimitService<Service> {
    next: Service,
    layer: RateLimitLayer,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for RateLimitService<Service>
where
    Service: tower::Service<Request<ReqBody>, Response = Response<Body>> + Send + Clone + 'static,
    Service::Future: Send,
    Service::Error: Display + 'static,
    ReqBody: http_body::Body + Send + 'static,
{
    type Response = http::Response<Body>;
    type Error = Service::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut next = self.next.clone();
        let layer = self.layer.clone();

        Box::pin(async move {
            let key = extract_client_key(&layer.client_ip, &req);

            if layer.manager.admit(layer.scope, &key) {
                return next.call(req).await;
            }

            // Rejection is terminal for this request; the hint tells the
            // client when one token will have accrued.
            let retry_after = layer.manager.retry_after(layer.scope);

            #[derive(Serialize)]
            struct Content {
                error: &'static str,
            }

            let response = Response::builder()
                .status(StatusCode::TOO_MANY_REQUESTS)
                .header(header::RETRY_AFTER, retry_after.as_secs().to_string())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&Content {
                        error: "too many requests",
                    })
                    .unwrap(),
                ))
                .unwrap();

            Ok(response)
        })
    }
}

/// Derives the rate limit key for a request.
///
/// Forwarding headers are client-supplied unless a trusted proxy overwrites
/// them; a spoofable key is an accepted trust boundary here, matching the
/// `client_ip` configuration the deployment chose.
fn extract_client_key<B>(config: &ClientIpConfig, req: &Request<B>) -> String {
    if config.x_real_ip
        && let Some(ip) = req
            .headers()
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return ip.to_string();
    }

    if let Some(hops) = config.x_forwarded_for_trusted_hops
        && let Some(ip) = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').rev().nth(hops))
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return ip.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .expect("axum always provides the client SocketAddr when served with connect info")
}
