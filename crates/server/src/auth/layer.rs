use std::{
    fmt::Display,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::body::Body;
use chrono::Utc;
use context::RequestIdentity;
use credentials::CredentialManager;
use http::{HeaderValue, Request, Response, StatusCode, header, request::Parts};
use serde::Serialize;
use tower::Layer;

use super::AuthResult;
use super::error::AuthError;

/// Validates bearer tokens and attaches the caller's identity to the
/// request as a typed [`RequestIdentity`] extension. Everything downstream
/// (handlers, role checks, audit writers) reads identity from there.
#[derive(Clone)]
pub(crate) struct AuthLayer {
    credentials: Arc<CredentialManager>,
}

impl AuthLayer {
    pub(crate) fn new(credentials: Arc<CredentialManager>) -> Self {
        Self { credentials }
    }

    fn authenticate(&self, parts: &Parts) -> AuthResult<RequestIdentity> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingHeader)?;

        let header = header.to_str().map_err(|_| AuthError::MalformedHeader)?;
        let token = header.strip_prefix("Bearer ").ok_or(AuthError::MalformedHeader)?;

        let claims = self.credentials.validate(token.trim(), Utc::now())?;

        Ok(RequestIdentity::from(&claims))
    }
}

impl<Service> Layer<Service> for AuthLayer
where
    Service: Send + Clone,
{
    type Service = AuthService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        AuthService {
            next,
            layer: self.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct AuthService<Service> {
    next: Service,
    layer: AuthLayer,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for AuthService<Service>
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
            let (mut parts, body) = req.into_parts();

            match layer.authenticate(&parts) {
                Ok(identity) => {
                    parts.extensions.insert(identity);
                    next.call(Request::from_parts(parts, body)).await
                }
                Err(error) => {
                    log::debug!("rejecting unauthenticated request: {error}");
                    Ok(error_response(StatusCode::UNAUTHORIZED, &error.to_string(), true))
                }
            }
        })
    }
}

/// Role gate stacked after authentication. A valid identity with the wrong
/// role is "forbidden"; a request the auth layer never touched is still
/// "unauthenticated".
#[derive(Clone)]
pub(crate) struct RequireRoleLayer {
    required_roles: Arc<[&'static str]>,
}

impl RequireRoleLayer {
    pub(crate) fn new(required_roles: &[&'static str]) -> Self {
        Self {
            required_roles: required_roles.into(),
        }
    }
}

impl<Service> Layer<Service> for RequireRoleLayer
where
    Service: Send + Clone,
{
    type Service = RequireRoleService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        RequireRoleService {
            next,
            required_roles: self.required_roles.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct RequireRoleService<Service> {
    next: Service,
    required_roles: Arc<[&'static str]>,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for RequireRoleService<Service>
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
        let required_roles = self.required_roles.clone();

        Box::pin(async move {
            match req.extensions().get::<RequestIdentity>() {
                Some(identity) if identity.is_authorized(&required_roles) => next.call(req).await,
                Some(identity) => {
                    log::debug!(
                        "denying {} (role {}): requires one of {required_roles:?}",
                        identity.subject_id,
                        identity.role
                    );
                    Ok(error_response(StatusCode::FORBIDDEN, "access denied", false))
                }
                None => Ok(error_response(
                    StatusCode::UNAUTHORIZED,
                    "authorization header is required",
                    true,
                )),
            }
        })
    }
}

fn error_response(status: StatusCode, message: &str, challenge: bool) -> Response<Body> {
    #[derive(Serialize)]
    struct Content<'a> {
        error: &'a str,
    }

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json");

    if challenge {
        builder = builder.header(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }

    builder
        .body(Body::from(serde_json::to_vec(&Content { error: message }).unwrap()))
        .unwrap()
}
