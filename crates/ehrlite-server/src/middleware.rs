use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use ehrlite_api::{ApiError, validate_accept, validate_content_type};
use uuid::Uuid;

use crate::config::AuthSettings;

// =============================================================================
// Authentication Middleware
// =============================================================================

/// Accepted bearer tokens, shared by every request.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    tokens: Arc<HashSet<String>>,
}

impl AuthState {
    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(settings.tokens.iter().cloned())
    }

    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        let tokens = tokens
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            tokens: Arc::new(tokens),
        }
    }

    fn accepts(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }
}

/// Authentication middleware that requires a known Bearer token.
///
/// Public endpoints (root and health probes) skip the check. A missing,
/// malformed or unknown token yields 401 with a `WWW-Authenticate: Bearer`
/// header.
pub async fn authentication_middleware(
    State(state): State<AuthState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if should_skip_authentication(&req) {
        return next.run(req).await;
    }

    let auth_header = match req.headers().get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        Some(header) => header,
        None => {
            tracing::debug!(path = %req.uri().path(), "No Authorization header");
            return ApiError::unauthorized("Authentication required").into_response();
        }
    };

    let token = match auth_header.strip_prefix("Bearer ") {
        Some(t) if !t.is_empty() => t,
        _ => {
            return ApiError::unauthorized("Invalid Authorization header format").into_response();
        }
    };

    if !state.accepts(token) {
        tracing::debug!(path = %req.uri().path(), "Unknown bearer token");
        return ApiError::unauthorized("Invalid or expired token").into_response();
    }

    next.run(req).await
}

fn should_skip_authentication(req: &Request<Body>) -> bool {
    if req.method() == Method::OPTIONS {
        return true;
    }
    let public_paths = ["/", "/healthz", "/readyz", "/health", "/favicon.ico"];
    public_paths.contains(&req.uri().path())
}

// =============================================================================
// Request ID
// =============================================================================

pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static("x-request-id");

    // If the incoming request already has a request-id, preserve it; otherwise generate one
    let req_id_value = req
        .headers()
        .get(&header_name)
        .cloned()
        .or_else(|| HeaderValue::from_str(&Uuid::new_v4().to_string()).ok())
        .unwrap_or_else(|| HeaderValue::from_static("unknown"));

    // Add to request extensions for downstream usage (e.g., logging)
    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(header_name, req_id_value);
    res
}

// =============================================================================
// Content Negotiation
// =============================================================================

// Accept JSON responses only, and require JSON bodies for POST/PUT.
pub async fn content_negotiation(req: Request<Body>, next: Next) -> Response {
    if let Err(err) = validate_accept(req.headers()) {
        return err.into_response();
    }

    if matches!(*req.method(), Method::POST | Method::PUT) {
        if let Err(err) = validate_content_type(req.headers()) {
            return err.into_response();
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    fn app(state: AuthState) -> Router {
        Router::new()
            .route("/", get(|| async { "root" }))
            .route("/patients", get(|| async { "patients" }))
            .layer(middleware::from_fn_with_state(
                state,
                authentication_middleware,
            ))
            .layer(middleware::from_fn(request_id))
    }

    fn request(path: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn public_paths_skip_authentication() {
        let resp = app(AuthState::new(["secret".to_string()]))
            .oneshot(request("/", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_or_unknown_token_is_unauthorized() {
        let state = AuthState::new(["secret".to_string()]);

        let resp = app(state.clone())
            .oneshot(request("/patients", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = app(state)
            .oneshot(request("/patients", Some("guess")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key("www-authenticate"));
    }

    #[tokio::test]
    async fn known_token_passes() {
        let resp = app(AuthState::new(["secret".to_string()]))
            .oneshot(request("/patients", Some("secret")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn request_id_is_generated_or_propagated() {
        let state = AuthState::new(["secret".to_string()]);
        let resp = app(state.clone()).oneshot(request("/", None)).await.unwrap();
        let generated = resp.headers().get("x-request-id").unwrap().to_str().unwrap();
        assert!(Uuid::parse_str(generated).is_ok());

        let req = Request::builder()
            .uri("/")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let resp = app(state).oneshot(req).await.unwrap();
        assert_eq!(resp.headers().get("x-request-id").unwrap(), "abc-123");
    }

    #[test]
    fn blank_tokens_are_ignored() {
        let state = AuthState::new(["  ".to_string(), "ok".to_string()]);
        assert!(state.accepts("ok"));
        assert!(!state.accepts(""));
    }
}
