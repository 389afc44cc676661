use std::future::Future;
use std::net::SocketAddr;

use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    middleware,
    routing::{get, post},
};
use ehrlite_api::ApiError;
use ehrlite_db_memory::create_storage;
use ehrlite_storage::DynPatientStorage;
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::AppConfig,
    features::{FeatureServices, handlers as feature_handlers},
    handlers,
    middleware::{self as app_middleware, AuthState},
    patients,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: DynPatientStorage,
    pub features: FeatureServices,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            storage: create_storage(&cfg.storage),
            features: FeatureServices::from_backend(cfg.features.backend),
        }
    }
}

pub struct EhrliteServer {
    addr: SocketAddr,
    app: Router,
}

/// Builds the router with storage and features taken from `cfg`.
pub fn build_app(cfg: &AppConfig) -> Router {
    build_app_with_state(cfg, AppState::from_config(cfg))
}

pub fn build_app_with_state(cfg: &AppConfig, state: AppState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    let mut router = Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/health", get(handlers::health))
        .route("/favicon.ico", get(handlers::favicon))
        // Patient records
        .route(
            "/patients",
            get(patients::list_patients).post(patients::create_patient),
        )
        .route(
            "/patients/{id}",
            get(patients::get_patient).put(patients::update_patient),
        )
        // Feature endpoints
        .route("/image-enhancement", post(feature_handlers::enhance_image))
        .route("/clinical-notes", post(feature_handlers::clinical_notes))
        .route("/icd10-coding", post(feature_handlers::icd10_coding))
        .route(
            "/visit-documentation",
            post(feature_handlers::visit_documentation),
        )
        .route("/batch-process", post(feature_handlers::batch_process))
        .with_state(state);

    if cfg.auth.enabled {
        router = router.layer(middleware::from_fn_with_state(
            AuthState::from_settings(&cfg.auth),
            app_middleware::authentication_middleware,
        ));
    }

    // Layers added later wrap earlier ones, so request_id is outermost and the
    // trace span can read the id it stores.
    router
        .layer(middleware::from_fn(app_middleware::content_negotiation))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(cfg.request_timeout())),
        )
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    if req.uri().path() == "/favicon.ico" {
                        return tracing::span!(tracing::Level::TRACE, "noop");
                    }
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        if span.metadata().is_some_and(|meta| meta.name() != "noop") {
                            tracing::info!(
                                http.status = %res.status().as_u16(),
                                elapsed_ms = %latency.as_millis(),
                                "request handled"
                            );
                        }
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::request_timeout("Request timed out")
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        ApiError::internal("Internal server error")
    }
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    storage: Option<DynPatientStorage>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            storage: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Uses `storage` instead of building one from the storage config.
    pub fn with_storage(mut self, storage: DynPatientStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn build(self) -> EhrliteServer {
        let state = match self.storage {
            Some(storage) => AppState {
                storage,
                features: FeatureServices::from_backend(self.config.features.backend),
            },
            None => AppState::from_config(&self.config),
        };
        tracing::info!(
            storage = state.storage.backend_name(),
            features = ?state.features,
            auth = self.config.auth.enabled,
            "application state ready"
        );
        let app = build_app_with_state(&self.config, state);

        EhrliteServer {
            addr: self.addr,
            app,
        }
    }
}

impl EhrliteServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves until Ctrl-C.
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", listener.local_addr()?);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
