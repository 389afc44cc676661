pub mod config;
pub mod extract;
pub mod features;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod patients;
pub mod server;

pub use config::{AppConfig, AuthSettings, FeatureBackend, FeatureSettings, ServerConfig};
pub use features::FeatureServices;
pub use observability::init_tracing;
pub use server::{AppState, EhrliteServer, ServerBuilder, build_app, build_app_with_state};
