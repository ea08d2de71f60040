use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use clap::Parser;
use thiserror::Error;
use tower_http::{
    limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

mod auth;
mod authz;
mod config;
mod middleware;
mod observability;
mod routes;
mod store;

#[cfg(test)]
mod tests;

use auth::{AuthError, JwtValidator, TokenVerifier};
use authz::PatternCache;
use store::{KeyValueStore, StoreError};

/// Shared application state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::GatewayConfig>,
    pub store: Arc<dyn KeyValueStore>,
    /// Present exactly when authentication is enabled.
    pub verifier: Option<Arc<dyn TokenVerifier>>,
    pub patterns: Arc<PatternCache>,
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("store initialization failed: {0}")]
    Store(#[from] StoreError),

    #[error("authentication initialization failed: {0}")]
    Auth(#[from] AuthError),
}

impl AppState {
    /// Build state from config: connect the store and, when authentication
    /// is enabled, resolve the signing key set. Both fail fast here rather
    /// than on the first request.
    pub async fn new(config: config::GatewayConfig) -> Result<Self, StateError> {
        let store = store::from_config(&config.store).await?;

        let verifier: Option<Arc<dyn TokenVerifier>> = match &config.auth {
            config::AuthConfig::None => None,
            config::AuthConfig::Jwt(jwt) => {
                let validator =
                    JwtValidator::discover(jwt.clone(), reqwest::Client::new()).await?;
                Some(Arc::new(validator))
            }
        };

        Ok(Self {
            config: Arc::new(config),
            store,
            verifier,
            patterns: Arc::new(PatternCache::new()),
        })
    }
}

/// Assemble the router: health endpoint, key-value routes behind the
/// authorization pipeline, and the transport layers.
pub fn build_app(config: &config::GatewayConfig, state: AppState) -> Router {
    let mut kv = Router::new().route(
        "/{key}",
        get(routes::keyvalue::get_value).post(routes::keyvalue::set_value),
    );

    // Layers are applied in reverse order: the last route_layer added runs
    // first, so requests flow auth -> key resolution -> permission check.
    if config.auth.is_enabled() {
        kv = kv.route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::permission_middleware,
        ));
    }
    kv = kv.route_layer(axum::middleware::from_fn(
        middleware::resolve_key_middleware,
    ));
    if config.auth.is_enabled() {
        kv = kv.route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));
    }

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest(&config.server.base_path, kv)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_millis(
            config.server.timeout_ms,
        )))
        .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
        .with_state(state)
}

#[derive(Parser)]
#[command(name = "kave", version, about = "Authorization-gated key-value gateway")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short = 'c', long = "config", default_value = "kave.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    run_server(&args.config).await;
}

async fn run_server(config_path: &std::path::Path) {
    let config = match config::GatewayConfig::from_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!(
                "Failed to load config from {}: {}",
                config_path.display(),
                e
            );
            std::process::exit(1);
        }
    };

    observability::init_tracing(&config.logging);

    tracing::info!(
        config_file = %config_path.display(),
        "Starting kave gateway"
    );

    if !config.auth.is_enabled() {
        tracing::warn!(
            "Authentication is disabled — every request is allowed and permission \
             checks are skipped. Configure [auth] for production deployments."
        );
    }

    let state = AppState::new(config.clone())
        .await
        .expect("Failed to initialize application state");

    let app = build_app(&config, state);

    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!(
        address = %bind_addr,
        base_path = %config.server.base_path,
        "Listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
