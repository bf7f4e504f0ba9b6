//! Axum server setup.
//!
//! - CORS restricted to the configured origins (empty or `*` allows any)
//! - HTTP tracing
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use pd_core::config::{AppConfig, MiddlewareConfig, PaginationConfig};
use pd_core::error::{PdError, PdResult};
use pd_models::Database;
use pd_services::Services;

use crate::middleware::{self, access_window::AccessWindow, throttle::RateLimiter};
use crate::routes;

/// Shared application state.
pub struct AppState {
    pub services: Services,
    pub pagination: PaginationConfig,
    pub middleware: MiddlewareConfig,
    /// `None` when the window is not enforced.
    pub access_window: Option<AccessWindow>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(services: Services, config: &AppConfig) -> PdResult<Self> {
        Ok(Self {
            services,
            pagination: config.pagination.clone(),
            middleware: config.middleware.clone(),
            access_window: AccessWindow::from_config(&config.middleware)?,
            rate_limiter: RateLimiter::from_config(&config.middleware),
        })
    }

    /// Open the configured messaging database and build the state over it.
    pub fn open(config: &AppConfig) -> PdResult<Self> {
        let database = Database::init(&config.effective_db_path()?, &config.database)?;
        Self::new(Services::new(database, config), config)
    }
}

/// Build the full application: routes, middleware chain, CORS and tracing.
pub fn build_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let api = Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::router())
        .merge(routes::users::router())
        .merge(routes::conversations::router())
        .merge(routes::messages::router())
        .merge(routes::notifications::router())
        .merge(routes::admin::router());

    middleware::apply(api, state.clone())
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        info!("CORS: all origins allowed");
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("CORS: ignoring invalid origin {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Open the messaging database and serve the API until shutdown.
pub async fn run_server(config: AppConfig) -> PdResult<()> {
    let state = Arc::new(AppState::open(&config)?);
    if state.access_window.is_none() {
        info!("access window disabled");
    }

    let app = build_router(state, &config.server.cors_origins);

    let bind_addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|_| PdError::Config(format!("invalid bind address: {}", config.server.bind)))?;
    let listener = TcpListener::bind(bind_addr).await?;
    info!("server listening on {bind_addr}");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, starting shutdown"),
        _ = terminate => info!("received SIGTERM, starting shutdown"),
    }
}
