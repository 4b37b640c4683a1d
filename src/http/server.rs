//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, CORS, security headers, audit, limits)
//! - Serve static ROM files and the front-end bundle
//! - Bind server to listener with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{any, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::LauncherConfig;
use crate::http::request::{make_request_span, MakeRequestUuid};
use crate::http::{assets, audit, handlers};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::roms::RomLibrary;
use crate::security::cors::cors_layer;
use crate::security::headers::apply_security_headers;
use crate::security::{rate_limit_middleware, RateLimiter};
use crate::store::{EventLog, EventStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<LauncherConfig>,
    pub library: Arc<RomLibrary>,
    pub events: EventLog,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: LauncherConfig, store: Arc<dyn EventStore>) -> Self {
        let library = Arc::new(RomLibrary::new(config.paths.roms_dir.clone()));
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        Self {
            config: Arc::new(config),
            library,
            events: EventLog::new(store),
            limiter,
        }
    }
}

/// HTTP server for the launcher.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let mut limited = Router::new()
        .route("/api/roms", get(handlers::list_roms))
        .route("/api/rom-play", post(handlers::log_play))
        .route("/api/rom-stats", get(handlers::rom_stats));
    if config.rate_limit.enabled {
        limited = limited.route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.limiter),
            rate_limit_middleware,
        ));
    }

    let router = Router::new()
        .route("/api/health", get(handlers::health))
        .merge(limited)
        .route("/api", any(handlers::api_not_found))
        .route("/api/", any(handlers::api_not_found))
        .route("/api/{*path}", any(handlers::api_not_found))
        .nest_service("/roms", assets::rom_files(&config.paths.roms_dir))
        .fallback_service(assets::front_end(&config.paths.public_dir))
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(DefaultBodyLimit::max(config.security.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            audit::audit_middleware,
        ))
        .with_state(state);

    let router = if config.security.security_headers {
        apply_security_headers(router)
    } else {
        router
    };

    router
        .layer(cors_layer(&config.security.cors_origins))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
