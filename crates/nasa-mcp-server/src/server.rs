use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::HeaderName;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use nasa_mcp_catalog::CatalogClient;
use nasa_mcp_session::registry::{start_sweep_task, SessionRegistry};

use crate::config::ServerConfig;
use crate::dispatch::HandlerState;
use crate::mcp;
use crate::shutdown::ShutdownCoordinator;

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub handlers: Arc<HandlerState>,
    pub started_at: Instant,
}

/// Build the Axum router with all routes.
///
/// `/mcp` sits under the access-log layer; `/health` and `/` are added
/// after it so liveness probes stay out of the logs.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            HeaderName::from_static(mcp::SESSION_HEADER),
            HeaderName::from_static(mcp::LAST_EVENT_ID_HEADER),
        ]);

    Router::new()
        .route(
            "/mcp",
            post(mcp::post_mcp).get(mcp::get_mcp).delete(mcp::delete_mcp),
        )
        .layer(TraceLayer::new_for_http())
        .route("/health", get(health_handler))
        .route("/", get(root_handler))
        .layer(cors)
        .with_state(state)
}

/// Create and start the server. Returns a handle that keeps the
/// background tasks alive and can shut everything down.
pub async fn start(
    config: &ServerConfig,
    registry: Arc<SessionRegistry>,
    catalog: CatalogClient,
) -> Result<ServerHandle, std::io::Error> {
    let handlers = Arc::new(HandlerState::new(Arc::clone(&registry), catalog));
    let state = AppState {
        handlers,
        started_at: Instant::now(),
    };

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let local_addr = listener.local_addr()?;

    let coordinator = ShutdownCoordinator::new();
    let token = coordinator.token();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(token.cancelled_owned())
            .await
            .ok();
    });

    let sweep = start_sweep_task(
        Arc::clone(&registry),
        Duration::from_secs(config.sweep_interval_secs),
    );

    info!(port = local_addr.port(), "NASA Images MCP server started");

    Ok(ServerHandle {
        port: local_addr.port(),
        coordinator,
        registry,
        server,
        sweep,
    })
}

/// Handle returned by `start()` — keeps background tasks alive.
pub struct ServerHandle {
    pub port: u16,
    coordinator: ShutdownCoordinator,
    registry: Arc<SessionRegistry>,
    server: tokio::task::JoinHandle<()>,
    sweep: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Graceful shutdown: close every session (each in isolation), stop
    /// the sweep, then drain the HTTP task.
    pub async fn shutdown(self) {
        self.sweep.abort();
        self.registry.close_all();
        self.coordinator
            .graceful_shutdown(vec![self.server], None)
            .await;
    }
}

/// Liveness probe. Not access-logged.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(crate::health::health_check(
        state.started_at,
        state.handlers.registry.count(),
    ))
}

/// Root info endpoint describing the protocol surface.
async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": crate::dispatch::SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /mcp": "Send JSON-RPC requests",
            "GET /mcp": "SSE stream for server notifications",
            "DELETE /mcp": "Close a session",
            "GET /health": "Health check",
        },
    }))
}
