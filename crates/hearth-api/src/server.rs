//! Router assembly and the serving loop.

use std::net::SocketAddr;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::handlers;
use crate::state::{ChatState, ToolsState};

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn tools_routes() -> Router<ToolsState> {
    Router::new()
        .route("/api/tools", get(handlers::list_tools))
        .route("/api/tools/execute", post(handlers::execute_tool))
}

fn chat_routes() -> Router<ChatState> {
    Router::new()
        .route("/api/chat", post(handlers::chat))
        .route("/api/feedback", post(handlers::submit_feedback))
        .route(
            "/api/interactions/:session_id",
            get(handlers::list_interactions),
        )
}

/// Standalone tools service.
pub fn tools_router(state: ToolsState) -> Router {
    tools_routes()
        .route("/health", get(handlers::tools_health))
        .layer(cors())
        .with_state(state)
}

/// Standalone chat service.
pub fn chat_router(state: ChatState) -> Router {
    chat_routes()
        .route("/health", get(handlers::chat_health))
        .layer(cors())
        .with_state(state)
}

/// Both services behind one port. Health reflects the chat side, which is
/// the surface users talk to.
pub fn combined_router(tools: ToolsState, chat: ChatState) -> Router {
    let tools_half = tools_routes().with_state(tools);
    let chat_half = chat_routes()
        .route("/health", get(handlers::chat_health))
        .with_state(chat);
    tools_half.merge(chat_half).layer(cors())
}

/// Serve `app` until Ctrl+C or SIGTERM.
pub async fn run(addr: SocketAddr, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
