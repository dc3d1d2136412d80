//! Serve command - runs the devqueue web server.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tokio::{
    signal::unix::{SignalKind, signal},
    sync::mpsc,
};
use tracing_subscriber::{EnvFilter, filter::Directive};

use devqueue::{Hub, HubStats, protocol::Frame};

use crate::cli::ServeArgs;

/// Shared application state
#[derive(Clone)]
struct AppState {
    hub: Arc<Hub>,
    index_page: Arc<str>,
}

/// Run the devqueue server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let directive: Directive = "devqueue=info".parse()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .init();

    let index_page: Arc<str> = match &args.index_file {
        Some(path) => {
            tracing::info!("Serving client page from {}", path.display());
            tokio::fs::read_to_string(path).await?.into()
        }
        None => crate::templates::index_page().into(),
    };

    let app_state = AppState {
        hub: Arc::new(Hub::new()),
        index_page,
    };

    // Build router
    let app = Router::new()
        .route("/", get(handle_index))
        .route("/ws", get(handle_ws_upgrade))
        .route("/health", get(handle_health_endpoint))
        .route("/stats", get(handle_stats_request))
        .route("/api/state", get(handle_state_request))
        .with_state(app_state);

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    // Print startup message
    println!("devqueue server listening on http://localhost:{}", local_addr.port());
    println!();
    println!("Available endpoints:");
    println!("  GET  /           - Web client");
    println!("  GET  /ws         - WebSocket reservation protocol");
    println!("  GET  /api/state  - Current users and devices as JSON");
    println!("  GET  /health     - Health check");
    println!("  GET  /stats      - Server statistics");
    println!();
    println!("Press Ctrl+C to shutdown");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    println!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to set up SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
        _ = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

// ============================================================================
// Client Handlers
// ============================================================================

/// Handler for GET / - Web client
async fn handle_index(State(state): State<AppState>) -> Html<String> {
    Html(state.index_page.to_string())
}

/// Handler for GET /ws - Upgrade to a synchronized session
async fn handle_ws_upgrade(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_session(state.hub, socket, addr))
}

/// Pump one WebSocket: frames from the hub go out, client envelopes go to the hub.
///
/// Outbound frames are queued on an unbounded channel by the hub and written here,
/// so a slow socket only delays itself.
async fn run_session(hub: Arc<Hub>, mut socket: WebSocket, addr: SocketAddr) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();
    let session_id = match hub.attach(Arc::new(tx)).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(%addr, "Failed to attach session: {e}");
            return;
        }
    };
    tracing::info!(session = %session_id, %addr, "Client connected");

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(frame) = outbound else { break };
                if let Err(e) = socket.send(Message::Text(frame.as_ref().into())).await {
                    tracing::debug!(session = %session_id, "Send failed: {e}");
                    break;
                }
            }
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    // Undecodable messages are logged by the hub and otherwise ignored
                    let _ = hub.handle_message(text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(session = %session_id, "Receive failed: {e}");
                    break;
                }
            },
        }
    }

    hub.detach(&session_id).await;
    tracing::info!(session = %session_id, %addr, "Client disconnected");
}

// ============================================================================
// Health, Stats and State Handlers
// ============================================================================

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    stats: HubStats,
}

/// Handler for GET /health - Health check endpoint
async fn handle_health_endpoint(State(state): State<AppState>) -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy",
        stats: state.hub.stats().await,
    })
}

/// Handler for GET /stats - Statistics page
async fn handle_stats_request(State(state): State<AppState>) -> Html<String> {
    Html(crate::templates::stats_page(&state.hub.stats().await))
}

/// Handler for GET /api/state - Current snapshot, without notification
async fn handle_state_request(State(state): State<AppState>) -> Response {
    match state.hub.current_frame().await {
        Ok(frame) => (
            [(header::CONTENT_TYPE, "application/json")],
            frame.to_string(),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode state: {e}"),
        )
            .into_response(),
    }
}
