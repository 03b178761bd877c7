use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::hub::{Hub, HubStatus};

/// Build the HTTP router: `/ws` for viewers, `/health` for probes.
pub fn router(hub: Hub) -> Router {
    Router::new()
        .route("/ws", get(handle_websocket))
        .route("/health", get(health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(flatten)]
    pub hub: HubStatus,
}

/// Health check endpoint
pub async fn health_check(
    State(hub): State<Hub>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let status = hub.status().await.map_err(|e| {
        warn!("Health check failed: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        hub: status,
    }))
}

/// Handle WebSocket upgrade
pub async fn handle_websocket(ws: WebSocketUpgrade, State(hub): State<Hub>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, hub))
}

/// Bridge one viewer connection to the hub.
///
/// Outbound: every update the hub delivers becomes one text frame.
/// Inbound: any data frame is a manual label; a close frame ends the session.
async fn handle_socket(socket: WebSocket, hub: Hub) {
    let viewer = match hub.subscribe().await {
        Ok(viewer) => viewer,
        Err(e) => {
            warn!("Refusing viewer: {}", e);
            return;
        }
    };
    let id = viewer.id;
    let mut updates = viewer.updates;
    let (mut sender, mut receiver) = socket.split();

    info!("Viewer {} connected", id);

    let mut outbound = tokio::spawn(async move {
        while let Some(payload) = updates.recv().await {
            if let Err(e) = sender.send(Message::Text(payload.to_string().into())).await {
                // The peer is already gone; the inbound side reports why.
                debug!("Viewer {} send failed: {}", id, e);
                return;
            }
        }
        // The hub dropped this viewer.
        let _ = sender.send(Message::Close(None)).await;
    });

    let label_hub = hub.clone();
    let mut inbound = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_)) | Ok(Message::Binary(_)) => {
                    if let Err(e) = label_hub.label().await {
                        error!("Viewer {} label dropped: {}", id, e);
                        return;
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("Viewer {} closed the connection", id);
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Viewer {} WebSocket error: {}", id, e);
                    return;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut outbound => inbound.abort(),
        _ = &mut inbound => outbound.abort(),
    }

    if let Err(e) = hub.unsubscribe(id).await {
        debug!("Viewer {} unsubscribe skipped: {}", id, e);
    }
    info!("Viewer {} disconnected", id);
}
