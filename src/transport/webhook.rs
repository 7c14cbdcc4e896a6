//! Inbound webhook — the gateway POSTs received messages here.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::phone;
use crate::transport::InboundMessage;

/// Broadcast-origin sender address, always discarded.
const BROADCAST_ORIGIN: &str = "status@broadcast";

/// Group-chat address suffix, always discarded.
const GROUP_SUFFIX: &str = "@g.us";

/// Application state shared across handlers.
#[derive(Clone)]
struct WebhookState {
    tx: mpsc::UnboundedSender<InboundMessage>,
}

/// Message event as posted by the gateway.
#[derive(Debug, serde::Deserialize)]
pub struct GatewayEvent {
    /// Sender chat address, e.g. `212612345678@c.us`.
    pub from: String,
    /// Message text.
    #[serde(default)]
    pub body: String,
}

/// Build the Axum router receiving gateway message events.
pub fn webhook_routes(tx: mpsc::UnboundedSender<InboundMessage>) -> Router {
    Router::new()
        .route("/webhook/message", post(receive_message))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(WebhookState { tx })
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "outreach-bot",
    }))
}

async fn receive_message(
    State(state): State<WebhookState>,
    Json(event): Json<GatewayEvent>,
) -> StatusCode {
    if is_filtered_origin(&event.from) {
        debug!(from = %event.from, "Dropping group/broadcast message");
        return StatusCode::NO_CONTENT;
    }

    let sender = phone::sender_key(&event.from).to_string();
    info!(sender = %sender, "Inbound message received");

    let msg = InboundMessage {
        sender,
        text: event.body,
        received_at: Utc::now(),
    };
    if state.tx.send(msg).is_err() {
        warn!("Inbound consumer is gone, message dropped");
    }
    StatusCode::NO_CONTENT
}

/// Group and broadcast origins never reach the reply router.
fn is_filtered_origin(from: &str) -> bool {
    from == BROADCAST_ORIGIN || from.ends_with(GROUP_SUFFIX)
}
