//! Messaging transport collaborator.
//!
//! The WhatsApp session itself (pairing, socket) lives in an external
//! HTTP gateway; this module covers the send/status client and the
//! inbound webhook the gateway posts messages to.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::error::TransportError;

pub mod gateway;
pub mod webhook;

pub use gateway::GatewayTransport;

/// An inbound message, sender already reduced to the digits-only key.
///
/// Group-origin and broadcast-origin messages are filtered by the
/// webhook before they ever reach a consumer of this type.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

/// Single-use stream of inbound messages.
pub type InboundStream = Pin<Box<dyn Stream<Item = InboundMessage> + Send>>;

/// Messaging platform transport.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    /// Readiness/auth check. Failure is fatal at startup.
    async fn initialize(&self) -> Result<(), TransportError>;

    /// Send a text to a chat address. Per-send failures are recoverable.
    async fn send(&self, address: &str, text: &str) -> Result<(), TransportError>;

    /// Take the inbound message stream. May only be called once.
    async fn inbound(&self) -> Result<InboundStream, TransportError>;
}
