//! WhatsApp HTTP gateway client.

use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::config::Config;
use crate::error::TransportError;
use crate::transport::{InboundMessage, InboundStream, Transport};

/// Gateway status response.
#[derive(Debug, serde::Deserialize)]
struct GatewayStatus {
    connected: bool,
}

/// Transport over a self-hosted WhatsApp HTTP gateway.
///
/// Outbound sends are POSTs to the gateway; inbound messages arrive via
/// the webhook router (see [`super::webhook`]), which pushes into the
/// channel this transport hands out as its inbound stream.
pub struct GatewayTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
    inbound_tx: mpsc::UnboundedSender<InboundMessage>,
    inbound_rx: Mutex<Option<mpsc::UnboundedReceiver<InboundMessage>>>,
}

impl GatewayTransport {
    pub fn new(config: &Config) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client: reqwest::Client::new(),
            base_url: config.gateway_url.trim_end_matches('/').to_string(),
            token: config.gateway_token.clone(),
            inbound_tx: tx,
            inbound_rx: Mutex::new(Some(rx)),
        }
    }

    /// Sender side of the inbound channel, for wiring into the webhook.
    pub fn inbound_sender(&self) -> mpsc::UnboundedSender<InboundMessage> {
        self.inbound_tx.clone()
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }
}

#[async_trait]
impl Transport for GatewayTransport {
    fn name(&self) -> &str {
        "whatsapp-gateway"
    }

    async fn initialize(&self) -> Result<(), TransportError> {
        let resp = self
            .authed(self.client.get(self.api_url("status")))
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(TransportError::NotConnected {
                reason: format!("status endpoint returned {}", resp.status()),
            });
        }

        let status: GatewayStatus = resp
            .json()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !status.connected {
            return Err(TransportError::NotConnected {
                reason: "gateway session is not paired".into(),
            });
        }

        tracing::info!(gateway = %self.base_url, "Gateway connected");
        Ok(())
    }

    async fn send(&self, address: &str, text: &str) -> Result<(), TransportError> {
        let body = serde_json::json!({
            "chat_id": address,
            "text": text,
        });

        let resp = self
            .authed(self.client.post(self.api_url("send")))
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::SendFailed {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(TransportError::SendFailed {
                address: address.to_string(),
                reason: format!("gateway returned {status}: {err}"),
            });
        }

        tracing::debug!(address, "Message sent");
        Ok(())
    }

    async fn inbound(&self) -> Result<InboundStream, TransportError> {
        let rx = self
            .inbound_rx
            .lock()
            .expect("inbound receiver lock poisoned")
            .take()
            .ok_or(TransportError::InboundTaken)?;
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}
