//! Outreach engine — backlog draining, live intake, send-and-register.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{error, info, warn};

use crate::engine::registry::{ConversationEntry, ConversationRegistry};
use crate::phone;
use crate::store::{Registration, RegistrationStore, RegistrationStream};
use crate::templates::MessageTemplate;
use crate::transport::Transport;

/// Fixed delay between backlog sends. Messaging platforms throttle or ban
/// accounts that blast automated sends, so this is a deliberate cap.
const SEND_PACING: Duration = Duration::from_secs(2);

/// Outcome of a single send-and-register attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Welcome sent, conversation opened.
    Sent,
    /// Send was attempted and the transport reported failure.
    Failed,
    /// Registration has no usable phone, nothing attempted.
    NoPhone,
}

/// Drives the welcome-message side of the correlation engine.
pub struct OutreachEngine {
    store: Arc<dyn RegistrationStore>,
    transport: Arc<dyn Transport>,
    registry: Arc<ConversationRegistry>,
    pending_status: String,
    pacing: Duration,
}

impl OutreachEngine {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        transport: Arc<dyn Transport>,
        registry: Arc<ConversationRegistry>,
        pending_status: impl Into<String>,
    ) -> Self {
        Self {
            store,
            transport,
            registry,
            pending_status: pending_status.into(),
            pacing: SEND_PACING,
        }
    }

    /// Override the inter-message delay (tests only use shorter values).
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Send-and-register for one registration.
    ///
    /// Sends the welcome template and, on success, opens a conversation
    /// keyed by the normalized phone. A send failure is logged and
    /// skipped: no registry entry, no retry.
    pub async fn process_registration(&self, registration: &Registration) -> SendOutcome {
        let name = registration.display_name();

        let Some(raw_phone) = registration
            .phone
            .as_deref()
            .filter(|p| !p.trim().is_empty())
        else {
            warn!(id = %registration.id, name = %name, "Registration has no phone, skipping");
            return SendOutcome::NoPhone;
        };

        let key = phone::normalize(raw_phone);
        info!(id = %registration.id, name = %name, key = %key, "Sending welcome message");

        match self
            .transport
            .send(&phone::chat_address(&key), MessageTemplate::Welcome.text())
            .await
        {
            Ok(()) => {
                // No await between the send confirmation and this insert:
                // a reply for this phone can never find the entry missing.
                self.registry
                    .insert(key, ConversationEntry::new(&registration.id, &name));
                SendOutcome::Sent
            }
            Err(e) => {
                warn!(id = %registration.id, error = %e, "Welcome send failed, skipping");
                SendOutcome::Failed
            }
        }
    }

    /// Drain all registrations pending at startup, in collaborator order.
    ///
    /// Each attempted send (success or failure) consumes the pacing
    /// delay; a no-phone skip does not. A fetch error is treated as an
    /// empty backlog. Returns how many welcomes were sent.
    pub async fn drain_backlog(&self) -> usize {
        let pending = match self.store.fetch_pending(&self.pending_status).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "Backlog fetch failed, continuing with empty set");
                Vec::new()
            }
        };

        info!(count = pending.len(), "Processing registration backlog");

        let mut sent = 0;
        for registration in &pending {
            match self.process_registration(registration).await {
                SendOutcome::Sent => {
                    sent += 1;
                    tokio::time::sleep(self.pacing).await;
                }
                SendOutcome::Failed => {
                    tokio::time::sleep(self.pacing).await;
                }
                SendOutcome::NoPhone => {}
            }
        }

        info!(sent, total = pending.len(), "Backlog drained");
        sent
    }

    /// Consume the live insert stream until it ends.
    ///
    /// Live events run the same send-and-register sequence, in delivery
    /// order, without the backlog pacing delay.
    pub async fn run_live_intake(&self, mut stream: RegistrationStream) {
        info!("Listening for new registrations");
        while let Some(registration) = stream.next().await {
            info!(id = %registration.id, "New registration received");
            self.process_registration(&registration).await;
        }
        info!("Registration stream ended");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Instant;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{StoreError, TransportError};
    use crate::transport::InboundStream;

    struct MockStore {
        rows: Vec<Registration>,
        fail_fetch: bool,
    }

    #[async_trait]
    impl RegistrationStore for MockStore {
        async fn fetch_pending(&self, status: &str) -> Result<Vec<Registration>, StoreError> {
            if self.fail_fetch {
                return Err(StoreError::Http("connection refused".into()));
            }
            Ok(self
                .rows
                .iter()
                .filter(|r| r.status == status)
                .cloned()
                .collect())
        }

        async fn update_status(&self, _id: &str, _status: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn subscribe_inserts(&self) -> Result<RegistrationStream, StoreError> {
            Ok(Box::pin(futures::stream::empty()))
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(String, String)>>,
        fail_sends: bool,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        fn name(&self) -> &str {
            "recording"
        }

        async fn initialize(&self) -> Result<(), TransportError> {
            Ok(())
        }

        async fn send(&self, address: &str, text: &str) -> Result<(), TransportError> {
            if self.fail_sends {
                return Err(TransportError::SendFailed {
                    address: address.to_string(),
                    reason: "rejected".into(),
                });
            }
            self.sent
                .lock()
                .unwrap()
                .push((address.to_string(), text.to_string()));
            Ok(())
        }

        async fn inbound(&self) -> Result<InboundStream, TransportError> {
            Err(TransportError::InboundTaken)
        }
    }

    fn registration(id: &str, phone: Option<&str>) -> Registration {
        Registration {
            id: id.into(),
            first_name: "Fatima".into(),
            last_name: "Z".into(),
            phone: phone.map(String::from),
            status: "pending".into(),
        }
    }

    fn engine(
        rows: Vec<Registration>,
        transport: Arc<RecordingTransport>,
        registry: Arc<ConversationRegistry>,
    ) -> OutreachEngine {
        let store = Arc::new(MockStore {
            rows,
            fail_fetch: false,
        });
        OutreachEngine::new(store, transport, registry, "pending")
            .with_pacing(Duration::ZERO)
    }

    #[tokio::test]
    async fn success_opens_conversation_under_normalized_key() {
        let transport = Arc::new(RecordingTransport::default());
        let registry = ConversationRegistry::new();
        let engine = engine(vec![], transport.clone(), registry.clone());

        let outcome = engine
            .process_registration(&registration("1", Some("0612345678")))
            .await;

        assert_eq!(outcome, SendOutcome::Sent);
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "212612345678@c.us");
        assert_eq!(sent[0].1, MessageTemplate::Welcome.text());

        let entry = registry.get("212612345678").unwrap();
        assert_eq!(entry.registration_id, "1");
        assert_eq!(entry.display_name, "Fatima Z");
    }

    #[tokio::test]
    async fn missing_phone_skips_without_send() {
        let transport = Arc::new(RecordingTransport::default());
        let registry = ConversationRegistry::new();
        let engine = engine(vec![], transport.clone(), registry.clone());

        assert_eq!(
            engine.process_registration(&registration("1", None)).await,
            SendOutcome::NoPhone
        );
        assert_eq!(
            engine
                .process_registration(&registration("2", Some("  ")))
                .await,
            SendOutcome::NoPhone
        );
        assert!(transport.sent.lock().unwrap().is_empty());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn failed_send_creates_no_entry() {
        let transport = Arc::new(RecordingTransport {
            fail_sends: true,
            ..Default::default()
        });
        let registry = ConversationRegistry::new();
        let engine = engine(vec![], transport.clone(), registry.clone());

        let outcome = engine
            .process_registration(&registration("1", Some("0612345678")))
            .await;

        assert_eq!(outcome, SendOutcome::Failed);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn backlog_processes_rows_in_order() {
        let transport = Arc::new(RecordingTransport::default());
        let registry = ConversationRegistry::new();
        let rows = vec![
            registration("1", Some("0612345678")),
            registration("2", None),
            registration("3", Some("0698765432")),
        ];
        let engine = engine(rows, transport.clone(), registry.clone());

        let sent = engine.drain_backlog().await;

        assert_eq!(sent, 2);
        let log = transport.sent.lock().unwrap();
        assert_eq!(log[0].0, "212612345678@c.us");
        assert_eq!(log[1].0, "212698765432@c.us");
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn backlog_paces_attempted_sends_only() {
        let transport = Arc::new(RecordingTransport::default());
        let registry = ConversationRegistry::new();
        let store = Arc::new(MockStore {
            rows: vec![
                registration("1", Some("0612345678")),
                registration("2", None),
                registration("3", Some("0698765432")),
            ],
            fail_fetch: false,
        });
        let engine = OutreachEngine::new(store, transport, registry, "pending")
            .with_pacing(Duration::from_millis(40));

        let start = Instant::now();
        engine.drain_backlog().await;

        // Two attempted sends consume the delay; the no-phone skip does not.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(80), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(200), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn fetch_error_yields_empty_backlog() {
        let transport = Arc::new(RecordingTransport::default());
        let registry = ConversationRegistry::new();
        let store = Arc::new(MockStore {
            rows: vec![registration("1", Some("0612345678"))],
            fail_fetch: true,
        });
        let engine = OutreachEngine::new(store, transport.clone(), registry, "pending")
            .with_pacing(Duration::ZERO);

        assert_eq!(engine.drain_backlog().await, 0);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn live_intake_processes_stream_items() {
        let transport = Arc::new(RecordingTransport::default());
        let registry = ConversationRegistry::new();
        let engine = engine(vec![], transport.clone(), registry.clone());

        let stream: RegistrationStream = Box::pin(futures::stream::iter(vec![
            registration("1", Some("0612345678")),
            registration("2", Some("0698765432")),
        ]));
        engine.run_live_intake(stream).await;

        assert_eq!(transport.sent.lock().unwrap().len(), 2);
        assert_eq!(registry.len(), 2);
    }
}
