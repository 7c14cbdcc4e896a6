//! Reply router — maps inbound numeric choices onto conversation
//! transitions.
//!
//! State is modeled explicitly: a conversation is `Open` while its
//! registry entry exists and `Closed` once the terminal reply took it
//! out. Options 1 and 2 are informational and repeatable; only option 3
//! closes the conversation and triggers reconciliation.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::engine::reconcile::StatusReconciler;
use crate::engine::registry::{ConversationEntry, ConversationRegistry};
use crate::phone;
use crate::templates::MessageTemplate;
use crate::transport::{InboundMessage, InboundStream, Transport};

/// A recognized numeric-choice reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyChoice {
    /// "1" — course details.
    CourseDetails,
    /// "2" — pricing.
    Pricing,
    /// "3" — terminal confirmation.
    Confirm,
}

impl ReplyChoice {
    /// Parse trimmed inbound text. Anything but the three literal
    /// choices is no choice at all.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "1" => Some(Self::CourseDetails),
            "2" => Some(Self::Pricing),
            "3" => Some(Self::Confirm),
            _ => None,
        }
    }
}

/// Conversation state derived from the registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    /// An entry exists: the contact is mid-conversation.
    Open(ConversationEntry),
    /// No entry: never opened, or already confirmed.
    Closed,
}

/// Result of applying a choice to a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub reply: Option<MessageTemplate>,
    pub close: bool,
}

/// Pure transition table.
///
/// A confirm on a closed conversation still gets the acknowledgement
/// resent but does not close (there is nothing to close), which makes
/// the duplicate-"3" behavior an explicit choice rather than an accident.
pub fn transition(state: &ConversationState, choice: ReplyChoice) -> Transition {
    match choice {
        ReplyChoice::CourseDetails => Transition {
            reply: Some(MessageTemplate::CourseDetails),
            close: false,
        },
        ReplyChoice::Pricing => Transition {
            reply: Some(MessageTemplate::Pricing),
            close: false,
        },
        ReplyChoice::Confirm => Transition {
            reply: Some(MessageTemplate::ConfirmationAck),
            close: matches!(state, ConversationState::Open(_)),
        },
    }
}

/// Dispatches inbound messages through the transition table.
pub struct ReplyRouter {
    registry: Arc<ConversationRegistry>,
    transport: Arc<dyn Transport>,
    reconciler: StatusReconciler,
}

impl ReplyRouter {
    pub fn new(
        registry: Arc<ConversationRegistry>,
        transport: Arc<dyn Transport>,
        reconciler: StatusReconciler,
    ) -> Self {
        Self {
            registry,
            transport,
            reconciler,
        }
    }

    /// Handle one inbound message.
    pub async fn handle_inbound(&self, msg: &InboundMessage) {
        let key = phone::normalize(&msg.sender);

        let Some(choice) = ReplyChoice::parse(&msg.text) else {
            debug!(key = %key, "Unrecognized reply, ignoring");
            return;
        };

        let state = match self.registry.get(&key) {
            Some(entry) => ConversationState::Open(entry),
            None => ConversationState::Closed,
        };
        let next = transition(&state, choice);
        info!(key = %key, choice = ?choice, close = next.close, "Reply routed");

        if let Some(template) = next.reply {
            // A failed reply send does not abort the close below.
            if let Err(e) = self
                .transport
                .send(&phone::chat_address(&key), template.text())
                .await
            {
                warn!(key = %key, template = template.label(), error = %e, "Reply send failed");
            }
        }

        if next.close
            && let Some(entry) = self.registry.remove(&key)
        {
            self.reconciler
                .confirm(&entry.registration_id, &entry.display_name)
                .await;
        }
    }

    /// Consume the inbound stream until the transport closes it.
    pub async fn run(&self, mut inbound: InboundStream) {
        info!("Listening for inbound replies");
        while let Some(msg) = inbound.next().await {
            self.handle_inbound(&msg).await;
        }
        info!("Inbound stream ended");
    }
}
