//! Conversation registry — in-memory table of conversations awaiting a reply.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Correlation record linking a normalized phone key to an in-flight
/// registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub registration_id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn new(registration_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            registration_id: registration_id.into(),
            display_name: display_name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Process-lifetime map of normalized phone key → [`ConversationEntry`].
///
/// Not persisted; reset on restart. Operations are synchronous and never
/// hold the lock across an await, so any read-modify-write on a key is
/// atomic with respect to the event loop.
pub struct ConversationRegistry {
    entries: Mutex<HashMap<String, ConversationEntry>>,
}

impl ConversationRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// Insert or overwrite the entry for a phone key. Last write wins: a
    /// contact can only be mid-conversation with one registration.
    pub fn insert(&self, key: impl Into<String>, entry: ConversationEntry) {
        let key = key.into();
        info!(key = %key, name = %entry.display_name, "Conversation opened");
        self.lock().insert(key, entry);
    }

    /// Look up the entry for a phone key.
    pub fn get(&self, key: &str) -> Option<ConversationEntry> {
        self.lock().get(key).cloned()
    }

    /// Take the entry for a phone key out of the registry.
    ///
    /// The atomic take is what makes a duplicate terminal reply unable to
    /// reconcile twice: only one caller gets the entry back.
    pub fn remove(&self, key: &str) -> Option<ConversationEntry> {
        let removed = self.lock().remove(key);
        if removed.is_some() {
            debug!(key = %key, "Conversation closed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ConversationEntry>> {
        self.entries.lock().expect("registry lock poisoned")
    }
}
