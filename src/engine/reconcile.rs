//! Status reconciler — writes terminal transitions back to the datastore.

use std::sync::Arc;

use tracing::{error, info};

use crate::store::RegistrationStore;

/// Persists the confirmed status for a closed conversation.
///
/// Deliberately fire-and-forget: a failed write is logged and reported,
/// never retried. The caller has already evicted the in-memory entry, so
/// a failure leaves the durable row pending while the conversation stays
/// closed for the process lifetime.
#[derive(Clone)]
pub struct StatusReconciler {
    store: Arc<dyn RegistrationStore>,
    confirmed_status: String,
}

impl StatusReconciler {
    pub fn new(store: Arc<dyn RegistrationStore>, confirmed_status: impl Into<String>) -> Self {
        Self {
            store,
            confirmed_status: confirmed_status.into(),
        }
    }

    /// Mark a registration confirmed. Returns whether the write succeeded.
    pub async fn confirm(&self, registration_id: &str, display_name: &str) -> bool {
        match self
            .store
            .update_status(registration_id, &self.confirmed_status)
            .await
        {
            Ok(()) => {
                info!(
                    id = %registration_id,
                    name = %display_name,
                    status = %self.confirmed_status,
                    "Registration confirmed"
                );
                true
            }
            Err(e) => {
                error!(
                    id = %registration_id,
                    error = %e,
                    "Status update failed; in-memory conversation already dropped"
                );
                false
            }
        }
    }
}
