//! Datastore collaborator — registration model and access trait.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::StoreError;

pub mod rest;

pub use rest::RestStore;

/// A registration row from the external CRM table.
///
/// Column names in the table are configurable; the REST layer maps raw
/// rows onto this struct at the edge. The status field is only ever
/// written back through [`RegistrationStore::update_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Opaque unique identifier (numeric ids are stringified).
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Free-text phone number, may be absent.
    pub phone: Option<String>,
    pub status: String,
}

impl Registration {
    /// Full display name, empty parts skipped.
    pub fn display_name(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if !self.first_name.trim().is_empty() {
            parts.push(self.first_name.trim());
        }
        if !self.last_name.trim().is_empty() {
            parts.push(self.last_name.trim());
        }
        parts.join(" ")
    }
}

/// Push stream of newly inserted registrations.
pub type RegistrationStream = Pin<Box<dyn Stream<Item = Registration> + Send>>;

/// Backend-agnostic registration datastore.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Fetch all registrations whose status equals `status`.
    async fn fetch_pending(&self, status: &str) -> Result<Vec<Registration>, StoreError>;

    /// Write a new status for the registration with the given id.
    async fn update_status(&self, id: &str, status: &str) -> Result<(), StoreError>;

    /// Subscribe to newly inserted registrations.
    ///
    /// Rows already present when the subscription is created are not
    /// emitted; only later arrivals are.
    async fn subscribe_inserts(&self) -> Result<RegistrationStream, StoreError>;
}
