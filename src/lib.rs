//! Outreach Bot — correlates CRM registrations with WhatsApp conversations.

pub mod config;
pub mod engine;
pub mod error;
pub mod phone;
pub mod store;
pub mod templates;
pub mod transport;
