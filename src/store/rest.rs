//! Supabase-style PostgREST implementation of the registration store.
//!
//! The original deployment keeps registrations in a Supabase table; this
//! client talks to its REST endpoint directly. The realtime websocket the
//! platform offers for insert events is infrastructure outside this
//! process, so the insert subscription is approximated by primed polling
//! behind the same stream contract.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::StoreError;
use crate::store::{Registration, RegistrationStore, RegistrationStream};

/// PostgREST client for the registrations table.
#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    table: String,
    status_column: String,
    first_name_column: String,
    last_name_column: String,
    phone_column: String,
    pending_status: String,
    poll_interval: Duration,
    service_key: SecretString,
}

impl RestStore {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            table: config.table_name.clone(),
            status_column: config.status_column.clone(),
            first_name_column: config.first_name_column.clone(),
            last_name_column: config.last_name_column.clone(),
            phone_column: config.phone_column.clone(),
            pending_status: config.status_pending.clone(),
            poll_interval: Duration::from_secs(config.registration_poll_secs),
            service_key: config.supabase_key.clone(),
        }
    }

    fn select_url(&self, status: &str) -> String {
        format!(
            "{}/rest/v1/{}?select=*&{}=eq.{}",
            self.base_url, self.table, self.status_column, status
        )
    }

    fn update_url(&self, id: &str) -> String {
        format!("{}/rest/v1/{}?id=eq.{}", self.base_url, self.table, id)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.service_key.expose_secret();
        request
            .header("apikey", key)
            .header("Authorization", format!("Bearer {key}"))
    }

    /// Map a raw PostgREST row onto a [`Registration`] using the
    /// configured column names. Returns `None` when the id is missing.
    fn decode_row(&self, row: &serde_json::Value) -> Option<Registration> {
        let id = match row.get("id")? {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => return None,
        };

        let text = |column: &str| {
            row.get(column)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Some(Registration {
            id,
            first_name: text(&self.first_name_column),
            last_name: text(&self.last_name_column),
            phone: row
                .get(self.phone_column.as_str())
                .and_then(serde_json::Value::as_str)
                .map(String::from),
            status: text(&self.status_column),
        })
    }
}

#[async_trait]
impl RegistrationStore for RestStore {
    async fn fetch_pending(&self, status: &str) -> Result<Vec<Registration>, StoreError> {
        let resp = self
            .authed(self.client.get(self.select_url(status)))
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let http_status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: http_status,
                body,
            });
        }

        let rows: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let mut registrations = Vec::with_capacity(rows.len());
        for row in &rows {
            match self.decode_row(row) {
                Some(registration) => registrations.push(registration),
                None => warn!(table = %self.table, "Skipping row without usable id"),
            }
        }
        Ok(registrations)
    }

    async fn update_status(&self, id: &str, status: &str) -> Result<(), StoreError> {
        let body = serde_json::json!({ &self.status_column: status });

        let resp = self
            .authed(self.client.patch(self.update_url(id)))
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let http_status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: http_status,
                body,
            });
        }
        Ok(())
    }

    async fn subscribe_inserts(&self) -> Result<RegistrationStream, StoreError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let store = self.clone();

        tokio::spawn(async move {
            let mut seen: HashSet<String> = HashSet::new();
            // The first poll only primes the seen set, so rows already
            // drained by the backlog are not re-emitted.
            let mut primed = false;
            let mut tick = tokio::time::interval(store.poll_interval);

            loop {
                tick.tick().await;

                let rows = match store.fetch_pending(&store.pending_status).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        warn!(error = %e, "Registration poll failed");
                        continue;
                    }
                };

                for registration in rows {
                    if !seen.insert(registration.id.clone()) {
                        continue;
                    }
                    if !primed {
                        continue;
                    }
                    debug!(id = %registration.id, "New registration detected");
                    if tx.send(registration).is_err() {
                        debug!("Registration subscriber dropped, stopping poll");
                        return;
                    }
                }
                primed = true;
            }
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn store() -> RestStore {
        RestStore {
            client: reqwest::Client::new(),
            base_url: "https://xyz.supabase.co".into(),
            table: "inscriptions".into(),
            status_column: "feedback".into(),
            first_name_column: "prenom".into(),
            last_name_column: "nom".into(),
            phone_column: "telephone".into(),
            pending_status: "pending".into(),
            poll_interval: Duration::from_secs(5),
            service_key: SecretString::from("key"),
        }
    }

    #[test]
    fn select_url_filters_on_status_column() {
        assert_eq!(
            store().select_url("pending"),
            "https://xyz.supabase.co/rest/v1/inscriptions?select=*&feedback=eq.pending"
        );
    }

    #[test]
    fn update_url_filters_on_id() {
        assert_eq!(
            store().update_url("42"),
            "https://xyz.supabase.co/rest/v1/inscriptions?id=eq.42"
        );
    }

    #[test]
    fn decode_row_maps_configured_columns() {
        let row = serde_json::json!({
            "id": 1,
            "prenom": "Fatima",
            "nom": "Z",
            "telephone": "0612345678",
            "feedback": "pending"
        });
        let registration = store().decode_row(&row).unwrap();
        assert_eq!(registration.id, "1");
        assert_eq!(registration.first_name, "Fatima");
        assert_eq!(registration.last_name, "Z");
        assert_eq!(registration.phone.as_deref(), Some("0612345678"));
        assert_eq!(registration.status, "pending");
    }

    #[test]
    fn decode_row_stringifies_string_ids() {
        let row = serde_json::json!({ "id": "abc-123", "prenom": "A" });
        assert_eq!(store().decode_row(&row).unwrap().id, "abc-123");
    }

    #[test]
    fn decode_row_handles_missing_phone() {
        let row = serde_json::json!({ "id": 7, "prenom": "A", "nom": "B" });
        let registration = store().decode_row(&row).unwrap();
        assert_eq!(registration.phone, None);
    }

    #[test]
    fn decode_row_rejects_missing_id() {
        let row = serde_json::json!({ "prenom": "A" });
        assert!(store().decode_row(&row).is_none());
    }
}
