//! Configuration, built from environment variables.

use std::str::FromStr;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Bot configuration.
///
/// Only the datastore credentials and the gateway URL are required;
/// everything else falls back to the defaults of the original CRM setup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Supabase project base URL.
    pub supabase_url: String,
    /// Supabase service key (apikey + bearer).
    pub supabase_key: SecretString,
    /// Registrations table name.
    pub table_name: String,
    /// Column holding the registration status.
    pub status_column: String,
    /// Column holding the first name.
    pub first_name_column: String,
    /// Column holding the last name.
    pub last_name_column: String,
    /// Column holding the free-text phone number.
    pub phone_column: String,
    /// Status value marking a registration as awaiting outreach.
    pub status_pending: String,
    /// Status value written on a confirmed registration.
    pub status_confirmed: String,
    /// WhatsApp HTTP gateway base URL.
    pub gateway_url: String,
    /// Optional bearer token for the gateway.
    pub gateway_token: Option<SecretString>,
    /// Port the inbound webhook listens on.
    pub webhook_port: u16,
    /// Poll interval for the insert subscription, in seconds.
    pub registration_poll_secs: u64,
}

impl Config {
    /// Build config from environment variables.
    ///
    /// Fails only on missing required variables; invalid numeric values
    /// fall back to their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = require(
            "SUPABASE_URL",
            "Set it to the project base URL (https://xyz.supabase.co)",
        )?;
        let supabase_key = require("SUPABASE_KEY", "Set it to the project service key")?;
        let gateway_url = require(
            "WA_GATEWAY_URL",
            "Set it to the WhatsApp gateway base URL (http://localhost:3000)",
        )?;

        Ok(Self {
            supabase_url,
            supabase_key: SecretString::from(supabase_key),
            table_name: optional("TABLE_NAME", "inscriptions"),
            status_column: optional("COLUMN_STATUS", "feedback"),
            first_name_column: optional("COLUMN_FIRSTNAME", "prenom"),
            last_name_column: optional("COLUMN_LASTNAME", "nom"),
            phone_column: optional("COLUMN_PHONE", "telephone"),
            status_pending: optional("STATUS_PENDING", "pending"),
            status_confirmed: optional("STATUS_CONFIRMED", "confirmed"),
            gateway_url,
            gateway_token: std::env::var("WA_GATEWAY_TOKEN").ok().map(SecretString::from),
            webhook_port: optional_parse("WEBHOOK_PORT", 8787),
            registration_poll_secs: optional_parse("REGISTRATION_POLL_SECS", 5),
        })
    }
}

fn require(key: &str, hint: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingRequired {
        key: key.to_string(),
        hint: hint.to_string(),
    })
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, raw, "Invalid numeric value, using default");
            default
        }
    }
}
