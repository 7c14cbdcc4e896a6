//! Error types for the outreach bot.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Datastore (PostgREST) errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Datastore returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode registration row: {0}")]
    Decode(String),
}

/// Messaging transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Gateway not connected: {reason}")]
    NotConnected { reason: String },

    #[error("Send to {address} failed: {reason}")]
    SendFailed { address: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Inbound stream already taken")]
    InboundTaken,
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
