//! Error types for leadflow.

/// Top-level error type for the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors. Fatal to startup, never per-record.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("No outreach channel configured (set SMTP_HOST and/or TEXTFULLY_API_KEY)")]
    NoChannelsConfigured,
}

/// Header resolution errors. Fatal to a pipeline run, surfaced before any
/// record is processed.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Required column {column} cannot be resolved from the sheet header")]
    MissingRequiredColumn { column: String },

    #[error("Sheet has no header row")]
    EmptyHeader,
}

/// Record store errors. The store is a remote service, every call can fail.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Store API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("No record found for {email}")]
    RecordNotFound { email: String },

    #[error("Unexpected store response: {0}")]
    InvalidResponse(String),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Per-channel send errors. Caught by the dispatcher and converted into a
/// channel-level failure; never abort the other channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to send: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Channel {name} rejected recipient: {reason}")]
    InvalidRecipient { name: String, reason: String },
}

/// Dispatch-level errors.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Record has no contact handle any configured channel can use")]
    NoContactHandle,
}

/// Orchestrator-level errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("A pipeline run is already in flight")]
    AlreadyRunning,
}

/// Result type alias for the pipeline.
pub type Result<T> = std::result::Result<T, Error>;
