//! Leadflow: lead fulfillment pipeline over an externally-owned tabular store.

pub mod channels;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod store;
pub mod templates;
pub mod verify;
