//! Persistence sinks for the curated content map
//!
//! A sink receives the final map read-only and writes one `<key>.txt` per
//! entry. Two variants: a local folder writer and an object-storage writer
//! with create-or-replace container semantics.

mod local;
mod object;

pub use local::LocalDirSink;
pub use object::ObjectStoreSink;

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur while persisting content
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write {name}: {source}")]
    Write {
        name: String,
        source: std::io::Error,
    },

    #[error("Object storage HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Object storage returned HTTP {status} during {operation}")]
    Api { operation: String, status: u16 },

    #[error("Failed to parse blob listing: {0}")]
    Listing(String),

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Capability to persist the curated content map
///
/// `site` is the identity derived from the seed domain; the object-storage
/// sink uses it as the container name, the local sink writes into its
/// configured folder regardless.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn write(&self, site: &str, files: &BTreeMap<String, String>) -> SinkResult<()>;
}
