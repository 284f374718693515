//! Document persistence backends for answers, credentials and sessions.

mod json_file;
mod memory;

pub use json_file::JsonDocumentStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store io failure at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed document {collection}/{id}: {source}")]
    Malformed {
        collection: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}
