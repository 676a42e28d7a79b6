//! Error types for twolist

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Stored value under {key} is not valid: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Item not found: {0}")]
    NotFound(crate::ItemId),

    #[error("No item ID left after the largest stored one")]
    IdsExhausted,

    #[error("Invalid item ID: {0}")]
    InvalidId(String),

    #[error("Invalid mode: {0} (expected 'work' or 'travel')")]
    InvalidMode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
