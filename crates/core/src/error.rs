//! Error types surfaced by the collection core.

use crate::models::ValidationErrors;

/// Failures raised by [`GameStore`](crate::store::GameStore) mutations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The record did not satisfy the field constraints.
    #[error("invalid game: {0}")]
    Validation(#[from] ValidationErrors),

    /// The collection could not be encoded.
    #[error("failed to serialize collection: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The persistent slot could not be read or written.
    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
}

/// Failures that reject an import wholesale.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The document is not valid JSON.
    #[error("file is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The document parsed but its root is not an array.
    #[error("file must contain a list of games, found {found}")]
    NotASequence {
        /// JSON type found at the root.
        found: &'static str,
    },

    /// The import file could not be read.
    #[error("failed to read import file: {0:#}")]
    Read(anyhow::Error),

    /// Appending the imported records failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
