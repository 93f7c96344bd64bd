use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the persisted key-value store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read store file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write store file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create store directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize store contents: {0}")]
    SerializeFailed(#[from] serde_json::Error),
}

/// Errors that can occur when fetching or parsing the podcast catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to fetch catalog from {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read catalog file {path}: {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog JSON: {0}")]
    ParseFailed(#[from] serde_json::Error),

    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Errors reported by the platform audio handle.
///
/// All of these are recoverable: a rejected playback start leaves the
/// engine paused and is logged as a warning, never surfaced as fatal.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Playback start rejected: {reason}")]
    StartRejected { reason: String },

    #[error("No audio source loaded")]
    NoSource,
}
