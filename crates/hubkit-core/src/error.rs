//! Error types for HubKit.

use thiserror::Error;

/// Result type alias for HubKit operations.
pub type Result<T> = std::result::Result<T, HubError>;

/// Main error type for HubKit operations.
#[derive(Error, Debug)]
pub enum HubError {
    /// Malformed repository identifier.
    #[error("Invalid repo id '{0}': expected 'name' or 'namespace/name'")]
    InvalidRepoId(String),

    /// Errors surfaced by the download client.
    #[error("Hub client error: {0}")]
    Client(String),

    /// Hub API request rejected or failed.
    #[error("Hub API error (status {status}): {message}")]
    Api {
        /// HTTP status code reported by the hub.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// Missing or rejected credentials.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Requested file does not exist in the repository.
    #[error("File '{filename}' not found in '{repo_id}'")]
    FileNotFound {
        /// Repository identifier.
        repo_id: String,
        /// Requested filename.
        filename: String,
    },

    /// Offline mode was requested but the file is not cached locally.
    #[error("'{filename}' from '{repo_id}' is not in the local cache and local_files_only is set")]
    CacheMiss {
        /// Repository identifier.
        repo_id: String,
        /// Requested filename.
        filename: String,
    },

    /// Upload produced no files to commit.
    #[error("Nothing to commit for '{0}': all files were filtered out")]
    EmptyCommit(String),

    /// Upload transport or protocol failure.
    #[error("Upload error: {0}")]
    Upload(String),

    /// Model card generation or parsing failure.
    #[error("Model card error: {0}")]
    Card(String),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_miss_names_repo_and_file() {
        let err = HubError::CacheMiss {
            repo_id: "org/model".into(),
            filename: "config.json".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("org/model"));
        assert!(msg.contains("config.json"));
        assert!(msg.contains("local_files_only"));
    }

    #[test]
    fn json_errors_convert() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let converted: HubError = err.into();
        assert!(matches!(converted, HubError::Serialization(_)));
    }
}
