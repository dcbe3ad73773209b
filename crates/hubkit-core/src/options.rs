//! Option types for download and push operations.

use crate::HubToken;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options recognized by load/download operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOptions {
    /// Branch, tag, or commit to resolve. `None` uses the default branch.
    #[serde(default)]
    pub revision: Option<String>,

    /// Override the local cache location.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Bypass the cache and fetch fresh copies.
    #[serde(default)]
    pub force_download: bool,

    /// Continue partial downloads instead of starting over.
    ///
    /// Resumption itself is the transfer client's behavior; setting this to
    /// `false` forces a fresh transfer.
    #[serde(default = "default_true")]
    pub resume_download: bool,

    /// Resolve exclusively from the local cache; never touch the network.
    #[serde(default)]
    pub local_files_only: bool,

    /// Token for private repositories. Falls back to `HF_TOKEN` and the
    /// persisted token file when unset.
    #[serde(default)]
    pub token: Option<HubToken>,

    /// Override the hub endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Proxy URL for API requests. The download client additionally honors
    /// the standard `HTTPS_PROXY`/`HTTP_PROXY` environment variables.
    #[serde(default)]
    pub proxy: Option<String>,

    /// Show a progress bar during transfers.
    #[serde(default)]
    pub progress: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            revision: None,
            cache_dir: None,
            force_download: false,
            resume_download: true,
            local_files_only: false,
            token: None,
            endpoint: None,
            proxy: None,
            progress: false,
        }
    }
}

impl DownloadOptions {
    /// Options that resolve exclusively from the local cache.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            local_files_only: true,
            ..Self::default()
        }
    }
}

/// Options recognized by push/upload operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushOptions {
    /// Commit summary line.
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Optional extended commit description.
    #[serde(default)]
    pub commit_description: Option<String>,

    /// Create the repository as private when it does not exist yet.
    #[serde(default)]
    pub private: bool,

    /// Land the commit on a new pull-request ref instead of the branch.
    #[serde(default)]
    pub create_pr: bool,

    /// Target branch. `None` targets the default branch.
    #[serde(default)]
    pub branch: Option<String>,

    /// Only upload files matching one of these patterns.
    #[serde(default)]
    pub allow_patterns: Option<Vec<String>>,

    /// Never upload files matching one of these patterns. Wins over
    /// `allow_patterns`.
    #[serde(default)]
    pub ignore_patterns: Option<Vec<String>>,

    /// Token used to authenticate the push. Falls back to `HF_TOKEN` and
    /// the persisted token file when unset.
    #[serde(default)]
    pub token: Option<HubToken>,

    /// Override the hub endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Proxy URL for API requests.
    #[serde(default)]
    pub proxy: Option<String>,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            commit_message: default_commit_message(),
            commit_description: None,
            private: false,
            create_pr: false,
            branch: None,
            allow_patterns: None,
            ignore_patterns: None,
            token: None,
            endpoint: None,
            proxy: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_commit_message() -> String {
    "Upload with hubkit".into()
}
