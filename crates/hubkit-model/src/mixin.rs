//! The `HubModel` mixin trait.
//!
//! A library adds hub integration to its model type by implementing the two
//! artifact hooks; `save_pretrained`, `from_pretrained`, and `push_to_hub`
//! are provided on top of them.

use crate::card::{CardData, ModelCard};
use async_trait::async_trait;
use hubkit_client::{create_repo, download_snapshot, upload_folder, CommitInfo};
use hubkit_core::{DownloadOptions, HubError, PushOptions, RepoId, RepoKind, Result};
use std::path::Path;

/// Filename of the serialized configuration.
pub const CONFIG_FILE: &str = "config.json";

/// Filename of the model card.
pub const CARD_FILE: &str = "README.md";

/// Options recognized by [`HubModel::save_pretrained`].
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Configuration written as `config.json` alongside the artifacts.
    pub config: Option<serde_json::Value>,
    /// Card overriding the one generated from [`HubModel::card_data`].
    pub card: Option<ModelCard>,
}

/// Hub integration mixin for model types.
///
/// Implementors provide [`write_artifacts`][Self::write_artifacts] and
/// [`read_artifacts`][Self::read_artifacts]; everything else has a default
/// body. The provided methods guarantee:
///
/// - `save_pretrained` then `from_pretrained` on the same directory
///   reconstructs an equivalent model.
/// - `from_pretrained` with a local directory performs no network I/O.
/// - `push_to_hub` lands all saved artifacts as a single commit.
#[async_trait]
pub trait HubModel: Sized + Send + Sync {
    /// Write the model's weights and auxiliary artifacts into `dir`.
    ///
    /// The directory exists when this is called. Implementations decide the
    /// file set (weights, logs, figures, metrics) but must be
    /// deterministic: the same model writes the same files.
    fn write_artifacts(&self, dir: &Path) -> Result<()>;

    /// Reconstruct the model from a snapshot directory.
    fn read_artifacts(dir: &Path) -> Result<Self>;

    /// Card metadata used when generating a `README.md`.
    fn card_data(&self) -> CardData {
        CardData::default()
    }

    /// Save the model into `dir`: config, model card, then artifacts.
    ///
    /// An existing `README.md` in `dir` is left untouched so a hand-written
    /// card survives re-saving.
    fn save_pretrained(&self, dir: &Path, opts: &SaveOptions) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        if let Some(config) = &opts.config {
            let content = serde_json::to_string_pretty(config)?;
            std::fs::write(dir.join(CONFIG_FILE), content)?;
        }

        let card_path = dir.join(CARD_FILE);
        if !card_path.exists() {
            let card = opts
                .card
                .clone()
                .unwrap_or_else(|| ModelCard::generated(self.card_data()));
            card.save(&card_path)?;
        }

        self.write_artifacts(dir)?;
        tracing::debug!(dir = %dir.display(), "saved model");
        Ok(())
    }

    /// Load a model from a local directory or a remote repo identifier.
    ///
    /// A path to an existing directory is read directly, without any
    /// network I/O. Anything else is treated as a repo id and resolved
    /// through the hub honoring every [`DownloadOptions`] field. An
    /// identifier that is neither is reported as an error.
    async fn from_pretrained(model_id: &str, opts: &DownloadOptions) -> Result<Self> {
        let local = Path::new(model_id);
        if local.is_dir() {
            return Self::read_artifacts(local);
        }

        let repo_id: RepoId = model_id.parse()?;
        let snapshot = download_snapshot(&repo_id, RepoKind::Model, opts, None, None).await?;
        Self::read_artifacts(&snapshot)
    }

    /// Save the model and upload it to `repo_id` as a single commit.
    ///
    /// Creates the repository when it does not exist yet, honoring
    /// [`PushOptions::private`].
    async fn push_to_hub(&self, repo_id: &str, opts: &PushOptions) -> Result<CommitInfo> {
        let repo_id: RepoId = repo_id.parse()?;

        let staging = tempfile::tempdir().map_err(HubError::Io)?;
        self.save_pretrained(staging.path(), &SaveOptions::default())?;

        create_repo(&repo_id, RepoKind::Model, opts).await?;
        let info = upload_folder(staging.path(), &repo_id, RepoKind::Model, opts).await?;
        tracing::info!(repo = %repo_id, commit = ?info.commit_url, "pushed model");
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Toy {
        weights: Vec<f32>,
    }

    impl HubModel for Toy {
        fn write_artifacts(&self, dir: &Path) -> Result<()> {
            let content = serde_json::to_string(&self.weights)?;
            std::fs::write(dir.join("weights.json"), content)?;
            Ok(())
        }

        fn read_artifacts(dir: &Path) -> Result<Self> {
            let content = std::fs::read_to_string(dir.join("weights.json"))?;
            Ok(Self {
                weights: serde_json::from_str(&content)?,
            })
        }
    }

    #[test]
    fn save_writes_card_and_config() {
        let tmp = tempfile::tempdir().unwrap();
        let model = Toy {
            weights: vec![1.0, 2.0],
        };
        let opts = SaveOptions {
            config: Some(serde_json::json!({"hidden": 2})),
            card: None,
        };
        model.save_pretrained(tmp.path(), &opts).unwrap();

        assert!(tmp.path().join(CONFIG_FILE).exists());
        assert!(tmp.path().join(CARD_FILE).exists());
        assert!(tmp.path().join("weights.json").exists());
    }

    #[test]
    fn save_keeps_existing_card() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CARD_FILE), "# Hand-written\n").unwrap();

        let model = Toy { weights: vec![] };
        model
            .save_pretrained(tmp.path(), &SaveOptions::default())
            .unwrap();

        let card = std::fs::read_to_string(tmp.path().join(CARD_FILE)).unwrap();
        assert_eq!(card, "# Hand-written\n");
    }
}
