//! Save/load round-trip and failure-path tests for the mixin.

use hubkit_core::{DownloadOptions, HubError, Result};
use hubkit_model::{CardData, HubModel, ModelCard, SaveOptions, CARD_FILE, CONFIG_FILE};
use std::path::Path;

/// A small classifier standing in for a real library's model type.
#[derive(Debug, Clone, PartialEq)]
struct TinyClassifier {
    weights: Vec<f32>,
    bias: f32,
    labels: Vec<String>,
}

impl TinyClassifier {
    fn example() -> Self {
        Self {
            weights: vec![0.5, -1.25, 3.0],
            bias: 0.1,
            labels: vec!["neg".into(), "pos".into()],
        }
    }
}

impl HubModel for TinyClassifier {
    fn write_artifacts(&self, dir: &Path) -> Result<()> {
        let weights = serde_json::json!({
            "weights": self.weights,
            "bias": self.bias,
        });
        std::fs::write(
            dir.join("model.json"),
            serde_json::to_string_pretty(&weights).map_err(|e| HubError::Serialization(e.to_string()))?,
        )?;
        std::fs::write(dir.join("labels.txt"), self.labels.join("\n"))?;
        Ok(())
    }

    fn read_artifacts(dir: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(dir.join("model.json"))?;
        let parsed: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| HubError::Serialization(e.to_string()))?;
        let weights = parsed["weights"]
            .as_array()
            .ok_or_else(|| HubError::Serialization("missing weights".into()))?
            .iter()
            .filter_map(|v| v.as_f64())
            .map(|v| v as f32)
            .collect();
        let bias = parsed["bias"].as_f64().unwrap_or_default() as f32;
        let labels = std::fs::read_to_string(dir.join("labels.txt"))?
            .lines()
            .map(str::to_string)
            .collect();
        Ok(Self {
            weights,
            bias,
            labels,
        })
    }

    fn card_data(&self) -> CardData {
        CardData {
            license: Some("apache-2.0".into()),
            tags: vec!["tiny-classifier".into()],
            library_name: Some("tiny".into()),
            pipeline_tag: Some("text-classification".into()),
            base_model: None,
        }
    }
}

#[tokio::test]
async fn save_then_load_reconstructs_equivalent_model() {
    let tmp = tempfile::tempdir().unwrap();
    let model = TinyClassifier::example();

    model
        .save_pretrained(tmp.path(), &SaveOptions::default())
        .unwrap();

    let dir = tmp.path().to_string_lossy().to_string();
    let loaded = TinyClassifier::from_pretrained(&dir, &DownloadOptions::default())
        .await
        .unwrap();
    assert_eq!(loaded, model);
}

#[tokio::test]
async fn local_load_ignores_network_options() {
    let tmp = tempfile::tempdir().unwrap();
    let model = TinyClassifier::example();
    model
        .save_pretrained(tmp.path(), &SaveOptions::default())
        .unwrap();

    // Offline options must not matter for a local directory.
    let dir = tmp.path().to_string_lossy().to_string();
    let loaded = TinyClassifier::from_pretrained(&dir, &DownloadOptions::offline())
        .await
        .unwrap();
    assert_eq!(loaded, model);
}

#[test]
fn save_generates_card_from_model_metadata() {
    let tmp = tempfile::tempdir().unwrap();
    let model = TinyClassifier::example();
    model
        .save_pretrained(tmp.path(), &SaveOptions::default())
        .unwrap();

    let card = ModelCard::load(&tmp.path().join(CARD_FILE)).unwrap();
    assert!(card.is_generated());
    assert_eq!(card.data.license.as_deref(), Some("apache-2.0"));
    assert_eq!(card.data.pipeline_tag.as_deref(), Some("text-classification"));
}

#[test]
fn save_writes_config_when_given() {
    let tmp = tempfile::tempdir().unwrap();
    let model = TinyClassifier::example();
    let opts = SaveOptions {
        config: Some(serde_json::json!({"num_labels": 2})),
        card: None,
    };
    model.save_pretrained(tmp.path(), &opts).unwrap();

    let config: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(tmp.path().join(CONFIG_FILE)).unwrap())
            .unwrap();
    assert_eq!(config["num_labels"], 2);
}

#[tokio::test]
async fn invalid_identifier_is_reported() {
    let err = TinyClassifier::from_pretrained("../escape", &DownloadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::InvalidRepoId(_)));
}

#[tokio::test]
async fn unknown_identifier_offline_is_reported_not_silent() {
    let cache = tempfile::tempdir().unwrap();
    let opts = DownloadOptions {
        cache_dir: Some(cache.path().to_path_buf()),
        local_files_only: true,
        ..Default::default()
    };

    let err = TinyClassifier::from_pretrained("nobody/no-such-model", &opts)
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::CacheMiss { .. }));
}
