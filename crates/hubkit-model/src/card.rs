//! Model card generation and parsing.
//!
//! A model card is a `README.md` with YAML front matter carrying the
//! structured metadata the hub indexes, followed by free-form markdown.

use hubkit_core::{HubError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Marker line included in generated card bodies.
const GENERATED_MARKER: &str =
    "<!-- This model card has been generated automatically by hubkit. -->";

/// Structured card metadata rendered as YAML front matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CardData {
    /// SPDX-ish license identifier (e.g. `apache-2.0`, `mit`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// Free-form discovery tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Integrating library name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_name: Option<String>,

    /// Task the model addresses (e.g. `text-classification`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_tag: Option<String>,

    /// Identifier of the model this one was derived from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_model: Option<String>,
}

impl CardData {
    /// Whether no field carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A model card: structured front matter plus markdown body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCard {
    /// Structured metadata.
    pub data: CardData,
    /// Markdown body.
    pub text: String,
}

impl ModelCard {
    /// Create a card with a generated placeholder body.
    #[must_use]
    pub fn generated(data: CardData) -> Self {
        let text = format!(
            "{GENERATED_MARKER}\n\n# Model Card\n\n\
             This repository was published with `save_pretrained`/`push_to_hub`.\n\
             Fill in the sections below to document the model.\n\n\
             ## Intended uses\n\n## Training details\n\n## Evaluation\n"
        );
        Self { data, text }
    }

    /// Render the card to markdown with YAML front matter.
    #[must_use]
    pub fn render(&self) -> String {
        if self.data.is_empty() {
            return self.text.clone();
        }
        // Front matter; serialization of a plain struct cannot fail.
        let yaml = serde_yaml::to_string(&self.data).unwrap_or_default();
        format!("---\n{}---\n\n{}", yaml, self.text)
    }

    /// Parse a card from markdown, splitting off any front matter.
    pub fn parse(content: &str) -> Result<Self> {
        let Some(rest) = content.strip_prefix("---\n") else {
            return Ok(Self {
                data: CardData::default(),
                text: content.to_string(),
            });
        };
        let Some((front, body)) = rest.split_once("\n---") else {
            return Err(HubError::Card("unterminated front matter".into()));
        };
        let data: CardData = serde_yaml::from_str(front)
            .map_err(|e| HubError::Card(format!("invalid front matter: {e}")))?;
        Ok(Self {
            data,
            text: body.trim_start_matches('\n').to_string(),
        })
    }

    /// Write the card to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        Ok(())
    }

    /// Read a card from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Whether the body still carries the generated-card marker.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.text.contains(GENERATED_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> CardData {
        CardData {
            license: Some("apache-2.0".into()),
            tags: vec!["hubkit".into(), "demo".into()],
            library_name: Some("demo-lib".into()),
            pipeline_tag: None,
            base_model: None,
        }
    }

    #[test]
    fn render_parse_round_trip() {
        let card = ModelCard {
            data: sample_data(),
            text: "# My model\n\nDetails.\n".into(),
        };
        let rendered = card.render();
        assert!(rendered.starts_with("---\n"));
        assert!(rendered.contains("license: apache-2.0"));

        let back = ModelCard::parse(&rendered).unwrap();
        assert_eq!(back.data, card.data);
        assert_eq!(back.text, card.text);
    }

    #[test]
    fn card_without_front_matter_parses_as_body() {
        let card = ModelCard::parse("# Just markdown\n").unwrap();
        assert!(card.data.is_empty());
        assert_eq!(card.text, "# Just markdown\n");
    }

    #[test]
    fn empty_data_renders_without_front_matter() {
        let card = ModelCard {
            data: CardData::default(),
            text: "body".into(),
        };
        assert_eq!(card.render(), "body");
    }

    #[test]
    fn unterminated_front_matter_is_an_error() {
        assert!(ModelCard::parse("---\nlicense: mit\n").is_err());
    }

    #[test]
    fn generated_card_is_marked() {
        let card = ModelCard::generated(sample_data());
        assert!(card.is_generated());
        let manual = ModelCard {
            data: sample_data(),
            text: "hand-written".into(),
        };
        assert!(!manual.is_generated());
    }

    #[test]
    fn save_load_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("README.md");
        let card = ModelCard::generated(sample_data());
        card.save(&path).unwrap();
        let back = ModelCard::load(&path).unwrap();
        assert_eq!(back, card);
    }
}
