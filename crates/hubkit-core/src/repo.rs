//! Validated repository identifiers.

use crate::{HubError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of hub repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepoKind {
    /// Model repository.
    #[default]
    Model,
    /// Dataset repository.
    Dataset,
    /// Space repository.
    Space,
}

impl RepoKind {
    /// Singular name used by the hub API (`"model"`, `"dataset"`, `"space"`).
    #[must_use]
    pub const fn api_name(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Dataset => "dataset",
            Self::Space => "space",
        }
    }

    /// URL path prefix for this kind. Models live at the site root.
    #[must_use]
    pub const fn url_prefix(&self) -> &'static str {
        match self {
            Self::Model => "",
            Self::Dataset => "datasets/",
            Self::Space => "spaces/",
        }
    }

    /// Plural path segment used by the hub REST API.
    #[must_use]
    pub const fn api_segment(&self) -> &'static str {
        match self {
            Self::Model => "models",
            Self::Dataset => "datasets",
            Self::Space => "spaces",
        }
    }
}

/// A validated repository identifier: `name` or `namespace/name`.
///
/// Identifiers are joined onto cache paths, so parsing rejects anything
/// that could escape a directory: empty segments, `.`/`..`, leading dots,
/// and characters outside `[A-Za-z0-9._-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId {
    /// Owning user or organization, when qualified.
    pub namespace: Option<String>,
    /// Repository name.
    pub name: String,
}

impl RepoId {
    /// Parse and validate an identifier string.
    pub fn parse(id: &str) -> Result<Self> {
        let mut parts = id.split('/');
        let (namespace, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, _) => (None, name),
            (Some(ns), Some(name), None) => (Some(ns), name),
            _ => return Err(HubError::InvalidRepoId(id.to_string())),
        };

        if let Some(ns) = namespace {
            validate_segment(ns).map_err(|()| HubError::InvalidRepoId(id.to_string()))?;
        }
        validate_segment(name).map_err(|()| HubError::InvalidRepoId(id.to_string()))?;

        Ok(Self {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        })
    }
}

fn validate_segment(segment: &str) -> std::result::Result<(), ()> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.starts_with('.') {
        return Err(());
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(());
    }
    Ok(())
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl FromStr for RepoId {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepoId {
    type Error = HubError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RepoId> for String {
    fn from(id: RepoId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_qualified_id() {
        let id = RepoId::parse("org/model-7b").unwrap();
        assert_eq!(id.namespace.as_deref(), Some("org"));
        assert_eq!(id.name, "model-7b");
        assert_eq!(id.to_string(), "org/model-7b");
    }

    #[test]
    fn parses_unqualified_id() {
        let id = RepoId::parse("bert-base").unwrap();
        assert!(id.namespace.is_none());
        assert_eq!(id.to_string(), "bert-base");
    }

    #[test]
    fn rejects_traversal_and_empty_segments() {
        for bad in ["", "/", "a/", "/b", "a//b", "..", "../x", "a/..", "a/b/c", ".hidden/x"] {
            assert!(RepoId::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_unexpected_characters() {
        assert!(RepoId::parse("org/na me").is_err());
        assert!(RepoId::parse("org/na\\me").is_err());
        assert!(RepoId::parse("org/model!").is_err());
    }

    #[test]
    fn serde_round_trip() {
        let id = RepoId::parse("org/model").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"org/model\"");
        let back: RepoId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn kind_segments() {
        assert_eq!(RepoKind::Model.url_prefix(), "");
        assert_eq!(RepoKind::Dataset.url_prefix(), "datasets/");
        assert_eq!(RepoKind::Model.api_segment(), "models");
        assert_eq!(RepoKind::Space.api_name(), "space");
    }
}
