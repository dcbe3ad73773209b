//! Secure handling of hub access tokens.
//!
//! Tokens authenticate access to private repositories and gated uploads.
//! [`HubToken`] redacts its content in `Debug` and `Display` output so a
//! token never leaks into logs or error messages.

use crate::token_file;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable consulted when no explicit token is given.
pub const TOKEN_ENV: &str = "HF_TOKEN";

/// A hub access token that redacts its content when formatted.
///
/// The underlying value can only be read via [`expose`][HubToken::expose].
///
/// # Example
///
/// ```
/// use hubkit_core::HubToken;
///
/// let token = HubToken::new("hf_abc123");
/// assert_eq!(format!("{token:?}"), "HubToken([REDACTED])");
/// assert_eq!(token.expose(), "hf_abc123");
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HubToken {
    inner: String,
}

impl HubToken {
    /// Wrap a token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            inner: token.into(),
        }
    }

    /// Resolve a usable token.
    ///
    /// Order: the explicit token, then the `HF_TOKEN` environment variable,
    /// then the persisted token file next to the hub cache. Returns `None`
    /// when no source yields a non-empty value.
    pub fn resolve(explicit: Option<&HubToken>) -> Option<HubToken> {
        if let Some(token) = explicit {
            if !token.is_empty() {
                return Some(token.clone());
            }
        }
        if let Ok(value) = std::env::var(TOKEN_ENV) {
            if !value.trim().is_empty() {
                return Some(Self::new(value.trim()));
            }
        }
        if let Ok(contents) = std::fs::read_to_string(token_file()) {
            let trimmed = contents.trim();
            if !trimmed.is_empty() {
                return Some(Self::new(trimmed));
            }
        }
        None
    }

    /// Expose the token value.
    ///
    /// This is the only accessor; the exposed value must not be logged.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// Whether the token is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for HubToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HubToken([REDACTED])")
    }
}

impl fmt::Display for HubToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for HubToken {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for HubToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Overwrite the token bytes before deallocating.
impl Drop for HubToken {
    fn drop(&mut self) {
        if !self.inner.is_empty() {
            // SAFETY: we own the String exclusively in Drop; the pointer is
            // valid for len bytes, write_volatile keeps the zeroing from
            // being optimized out, and NUL bytes leave the String valid
            // UTF-8.
            unsafe {
                let ptr = self.inner.as_mut_ptr();
                for i in 0..self.inner.len() {
                    std::ptr::write_volatile(ptr.add(i), 0);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_redact() {
        let token = HubToken::new("hf_secret_value");
        assert_eq!(format!("{token:?}"), "HubToken([REDACTED])");
        assert_eq!(format!("{token}"), "[REDACTED]");
    }

    #[test]
    fn expose_returns_value() {
        let token = HubToken::new("hf_secret_value");
        assert_eq!(token.expose(), "hf_secret_value");
    }

    #[test]
    fn explicit_token_wins() {
        let explicit = HubToken::new("explicit");
        let resolved = HubToken::resolve(Some(&explicit)).unwrap();
        assert_eq!(resolved.expose(), "explicit");
    }

    #[test]
    fn empty_explicit_token_is_skipped() {
        std::env::remove_var(TOKEN_ENV);
        let explicit = HubToken::new("");
        // Falls through to env/file; with neither set this may be None or a
        // developer's real token file, so only assert it is not the empty
        // explicit value.
        if let Some(resolved) = HubToken::resolve(Some(&explicit)) {
            assert!(!resolved.is_empty());
        }
    }

    #[test]
    fn env_token_is_trimmed() {
        std::env::set_var(TOKEN_ENV, " hf_from_env \n");
        let resolved = HubToken::resolve(None).unwrap();
        assert_eq!(resolved.expose(), "hf_from_env");
        std::env::remove_var(TOKEN_ENV);
    }

    #[test]
    fn serde_round_trip_is_transparent() {
        let token = HubToken::new("hf_tok");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"hf_tok\"");
        let back: HubToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back.expose(), "hf_tok");
    }
}
