//! Language identifiers
//!
//! A `LanguageId` is the external key hosts use to pick a grammar
//! (`"python"`, `"python3"`, `"html"`, ...). Ids are normalized on
//! construction: surrounding whitespace is dropped and ASCII is lowercased,
//! so `"Python "` and `"python"` name the same language.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque, normalized language identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LanguageId(String);

impl LanguageId {
    /// Create a normalized language id
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(normalize(id.as_ref()))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalize a raw id the same way `LanguageId::new` does
pub fn normalize(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for LanguageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LanguageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LanguageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LanguageId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<LanguageId> for String {
    fn from(id: LanguageId) -> Self {
        id.0
    }
}

impl PartialEq<str> for LanguageId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LanguageId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        assert_eq!(LanguageId::new("  Python3 "), LanguageId::new("python3"));
        assert_eq!(LanguageId::new("HTML").as_str(), "html");
    }

    #[test]
    fn test_serde_roundtrip_normalizes() {
        let id: LanguageId = serde_json::from_str("\"XML\"").unwrap();
        assert_eq!(id, "xml");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"xml\"");
    }
}
