//! Strongly-typed dataset identifier.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Opaque identifier for an uploaded dataset.
///
/// Generated ids are random UUID v4 strings. Ids arriving from callers are
/// accepted as-is (non-empty) and only ever used as registry lookup keys,
/// never to build file paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(String);

impl DatasetId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Try to create a `DatasetId` from caller input, returning `None` if it
    /// is empty or whitespace.
    pub fn try_new(id: impl Into<String>) -> Option<Self> {
        let s = id.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == s.len() {
            Some(Self(s))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Return the underlying id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DatasetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for DatasetId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DatasetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_uuid() {
        let id = DatasetId::generate();
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
        assert_ne!(id, DatasetId::generate());
    }

    #[test]
    fn test_try_new_rejects_blank() {
        assert!(DatasetId::try_new("").is_none());
        assert!(DatasetId::try_new("   ").is_none());
        assert_eq!(DatasetId::try_new(" abc ").unwrap().as_str(), "abc");
    }
}
