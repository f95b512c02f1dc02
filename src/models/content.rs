//! Content identifiers and prefix-tagged storage keys.
//!
//! The content store is one flat key space. A structural prefix on each key
//! says what kind of entry it is; the rest of the key is the content ID.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key prefix for per-content semantic properties.
pub const SEMANTIC_PROPERTIES_PREFIX: &str = "sp::";

/// Key prefix for shared state associated with a content ID.
pub const SHARED_STATE_PREFIX: &str = "ss::";

/// Key prefix for actions waiting to be uploaded.
pub const UPLOADABLE_ACTION_PREFIX: &str = "ua::";

/// Opaque identifier of one piece of stream content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Creates a new content ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ContentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The kind of entry a content key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKeyKind {
    /// Stream content payload.
    Plain,
    /// Semantic properties blob.
    SemanticProperties,
    /// Shared UI/session state.
    SharedState,
    /// Pending uploadable action.
    UploadableAction,
}

impl ContentKeyKind {
    /// Returns all key kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Plain,
            Self::SemanticProperties,
            Self::SharedState,
            Self::UploadableAction,
        ]
    }

    /// Returns the storage prefix for this kind (empty for plain content).
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Plain => "",
            Self::SemanticProperties => SEMANTIC_PROPERTIES_PREFIX,
            Self::SharedState => SHARED_STATE_PREFIX,
            Self::UploadableAction => UPLOADABLE_ACTION_PREFIX,
        }
    }

    /// Returns a short human-readable name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "content",
            Self::SemanticProperties => "semantic-properties",
            Self::SharedState => "shared-state",
            Self::UploadableAction => "uploadable-action",
        }
    }
}

impl fmt::Display for ContentKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A content-store key with its prefix decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentKey {
    /// A piece of stream content, keyed by its ID alone.
    Plain(ContentId),
    /// Semantic properties for a content ID.
    SemanticProperties(ContentId),
    /// Shared state for a content ID.
    SharedState(ContentId),
    /// An action queued for upload. Never collected by content GC.
    UploadableAction(ContentId),
}

impl ContentKey {
    /// Decodes a raw storage key.
    ///
    /// Prefixes are disjoint, so at most one matches; a key with no known
    /// prefix is plain content.
    #[must_use]
    pub fn parse(key: &str) -> Self {
        if let Some(id) = key.strip_prefix(UPLOADABLE_ACTION_PREFIX) {
            Self::UploadableAction(ContentId::from(id))
        } else if let Some(id) = key.strip_prefix(SHARED_STATE_PREFIX) {
            Self::SharedState(ContentId::from(id))
        } else if let Some(id) = key.strip_prefix(SEMANTIC_PROPERTIES_PREFIX) {
            Self::SemanticProperties(ContentId::from(id))
        } else {
            Self::Plain(ContentId::from(key))
        }
    }

    /// Returns the kind of entry this key addresses.
    #[must_use]
    pub const fn kind(&self) -> ContentKeyKind {
        match self {
            Self::Plain(_) => ContentKeyKind::Plain,
            Self::SemanticProperties(_) => ContentKeyKind::SemanticProperties,
            Self::SharedState(_) => ContentKeyKind::SharedState,
            Self::UploadableAction(_) => ContentKeyKind::UploadableAction,
        }
    }

    /// Returns the content ID with the prefix stripped.
    #[must_use]
    pub const fn content_id(&self) -> &ContentId {
        match self {
            Self::Plain(id)
            | Self::SemanticProperties(id)
            | Self::SharedState(id)
            | Self::UploadableAction(id) => id,
        }
    }

    /// Encodes the key back into its storage form.
    #[must_use]
    pub fn to_storage_key(&self) -> String {
        format!("{}{}", self.kind().prefix(), self.content_id())
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind().prefix(), self.content_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("c1", ContentKeyKind::Plain, "c1" ; "plain key")]
    #[test_case("sp::c1", ContentKeyKind::SemanticProperties, "c1" ; "semantic properties")]
    #[test_case("ss::c1", ContentKeyKind::SharedState, "c1" ; "shared state")]
    #[test_case("ua::c1", ContentKeyKind::UploadableAction, "c1" ; "uploadable action")]
    #[test_case("sp:c1", ContentKeyKind::Plain, "sp:c1" ; "near miss prefix is plain")]
    #[test_case("", ContentKeyKind::Plain, "" ; "empty key")]
    #[test_case("ss::", ContentKeyKind::SharedState, "" ; "bare prefix")]
    fn test_parse(raw: &str, kind: ContentKeyKind, id: &str) {
        let key = ContentKey::parse(raw);
        assert_eq!(key.kind(), kind);
        assert_eq!(key.content_id().as_str(), id);
    }

    #[test]
    fn test_prefix_inside_id_is_kept() {
        // Only the leading prefix is stripped.
        let key = ContentKey::parse("sp::ss::c1");
        assert_eq!(key, ContentKey::SemanticProperties(ContentId::new("ss::c1")));
    }

    #[test]
    fn test_storage_key_inverts_parse() {
        for raw in ["c1", "sp::c1", "ss::c2", "ua::c3"] {
            assert_eq!(ContentKey::parse(raw).to_storage_key(), raw);
            assert_eq!(ContentKey::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn test_kind_prefixes_are_disjoint() {
        let prefixes: Vec<&str> = ContentKeyKind::all()
            .iter()
            .map(ContentKeyKind::prefix)
            .filter(|p| !p.is_empty())
            .collect();
        for (i, a) in prefixes.iter().enumerate() {
            for b in &prefixes[i + 1..] {
                assert!(!a.starts_with(b) && !b.starts_with(a));
            }
        }
    }

    #[test]
    fn test_content_id_conversions() {
        let from_str = ContentId::from("abc");
        let from_string = ContentId::from("abc".to_string());
        assert_eq!(from_str, from_string);
        assert_eq!(from_str.to_string(), "abc");
    }
}
