//! Locally recorded stream actions.

use super::ContentId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of user action recorded against a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// The user dismissed the content.
    #[default]
    Dismiss,
    /// The content was shown to the user.
    View,
    /// The user opened the content.
    Click,
}

impl ActionType {
    /// Returns the action type as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dismiss => "dismiss",
            Self::View => "view",
            Self::Click => "click",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user action recorded on this device, stored in an action journal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamLocalAction {
    /// What the user did.
    pub action_type: ActionType,
    /// The content the action targets.
    pub feature_content_id: ContentId,
    /// When the action happened (Unix seconds).
    pub timestamp_seconds: u64,
}

impl StreamLocalAction {
    /// Creates a new action.
    #[must_use]
    pub fn new(
        action_type: ActionType,
        feature_content_id: impl Into<ContentId>,
        timestamp_seconds: u64,
    ) -> Self {
        Self {
            action_type,
            feature_content_id: feature_content_id.into(),
            timestamp_seconds,
        }
    }

    /// Creates a dismiss action timestamped now.
    #[must_use]
    pub fn dismiss(feature_content_id: impl Into<ContentId>) -> Self {
        Self::new(
            ActionType::Dismiss,
            feature_content_id,
            crate::current_timestamp(),
        )
    }

    /// Returns the ID of the content this action targets.
    #[must_use]
    pub const fn feature_content_id(&self) -> &ContentId {
        &self.feature_content_id
    }

    /// Encodes the action as a journal record.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Serialization {
            cause: e.to_string(),
        })
    }

    /// Decodes an action from a journal record.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Serialization {
            cause: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dismiss_sets_type_and_timestamp() {
        let action = StreamLocalAction::dismiss("c1");
        assert_eq!(action.action_type, ActionType::Dismiss);
        assert_eq!(action.feature_content_id().as_str(), "c1");
        assert!(action.timestamp_seconds > 0);
    }

    #[test]
    fn test_record_encoding() {
        let action = StreamLocalAction::new(ActionType::View, "c9", 1_700_000_000);
        let bytes = action.to_bytes().expect("encode");
        let text = String::from_utf8(bytes.clone()).expect("utf8");
        assert!(text.contains("\"action_type\":\"view\""));
        assert!(text.contains("\"feature_content_id\":\"c9\""));
        assert_eq!(StreamLocalAction::from_bytes(&bytes).expect("decode"), action);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let err = StreamLocalAction::from_bytes(b"not json").expect_err("should fail");
        assert!(matches!(err, Error::Serialization { .. }));
    }
}
