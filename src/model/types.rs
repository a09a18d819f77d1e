use serde::{Deserialize, Serialize};

use crate::util::trim_trailing_slash;

// ============================================================================
// Sub-entities owned by News and Feed
// ============================================================================

/// Globally unique identifier carried by a news item.
///
/// The permalink flag mirrors the RSS `isPermaLink` attribute; when the
/// source omits it, the value is treated as permalink-like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guid {
    pub value: String,
    pub permalink: Option<bool>,
}

impl Guid {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            permalink: None,
        }
    }

    pub fn permalink(value: impl Into<String>, permalink: bool) -> Self {
        Self {
            value: value.into(),
            permalink: Some(permalink),
        }
    }

    /// Absent defaults to permalink-like.
    pub fn is_permalink(&self) -> bool {
        self.permalink.unwrap_or(true)
    }

    /// Value with at most one trailing slash removed, the form every
    /// equivalence comparison uses.
    pub fn normalized_value(&self) -> &str {
        trim_trailing_slash(&self.value)
    }
}

/// Enclosure attached to a news item. Position in the attachment list is
/// meaningful; identity for merging is the link.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Option<i64>,
    pub link: Option<String>,
    pub mime_type: Option<String>,
    pub length: Option<i64>,
}

/// Category or tag. Identity for merging is the name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub domain: Option<String>,
}

/// Author of a feed or a news item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Person {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub uri: Option<String>,
    pub email: Option<String>,
}

/// Channel image. A value on the feed, not an independently persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Image {
    pub url: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub description: Option<String>,
}

/// Source element of a news item: the feed it was republished from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Source {
    pub name: Option<String>,
    pub link: Option<String>,
}

/// User-defined label. Labels form a many-to-many relation with news; the
/// name is the merge identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    pub id: Option<i64>,
    pub name: String,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_permalink_defaults_true() {
        assert!(Guid::new("urn:x").is_permalink());
        assert!(Guid::permalink("urn:x", true).is_permalink());
        assert!(!Guid::permalink("urn:x", false).is_permalink());
    }

    #[test]
    fn test_guid_normalized_value_trims_one_slash() {
        assert_eq!(
            Guid::new("https://example.com/a/").normalized_value(),
            "https://example.com/a"
        );
        assert_eq!(
            Guid::new("https://example.com/a//").normalized_value(),
            "https://example.com/a/"
        );
    }
}
