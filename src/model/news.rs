use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Attachment, Category, Guid, Label, Person, Source, State};
use crate::lock::EntityLock;

/// Shared handle to a lockable news entity.
pub type NewsRef = Arc<EntityLock<News>>;

/// Transient description cache.
///
/// The description record is persisted separately from the news row for
/// storage reasons; the in-memory entity carries this cache on top of it.
/// Once explicitly set, the transient value wins over the persisted record
/// until cleared. Never serialized.
#[derive(Debug, Clone, Default)]
enum TransientDescription {
    #[default]
    Unset,
    Set(Option<String>),
}

/// A single news item.
///
/// Belongs to exactly one container (a feed, or a bin-like container
/// referenced by `parent_id`). The container relation is an id reference;
/// `feed_link` carries the owner feed's identity text so the equivalence
/// resolver can compare ownership without chasing the reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct News {
    /// Persistence-assigned identifier; `None` until first saved or adopted.
    pub id: Option<i64>,
    /// Id of the owning feed or bin.
    pub parent_id: i64,
    /// Normalized link text of the owning feed.
    pub feed_link: String,

    pub title: Option<String>,
    pub link: Option<String>,
    pub guid: Option<Guid>,

    /// Epoch seconds, as provided by the source.
    pub publish_date: Option<i64>,
    /// Epoch seconds, as provided by the source.
    pub modified_date: Option<i64>,
    /// Epoch seconds, stamped when the item was first received.
    pub received_date: i64,

    pub state: State,
    /// Flagged/sticky bit.
    pub flagged: bool,
    pub rating: Option<i64>,

    pub comments: Option<String>,
    pub in_reply_to: Option<String>,

    pub labels: Vec<Label>,
    pub attachments: Vec<Attachment>,
    pub categories: Vec<Category>,
    pub author: Option<Person>,
    pub source: Option<Source>,

    /// Persisted description record value.
    pub description: Option<String>,
    #[serde(skip)]
    transient_description: TransientDescription,

    /// Generic string-keyed property bag for out-of-band signals set by
    /// external sources. The key convention is not owned by this crate.
    pub properties: HashMap<String, Value>,
}

impl News {
    /// Creates a fresh item in state NEW with the receive date stamped.
    pub fn new(parent_id: i64, feed_link: impl Into<String>) -> Self {
        Self {
            id: None,
            parent_id,
            feed_link: feed_link.into(),
            title: None,
            link: None,
            guid: None,
            publish_date: None,
            modified_date: None,
            received_date: chrono::Utc::now().timestamp(),
            state: State::New,
            flagged: false,
            rating: None,
            comments: None,
            in_reply_to: None,
            labels: Vec::new(),
            attachments: Vec::new(),
            categories: Vec::new(),
            author: None,
            source: None,
            description: None,
            transient_description: TransientDescription::Unset,
            properties: HashMap::new(),
        }
    }

    pub fn into_ref(self) -> NewsRef {
        Arc::new(EntityLock::new(self))
    }

    pub fn is_visible(&self) -> bool {
        self.state.is_visible()
    }

    // ========================================================================
    // Description
    // ========================================================================

    /// Effective description: the transient value if one was explicitly set,
    /// the persisted record otherwise.
    pub fn effective_description(&self) -> Option<&str> {
        match &self.transient_description {
            TransientDescription::Set(value) => value.as_deref(),
            TransientDescription::Unset => self.description.as_deref(),
        }
    }

    /// Sets the transient description. An explicit `None` still counts as
    /// set and hides the persisted record until cleared.
    pub fn set_transient_description(&mut self, value: Option<String>) {
        self.transient_description = TransientDescription::Set(value);
    }

    pub fn clear_transient_description(&mut self) {
        self.transient_description = TransientDescription::Unset;
    }

    // ========================================================================
    // Labels
    // ========================================================================

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }

    pub fn add_label(&mut self, label: Label) -> bool {
        if self.has_label(&label.name) {
            return false;
        }
        self.labels.push(label);
        true
    }

    pub fn remove_label(&mut self, name: &str) -> bool {
        let before = self.labels.len();
        self.labels.retain(|l| l.name != name);
        self.labels.len() != before
    }

    // ========================================================================
    // Properties
    // ========================================================================

    pub fn set_property(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(key.into(), value);
    }

    /// Reads a boolean-valued out-of-band property; absent or non-boolean
    /// values read as `false`.
    pub fn bool_property(&self, key: &str) -> bool {
        self.properties
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
