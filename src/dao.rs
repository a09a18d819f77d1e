//! Contracts between the engine and the embedding application.
//!
//! The engine never issues writes. After a merge it hands back a
//! [`crate::merge::MergeResult`] and the application persists exactly the
//! entities named there: delete the removed set, upsert the updated set.
//! Newly adopted items need identifiers before they can be indexed, so the
//! engine asks an [`IdGenerator`] during adoption.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::merge::EntityRef;
use crate::model::{Feed, News};

/// Identifier source for newly adopted entities.
///
/// Implemented by the persistence layer, typically backed by the store's id
/// sequence. Ids must be unique per process lifetime; the engine never
/// recycles them.
pub trait IdGenerator: Send + Sync {
    fn next(&self) -> i64;
}

/// In-memory sequential id source for embedders without a database, and for
/// tests.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    next: AtomicI64,
}

impl SequenceIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }
}

impl Default for SequenceIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn next(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Persistence contract the embedding application implements.
///
/// `save_*` upserts by id; `delete` removes by the typed reference. Composite
/// lookups (feed by link) exist because feed identity is the normalized link
/// text, not the numeric id.
pub trait FeedDao {
    type Error;

    fn load_feed(&self, id: i64) -> Result<Option<Feed>, Self::Error>;
    fn load_feed_by_link(&self, link: &str) -> Result<Option<Feed>, Self::Error>;
    fn save_feed(&mut self, feed: &Feed) -> Result<(), Self::Error>;
    fn save_news(&mut self, news: &News) -> Result<(), Self::Error>;
    fn delete(&mut self, entity: EntityRef) -> Result<(), Self::Error>;
}
