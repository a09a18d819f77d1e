//! Equivalence resolution and the reconciliation passes.
//!
//! Entry points:
//!
//! - [`merge_and_clean_up`] - feed-level reconciliation of freshly fetched
//!   content against the persisted feed
//! - [`merge_news`] - item-level merge under the entity locks
//! - [`is_equivalent`] - the "same logical article" relation
//!
//! Merges mutate the persisted entities in place and return a [`MergeResult`]
//! naming exactly what the caller must persist. Nothing here performs I/O.

mod engine;
mod equivalence;
mod list;
mod result;

pub use engine::{merge_and_clean_up, merge_news};
pub use equivalence::is_equivalent;
pub use result::{EntityRef, MergeResult};

use thiserror::Error;

use crate::lock::LockError;

/// Merge precondition and concurrency failures.
///
/// These are fail-fast conditions, never silently ignored. Ordinary merge
/// mismatches (no equivalent item found, nothing to prune) are expected
/// branches of the algorithm and do not surface here.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Merging an entity with itself is a caller bug.
    #[error("an entity cannot be merged with itself")]
    SelfMerge,

    /// Feeds are identified by their normalized link; merging feeds with
    /// different identities is a caller bug.
    #[error("cannot merge feeds with different identities: '{persisted}' vs '{incoming}'")]
    FeedLinkMismatch {
        persisted: String,
        incoming: String,
    },

    /// A stored link failed to parse. State corruption, surfaced at the
    /// point of use.
    #[error("stored link cannot be parsed as a URI: '{0}'")]
    CorruptLink(String),

    /// Lock acquisition detected a programming error.
    #[error(transparent)]
    Lock(#[from] LockError),
}
