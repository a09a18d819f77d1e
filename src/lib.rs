//! Feed/news reconciliation engine.
//!
//! This crate is the merge core of a feed reader: it matches freshly fetched
//! news items against previously persisted ones, merges matches, adopts new
//! items, prunes stale deleted ones, and reports exactly what the caller must
//! persist. The surrounding layers (fetching, storage, presentation) are host
//! responsibilities; the engine never performs I/O.
//!
//! # Architecture
//!
//! The crate is organized into five areas:
//!
//! - [`lock`] - Per-entity reader/writer locking with a fail-fast deadlock check
//! - [`index`] - Per-state identifier buckets for counting and enumeration
//! - [`model`] - The Feed/News entity graph shared between threads
//! - [`merge`] - Equivalence resolution and the reconciliation passes
//! - [`dao`] - The contracts the embedding application implements
//!
//! # Example
//!
//! ```ignore
//! use riffle::dao::SequenceIdGenerator;
//! use riffle::merge::merge_and_clean_up;
//!
//! // Reconcile a freshly fetched feed against the persisted one.
//! let result = merge_and_clean_up(&persisted, incoming, &ids)?;
//! for entity in result.removed() { dao.delete(entity)?; }
//! for entity in result.updated() { dao.save(entity)?; }
//! ```

pub mod dao;
pub mod index;
pub mod lock;
pub mod merge;
pub mod model;
pub mod sync;
pub mod util;

pub use lock::{EntityLock, LockError};
pub use merge::{merge_and_clean_up, merge_news, EntityRef, MergeError, MergeResult};
pub use model::{Feed, FeedRef, News, NewsRef, State};
