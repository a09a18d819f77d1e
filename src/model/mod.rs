//! The shared mutable entity graph: feeds, news, and their sub-entities.
//!
//! Entities are addressed by persistence-assigned integer ids; parent/child
//! relations are id references, and the feed's news collection is the only
//! strong ownership relation. Mutable entities are shared between threads as
//! `Arc<EntityLock<T>>` handles ([`NewsRef`], [`FeedRef`]).

mod feed;
mod news;
mod state;
mod types;

pub use feed::{Feed, FeedRef};
pub use news::{News, NewsRef};
pub use state::State;
pub use types::{Attachment, Category, Guid, Image, Label, Person, Source};
