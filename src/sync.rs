//! Conventions for synchronized sources.
//!
//! A synchronized feed is one whose read/unread state is authoritative from
//! an external service. The fetch layer marks such items through two
//! mechanisms the engine consumes but does not own:
//!
//! - item GUIDs carry the service's item-tag prefix, and
//! - explicit read/unread markers arrive as boolean values in the item's
//!   string-keyed property bag.
//!
//! The exact key strings and the GUID prefix are the external contract with
//! the synchronization layer; nothing here interprets them beyond presence.

use crate::model::{Feed, News};

/// Property key: the external service marked this item read.
pub const PROP_MARKED_READ: &str = "sync.markedRead";

/// Property key: the external service marked this item unread.
pub const PROP_MARKED_UNREAD: &str = "sync.markedUnread";

/// GUID prefix identifying items that originate from a synchronized source.
pub const SYNC_ITEM_PREFIX: &str = "reader://item/";

/// Link scheme identifying feeds that are mirrored from a synchronized
/// service rather than fetched from the open web.
pub const SYNC_FEED_SCHEME: &str = "reader://";

/// Whether this item originates from a synchronized source.
pub fn is_synchronized(news: &News) -> bool {
    news.guid
        .as_ref()
        .is_some_and(|guid| guid.value.starts_with(SYNC_ITEM_PREFIX))
}

/// Whether this feed is mirrored from a synchronized service.
pub fn is_synchronized_feed(feed: &Feed) -> bool {
    feed.link.starts_with(SYNC_FEED_SCHEME)
}

/// Out-of-band "marked read" signal.
pub fn marked_read(news: &News) -> bool {
    news.bool_property(PROP_MARKED_READ)
}

/// Out-of-band "marked unread" signal.
pub fn marked_unread(news: &News) -> bool {
    news.bool_property(PROP_MARKED_UNREAD)
}
