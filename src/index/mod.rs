//! Compact identifier indexing for news lifecycle states.
//!
//! The index answers "how many unread items?" and "which ids are visible?"
//! without touching the entity graph:
//!
//! - [`IdList`] - a growable array of 64-bit identifiers, sorted or
//!   insertion-ordered
//! - [`StateIndex`] - one [`IdList`] bucket per lifecycle [`crate::model::State`]
//!
//! The UI layer only queries the index; all mutation happens inside the merge
//! engine while the owning feed's write lock is held.

mod id_list;
mod state_index;

pub use id_list::IdList;
pub use state_index::{ReplaceOutcome, StateIndex};
