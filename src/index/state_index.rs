use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::IdList;
use crate::model::State;

/// Outcome of a bulk [`StateIndex::replace_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Membership of at least one bucket changed.
    pub changed: bool,
    /// The NEW bucket gained identifiers it did not have before. Callers use
    /// this to decide whether to raise an unread-count notification.
    pub new_news_added: bool,
}

/// Per-state identifier index over one news container.
///
/// Exactly one bucket per [`State`]. The NEW bucket is sorted because it is
/// the largest in practice and dominates membership checks; the remaining
/// buckets are insertion-ordered and scanned linearly.
///
/// Invariant: an identifier appears in at most one bucket at a time, and the
/// total membership equals the logical size of the indexed container.
/// Violations are correctness bugs and are debug-asserted, not tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateIndex {
    buckets: [IdList; State::COUNT],
}

impl Default for StateIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl StateIndex {
    pub fn new() -> Self {
        Self {
            buckets: [
                IdList::new(true), // NEW: sorted for fast membership at scale
                IdList::new(false),
                IdList::new(false),
                IdList::new(false),
                IdList::new(false),
            ],
        }
    }

    fn bucket(&self, state: State) -> &IdList {
        &self.buckets[state as usize]
    }

    fn bucket_mut(&mut self, state: State) -> &mut IdList {
        &mut self.buckets[state as usize]
    }

    /// Adds an identifier under the given state.
    pub fn add(&mut self, id: i64, state: State) {
        debug_assert!(
            self.find(id).is_none(),
            "identifier {id} already indexed under {:?}",
            self.find(id)
        );
        self.bucket_mut(state).add(id);
    }

    /// Removes an identifier from the given state's bucket. Returns whether
    /// it was present there.
    pub fn remove(&mut self, id: i64, state: State) -> bool {
        self.bucket_mut(state).remove(id)
    }

    /// Moves an identifier between state buckets.
    ///
    /// When `old` turns out not to contain the identifier (the caller's
    /// bookkeeping went stale), every non-NEW bucket other than the target is
    /// searched as a fallback before giving up. Returns whether the
    /// identifier ended up moved.
    pub fn move_state(&mut self, id: i64, old: State, new: State) -> bool {
        if old == new {
            return false;
        }

        let mut found = self.bucket_mut(old).remove(id);
        if !found {
            for state in State::ALL {
                if state == State::New || state == new || state == old {
                    continue;
                }
                if self.bucket_mut(state).remove(id) {
                    tracing::debug!(
                        id = id,
                        expected = ?old,
                        actual = ?state,
                        "state index fallback located identifier in another bucket"
                    );
                    found = true;
                    break;
                }
            }
        }
        if !found {
            return false;
        }

        debug_assert!(
            self.find(id).is_none(),
            "identifier {id} present in two buckets"
        );
        self.bucket_mut(new).add(id);
        true
    }

    /// Bulk-replaces every bucket from freshly fetched content.
    ///
    /// States absent from `incoming` are treated as empty. The NEW bucket
    /// additionally reports whether genuinely new identifiers arrived (any id
    /// not previously present, or any size growth).
    pub fn replace_all(&mut self, incoming: &HashMap<State, Vec<i64>>) -> ReplaceOutcome {
        static EMPTY: &[i64] = &[];

        let mut outcome = ReplaceOutcome::default();
        for state in State::ALL {
            let ids = incoming.get(&state).map_or(EMPTY, Vec::as_slice);
            if state == State::New {
                let bucket = self.bucket(State::New);
                outcome.new_news_added = ids.len() > bucket.len()
                    || ids.iter().any(|&id| !bucket.contains(id));
            }
            outcome.changed |= self.bucket_mut(state).replace(ids);
        }
        outcome
    }

    pub fn contains(&self, id: i64, state: State) -> bool {
        self.bucket(state).contains(id)
    }

    /// Returns the bucket currently holding the identifier, if any.
    pub fn find(&self, id: i64) -> Option<State> {
        State::ALL.into_iter().find(|&s| self.bucket(s).contains(id))
    }

    /// Sums the sizes of the selected buckets.
    pub fn count(&self, states: &[State]) -> usize {
        states.iter().map(|&s| self.bucket(s).len()).sum()
    }

    /// Concatenates the selected buckets' identifiers. Order within a bucket
    /// reflects bucket ordering; order across buckets follows `states`.
    pub fn enumerate(&self, states: &[State]) -> Vec<i64> {
        let mut out = Vec::with_capacity(self.count(states));
        for &state in states {
            out.extend(self.bucket(state).iter());
        }
        out
    }

    /// Total membership across all buckets. Must equal the logical size of
    /// the indexed container.
    pub fn total_len(&self) -> usize {
        self.buckets.iter().map(IdList::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_count() {
        let mut index = StateIndex::new();
        index.add(1, State::New);
        index.add(2, State::Unread);
        index.add(3, State::Read);
        assert_eq!(index.count(&[State::New, State::Unread]), 2);
        assert_eq!(index.total_len(), 3);
    }

    #[test]
    fn test_move_state_basic() {
        let mut index = StateIndex::new();
        index.add(1, State::New);
        assert!(index.move_state(1, State::New, State::Read));
        assert!(index.contains(1, State::Read));
        assert!(!index.contains(1, State::New));
    }

    #[test]
    fn test_move_state_same_state_is_noop() {
        let mut index = StateIndex::new();
        index.add(1, State::Read);
        assert!(!index.move_state(1, State::Read, State::Read));
        assert!(index.contains(1, State::Read));
    }

    #[test]
    fn test_move_state_fallback_searches_other_buckets() {
        let mut index = StateIndex::new();
        index.add(1, State::Updated);
        // Caller believes the item is READ; it actually sits in UPDATED
        assert!(index.move_state(1, State::Read, State::Deleted));
        assert!(index.contains(1, State::Deleted));
        assert_eq!(index.total_len(), 1);
    }

    #[test]
    fn test_move_state_unknown_id_gives_up() {
        let mut index = StateIndex::new();
        assert!(!index.move_state(99, State::Read, State::Deleted));
        assert_eq!(index.total_len(), 0);
    }

    #[test]
    fn test_replace_all_detects_new_news() {
        let mut index = StateIndex::new();
        index.add(1, State::New);
        index.add(2, State::New);
        index.add(3, State::New);

        let mut incoming = HashMap::new();
        incoming.insert(State::New, vec![2, 3, 4]);
        let outcome = index.replace_all(&incoming);

        assert!(outcome.changed);
        assert!(outcome.new_news_added);
        assert_eq!(index.enumerate(&[State::New]), vec![2, 3, 4]);
    }

    #[test]
    fn test_replace_all_same_content_reports_nothing() {
        let mut index = StateIndex::new();
        index.add(1, State::New);
        index.add(5, State::Read);

        let mut incoming = HashMap::new();
        incoming.insert(State::New, vec![1]);
        incoming.insert(State::Read, vec![5]);
        let outcome = index.replace_all(&incoming);

        assert!(!outcome.changed);
        assert!(!outcome.new_news_added);
    }

    #[test]
    fn test_replace_all_shrinking_new_is_not_new_news() {
        let mut index = StateIndex::new();
        index.add(1, State::New);
        index.add(2, State::New);

        let mut incoming = HashMap::new();
        incoming.insert(State::New, vec![1]);
        let outcome = index.replace_all(&incoming);

        assert!(outcome.changed);
        assert!(!outcome.new_news_added);
    }

    #[test]
    fn test_enumerate_follows_caller_state_order() {
        let mut index = StateIndex::new();
        index.add(10, State::Read);
        index.add(11, State::Read);
        index.add(1, State::New);

        assert_eq!(
            index.enumerate(&[State::Read, State::New]),
            vec![10, 11, 1]
        );
    }
}
