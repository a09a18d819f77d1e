use serde::{Deserialize, Serialize};

/// Growable array of 64-bit identifiers.
///
/// Two flavors, chosen at construction time:
///
/// - **sorted**: insertions keep ascending order, membership checks use
///   binary search. Used for the large NEW bucket where lookups dominate.
/// - **insertion-ordered**: plain append, linear membership scan. Cheaper for
///   the small buckets where order of arrival matters to callers.
///
/// Duplicate identifiers are a caller bug; the list does not police them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdList {
    ids: Vec<i64>,
    sorted: bool,
}

impl IdList {
    pub fn new(sorted: bool) -> Self {
        Self {
            ids: Vec::new(),
            sorted,
        }
    }

    pub fn with_capacity(sorted: bool, capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            sorted,
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        if self.sorted {
            self.ids.binary_search(&id).is_ok()
        } else {
            self.ids.contains(&id)
        }
    }

    /// Adds an identifier. Sorted lists insert at the binary-search position,
    /// insertion-ordered lists append.
    pub fn add(&mut self, id: i64) {
        if self.sorted {
            let pos = self.ids.binary_search(&id).unwrap_or_else(|pos| pos);
            self.ids.insert(pos, id);
        } else {
            self.ids.push(id);
        }
    }

    /// Removes an identifier by value, preserving the order of the rest.
    /// Returns whether the identifier was present.
    pub fn remove(&mut self, id: i64) -> bool {
        let pos = if self.sorted {
            self.ids.binary_search(&id).ok()
        } else {
            self.ids.iter().position(|&candidate| candidate == id)
        };
        match pos {
            Some(pos) => {
                self.ids.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Replaces the whole content with `incoming`, returning whether the
    /// membership actually changed. Sorted lists re-sort the incoming ids;
    /// insertion-ordered lists keep the incoming order.
    pub fn replace(&mut self, incoming: &[i64]) -> bool {
        let changed = self.ids.len() != incoming.len()
            || incoming.iter().any(|&id| !self.contains(id));

        self.ids.clear();
        self.ids.extend_from_slice(incoming);
        if self.sorted {
            self.ids.sort_unstable();
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.ids
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_add_keeps_order() {
        let mut list = IdList::new(true);
        for id in [5, 1, 3, 2, 4] {
            list.add(id);
        }
        assert_eq!(list.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_unsorted_add_keeps_insertion_order() {
        let mut list = IdList::new(false);
        for id in [5, 1, 3] {
            list.add(id);
        }
        assert_eq!(list.as_slice(), &[5, 1, 3]);
    }

    #[test]
    fn test_contains_both_flavors() {
        let mut sorted = IdList::new(true);
        let mut unsorted = IdList::new(false);
        for id in [10, 20, 30] {
            sorted.add(id);
            unsorted.add(id);
        }
        assert!(sorted.contains(20));
        assert!(!sorted.contains(25));
        assert!(unsorted.contains(20));
        assert!(!unsorted.contains(25));
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut list = IdList::new(false);
        for id in [7, 8, 9] {
            list.add(id);
        }
        assert!(list.remove(8));
        assert_eq!(list.as_slice(), &[7, 9]);
        assert!(!list.remove(8));
    }

    #[test]
    fn test_replace_detects_membership_change() {
        let mut list = IdList::new(true);
        for id in [1, 2, 3] {
            list.add(id);
        }
        // Same membership, different input order: no change
        assert!(!list.replace(&[3, 1, 2]));
        // One id swapped out: change
        assert!(list.replace(&[2, 3, 4]));
        assert_eq!(list.as_slice(), &[2, 3, 4]);
    }
}
