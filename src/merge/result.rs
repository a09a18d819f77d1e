use std::collections::HashSet;

/// Typed reference to a persistable entity, the unit of the persistence
/// contract. A closed variant set: the engine never hands back anything the
/// DAO layer cannot dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Feed(i64),
    News(i64),
    Attachment(i64),
    Category(i64),
    Person(i64),
    Label(i64),
}

/// Accumulated outcome of a merge pass.
///
/// Two disjoint sets: entities the caller must delete and entities the caller
/// must upsert. An entity cannot be in both at once; recording it in one set
/// evicts it from the other. The `structural_change` flag is a monotonic OR
/// over every contributing sub-merge and signals that collection membership
/// or ordering changed, as opposed to mere field updates.
///
/// Not separately synchronized; only touched while holding the owning
/// entity's write lock.
#[derive(Debug, Default)]
pub struct MergeResult {
    updated: HashSet<EntityRef>,
    removed: HashSet<EntityRef>,
    structural_change: bool,
}

impl MergeResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an entity to upsert, evicting it from the removed set.
    pub fn add_updated(&mut self, entity: EntityRef) {
        self.removed.remove(&entity);
        self.updated.insert(entity);
    }

    /// Records an entity to delete, evicting it from the updated set.
    pub fn add_removed(&mut self, entity: EntityRef) {
        self.updated.remove(&entity);
        self.removed.insert(entity);
    }

    pub fn mark_structural_change(&mut self) {
        self.structural_change = true;
    }

    pub fn structural_change(&self) -> bool {
        self.structural_change
    }

    pub fn updated(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.updated.iter().copied()
    }

    pub fn removed(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.removed.iter().copied()
    }

    pub fn is_updated(&self, entity: EntityRef) -> bool {
        self.updated.contains(&entity)
    }

    pub fn is_removed(&self, entity: EntityRef) -> bool {
        self.removed.contains(&entity)
    }

    /// Nothing to persist: both sets empty and no structural change.
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty() && !self.structural_change
    }

    /// Folds a sub-merge result into this one, preserving set disjointness.
    pub fn absorb(&mut self, other: MergeResult) {
        for entity in other.updated {
            self.add_updated(entity);
        }
        for entity in other.removed {
            self.add_removed(entity);
        }
        self.structural_change |= other.structural_change;
    }
}
