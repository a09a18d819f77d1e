/// Outcome of a generic list reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ListMergeOutcome {
    /// Any element was added, removed, or modified.
    pub changed: bool,
    /// Membership or ordering changed (element added or removed), as opposed
    /// to field updates on matched elements.
    pub structural: bool,
}

/// Reconciles an owned list against an incoming one.
///
/// The same match/merge/remove/append pattern is shared by attachments and
/// category lists, parameterized instead of repeated:
///
/// - `same` decides whether an existing and an incoming element denote the
///   same entity (attachment link, category name),
/// - `merge_one` folds a matched incoming element into the existing one and
///   reports whether anything changed,
/// - `on_removed` observes every existing element that had no incoming match
///   before it is dropped, so the caller can record deletions.
///
/// Existing elements are walked in reverse so index-based removal stays
/// stable; unmatched incoming elements are appended in their arrival order.
pub(crate) fn reconcile_list<T, Same, MergeOne, OnRemoved>(
    existing: &mut Vec<T>,
    incoming: Vec<T>,
    mut same: Same,
    mut merge_one: MergeOne,
    mut on_removed: OnRemoved,
) -> ListMergeOutcome
where
    Same: FnMut(&T, &T) -> bool,
    MergeOne: FnMut(&mut T, T) -> bool,
    OnRemoved: FnMut(&T),
{
    let mut outcome = ListMergeOutcome::default();
    let mut pool: Vec<Option<T>> = incoming.into_iter().map(Some).collect();

    for idx in (0..existing.len()).rev() {
        let matched = pool.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|candidate| same(&existing[idx], candidate))
        });
        match matched {
            Some(pos) => {
                if let Some(candidate) = pool[pos].take() {
                    if merge_one(&mut existing[idx], candidate) {
                        outcome.changed = true;
                    }
                }
            }
            None => {
                let removed = existing.remove(idx);
                on_removed(&removed);
                outcome.changed = true;
                outcome.structural = true;
            }
        }
    }

    for candidate in pool.into_iter().flatten() {
        existing.push(candidate);
        outcome.changed = true;
        outcome.structural = true;
    }

    outcome
}
