use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::list::reconcile_list;
use super::{is_equivalent, EntityRef, MergeError, MergeResult};
use crate::dao::IdGenerator;
use crate::model::{Attachment, Category, Feed, FeedRef, News, NewsRef, Person, State};
use crate::sync;
use crate::util::normalize_link;

// ============================================================================
// Prune thresholds
// ============================================================================

/// Above this many candidates, a single compaction pass beats removing one by
/// one. Tuned operationally; the boundary matters for behavior-compatible
/// persistence, not for correctness.
const PRUNE_COMPACT_ABSOLUTE: usize = 20;

/// Minimum candidate count before the relative rule applies.
const PRUNE_COMPACT_MIN: usize = 5;

/// Relative rule divisor: compact when candidates make up at least 1/5 of the
/// collection.
const PRUNE_COMPACT_DIVISOR: usize = 5;

// ============================================================================
// Feed-level reconciliation
// ============================================================================

/// Reconciles a freshly fetched feed against the persisted one.
///
/// Runs entirely under the persisted feed's write lock (and the incoming
/// feed's read lock, acquired first). For each persisted item an equivalent
/// incoming item is searched; matches are merged in place, stale deleted
/// items without a counterpart are pruned, and left-over incoming items are
/// adopted as new. Feed-level sub-entities are merged and scalar metadata is
/// overwritten last-write-wins.
///
/// # Arguments
///
/// * `persisted` - The feed as loaded from the store
/// * `incoming` - The transient feed produced by the fetch layer (read-only)
/// * `ids` - Identifier source for adopted items
///
/// # Returns
///
/// A [`MergeResult`] naming the complete, minimal set of entities to delete
/// and upsert. The caller never rewrites the whole feed.
///
/// # Errors
///
/// Fails fast on self-merge, on feeds with different normalized links, on a
/// stored link that no longer parses, and on lock misuse.
pub fn merge_and_clean_up(
    persisted: &FeedRef,
    incoming: &FeedRef,
    ids: &dyn IdGenerator,
) -> Result<MergeResult, MergeError> {
    if Arc::ptr_eq(persisted, incoming) {
        return Err(MergeError::SelfMerge);
    }

    // Lock ordering: source read lock before target write lock
    let incoming_feed = incoming.read();
    let mut feed = persisted.write()?;

    let persisted_link = normalize_link(&feed.link)?;
    let incoming_link = normalize_link(&incoming_feed.link)?;
    if persisted_link != incoming_link {
        return Err(MergeError::FeedLinkMismatch {
            persisted: persisted_link,
            incoming: incoming_link,
        });
    }

    let mut result = MergeResult::new();
    let synchronized = sync::is_synchronized_feed(&incoming_feed);

    // Step 1: dedup the incoming list against itself
    let deduped = dedup_incoming(incoming_feed.news(), synchronized);
    let mut pool: Vec<Option<NewsRef>> = deduped.into_iter().map(Some).collect();

    // Synchronized sources key their items by GUID, which allows a map
    // lookup instead of pairwise equivalence checks
    let guid_positions: Option<HashMap<String, usize>> = if synchronized {
        Some(
            pool.iter()
                .enumerate()
                .filter_map(|(pos, slot)| {
                    slot.as_ref().and_then(|item| {
                        item.read()
                            .guid
                            .as_ref()
                            .map(|guid| (guid.normalized_value().to_string(), pos))
                    })
                })
                .collect(),
        )
    } else {
        None
    };

    // Step 2: walk persisted items in reverse so index-based removal of the
    // prune candidates stays stable
    let mut prune: Vec<usize> = Vec::new();
    for idx in (0..feed.news_len()).rev() {
        let item = Arc::clone(&feed.news()[idx]);
        let (item_id, old_state) = {
            let guard = item.read();
            (guard.id, guard.state)
        };

        match take_match(&item, &mut pool, guid_positions.as_ref()) {
            Some(incoming_item) => {
                let sub = merge_news(&item, &incoming_item)?;
                result.absorb(sub);

                let new_state = item.read().state;
                if let Some(id) = item_id {
                    if new_state != old_state {
                        feed.index_mut().move_state(id, old_state, new_state);
                    }
                }
            }
            None if old_state == State::Deleted => prune.push(idx),
            None => {}
        }
    }

    // Step 3: prune stale deleted items without an incoming counterpart
    if !prune.is_empty() {
        prune_news(&mut feed, &prune, &mut result);
    }

    // Step 4: adopt every incoming item that never matched
    let mut adopted = 0usize;
    for candidate in pool.into_iter().flatten() {
        {
            let mut item = candidate.write()?;
            if item.id.is_none() {
                item.id = Some(ids.next());
            }
            if let Some(feed_id) = feed.id {
                item.parent_id = feed_id;
            }
            item.feed_link = feed.link.clone();
        }
        feed.add_news(candidate);
        result.mark_structural_change();
        adopted += 1;
    }
    if adopted > 0 {
        tracing::debug!(adopted = adopted, "adopted incoming news items");
    }

    // Step 5: feed-level sub-entities, then scalar metadata last-write-wins
    let mut feed_changed = merge_person_opt(&mut feed.author, incoming_feed.author.as_ref(), &mut result);
    feed_changed |= overwrite(&mut feed.image, &incoming_feed.image);

    let categories = reconcile_list(
        &mut feed.categories,
        incoming_feed.categories.clone(),
        |a, b| a.name == b.name,
        merge_category,
        |removed| {
            if let Some(id) = removed.id {
                result.add_removed(EntityRef::Category(id));
            }
        },
    );
    if categories.structural {
        result.mark_structural_change();
    }
    feed_changed |= categories.changed;

    feed_changed |= overwrite(&mut feed.title, &incoming_feed.title);
    feed_changed |= overwrite(&mut feed.description, &incoming_feed.description);
    feed_changed |= overwrite(&mut feed.homepage, &incoming_feed.homepage);
    feed_changed |= overwrite(&mut feed.language, &incoming_feed.language);
    feed_changed |= overwrite(&mut feed.copyright, &incoming_feed.copyright);
    feed_changed |= overwrite(&mut feed.docs, &incoming_feed.docs);
    feed_changed |= overwrite(&mut feed.generator, &incoming_feed.generator);
    feed_changed |= overwrite(&mut feed.webmaster, &incoming_feed.webmaster);
    feed_changed |= overwrite(&mut feed.publish_date, &incoming_feed.publish_date);
    feed_changed |= overwrite(&mut feed.build_date, &incoming_feed.build_date);
    feed_changed |= overwrite(&mut feed.ttl, &incoming_feed.ttl);
    feed_changed |= overwrite(&mut feed.format, &incoming_feed.format);

    if feed_changed {
        if let Some(id) = feed.id {
            result.add_updated(EntityRef::Feed(id));
        }
    }

    Ok(result)
}

/// Drops duplicate items from the incoming list, first occurrence winning.
///
/// Synchronized sources get a GUID-set fast path; everything else pays the
/// pairwise equivalence comparison.
fn dedup_incoming(items: &[NewsRef], synchronized: bool) -> Vec<NewsRef> {
    let mut kept: Vec<NewsRef> = Vec::with_capacity(items.len());

    if synchronized {
        let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
        for item in items {
            let key = item
                .read()
                .guid
                .as_ref()
                .map(|guid| guid.normalized_value().to_string());
            if let Some(key) = key {
                if !seen.insert(key) {
                    continue;
                }
            }
            kept.push(Arc::clone(item));
        }
    } else {
        for item in items {
            let guard = item.read();
            let duplicate = kept.iter().any(|k| is_equivalent(&k.read(), &guard));
            if !duplicate {
                kept.push(Arc::clone(item));
            }
        }
    }

    if kept.len() < items.len() {
        tracing::debug!(
            dropped = items.len() - kept.len(),
            "dropped duplicate items from incoming feed"
        );
    }
    kept
}

/// Finds and removes the incoming item equivalent to `persisted`, if any.
fn take_match(
    persisted: &NewsRef,
    pool: &mut [Option<NewsRef>],
    guid_positions: Option<&HashMap<String, usize>>,
) -> Option<NewsRef> {
    let guard = persisted.read();

    if let Some(positions) = guid_positions {
        let guid = guard.guid.as_ref()?;
        let &pos = positions.get(guid.normalized_value())?;
        return pool[pos].take();
    }

    for slot in pool.iter_mut() {
        let matches = slot
            .as_ref()
            .is_some_and(|candidate| is_equivalent(&guard, &candidate.read()));
        if matches {
            return slot.take();
        }
    }
    None
}

/// Removes the prune candidates, choosing between a single compaction pass
/// and one-by-one removal by the tuned thresholds. Both strategies produce
/// the identical resulting sequence; the choice is purely about cost.
fn prune_news(feed: &mut Feed, prune: &[usize], result: &mut MergeResult) {
    let total = feed.news_len();
    let candidates = prune.len();

    let removed_ids: Vec<i64> = prune
        .iter()
        .filter_map(|&idx| feed.news()[idx].read().id)
        .collect();
    for id in removed_ids {
        result.add_removed(EntityRef::News(id));
        if !feed.index_mut().remove(id, State::Deleted) {
            // The index's bookkeeping went stale; evict from wherever it sits
            if let Some(actual) = feed.index_mut().find(id) {
                feed.index_mut().remove(id, actual);
            }
        }
    }

    let compact = candidates > PRUNE_COMPACT_ABSOLUTE
        || (candidates >= PRUNE_COMPACT_MIN && candidates * PRUNE_COMPACT_DIVISOR >= total);

    if compact {
        tracing::debug!(
            candidates = candidates,
            total = total,
            "pruning stale deleted news via compaction pass"
        );
        let prune_set: HashSet<usize> = prune.iter().copied().collect();
        let mut position = 0usize;
        feed.news_mut().retain(|_| {
            let keep = !prune_set.contains(&position);
            position += 1;
            keep
        });
    } else {
        tracing::debug!(
            candidates = candidates,
            total = total,
            "pruning stale deleted news one by one"
        );
        // Candidate indices are descending from the reverse walk, so
        // index-based removal never shifts a later candidate
        for &idx in prune {
            feed.news_mut().remove(idx);
        }
    }

    result.mark_structural_change();
}

// ============================================================================
// Item-level reconciliation
// ============================================================================

/// Merges an incoming news item into the persisted one.
///
/// Executed while holding the persisted item's write lock and the incoming
/// item's read lock, in that acquisition order (source read before target
/// write). Content sub-merges are skipped for unchanged items from
/// synchronized sources; lifecycle state is always merged.
///
/// # Errors
///
/// Fails fast when both handles denote the same entity, and on lock misuse.
pub fn merge_news(persisted: &NewsRef, incoming: &NewsRef) -> Result<MergeResult, MergeError> {
    if Arc::ptr_eq(persisted, incoming) {
        return Err(MergeError::SelfMerge);
    }

    let incoming_guard = incoming.read();
    let mut persisted_guard = persisted.write()?;

    let mut result = MergeResult::new();
    merge_news_into(&mut persisted_guard, &incoming_guard, &mut result);
    Ok(result)
}

fn merge_news_into(persisted: &mut News, incoming: &News, result: &mut MergeResult) {
    let was_modified = persisted.modified_date != incoming.modified_date
        || persisted.publish_date != incoming.publish_date
        || persisted.title != incoming.title;
    let synchronized = sync::is_synchronized(incoming);

    // Synchronized sources resend hundreds of unchanged items per poll;
    // content sub-merges are skipped entirely unless content actually changed
    let only_user_state = synchronized && !was_modified;

    // State is always merged
    let mut changed = merge_state(persisted, incoming, synchronized);

    // User state carried by the synchronization service
    if synchronized && persisted.is_visible() {
        changed |= merge_labels(persisted, incoming);
        changed |= overwrite(&mut persisted.flagged, &incoming.flagged);
    }

    if !only_user_state {
        let attachments = reconcile_list(
            &mut persisted.attachments,
            incoming.attachments.clone(),
            |a, b| a.link == b.link,
            merge_attachment,
            |removed| {
                if let Some(id) = removed.id {
                    result.add_removed(EntityRef::Attachment(id));
                }
            },
        );
        if attachments.structural {
            result.mark_structural_change();
        }
        changed |= attachments.changed;

        let categories = reconcile_list(
            &mut persisted.categories,
            incoming.categories.clone(),
            |a, b| a.name == b.name,
            merge_category,
            |removed| {
                if let Some(id) = removed.id {
                    result.add_removed(EntityRef::Category(id));
                }
            },
        );
        if categories.structural {
            result.mark_structural_change();
        }
        changed |= categories.changed;

        changed |= merge_person_opt(&mut persisted.author, incoming.author.as_ref(), result);
        changed |= overwrite(&mut persisted.source, &incoming.source);
        changed |= overwrite(&mut persisted.guid, &incoming.guid);

        // Descriptions can be large; only compared when the cheap fields
        // already proved the item changed
        if was_modified && persisted.description != incoming.description {
            persisted.description = incoming.description.clone();
            persisted.clear_transient_description();
            changed = true;
        }

        changed |= overwrite(&mut persisted.title, &incoming.title);
        changed |= overwrite(&mut persisted.link, &incoming.link);
        changed |= overwrite(&mut persisted.publish_date, &incoming.publish_date);
        changed |= overwrite(&mut persisted.modified_date, &incoming.modified_date);
        changed |= overwrite(&mut persisted.comments, &incoming.comments);
        changed |= overwrite(&mut persisted.in_reply_to, &incoming.in_reply_to);
        changed |= overwrite(&mut persisted.rating, &incoming.rating);
    }

    if changed || result.structural_change() {
        if let Some(id) = persisted.id {
            result.add_updated(EntityRef::News(id));
        }
    }
}

/// Lifecycle state merge. Returns whether the state changed.
fn merge_state(persisted: &mut News, incoming: &News, synchronized: bool) -> bool {
    let mut incoming_state = incoming.state;

    // Out-of-band signals from the synchronization service take precedence
    // over the incoming item's nominal state
    if synchronized && persisted.is_visible() {
        if sync::marked_read(incoming) {
            incoming_state = State::Read;
        } else if sync::marked_unread(incoming) {
            incoming_state = State::Unread;
        }
    }

    // Never downgrade back to NEW through a merge
    if incoming_state != persisted.state && incoming_state != State::New {
        persisted.state = incoming_state;
        return true;
    }

    // Content changed after the user consumed the item
    if persisted.state.is_consumed() && !synchronized && persisted.title != incoming.title {
        persisted.state = State::Updated;
        return true;
    }

    false
}

/// Label merge by set difference: add labels only the incoming item carries,
/// drop labels only the persisted item carries.
fn merge_labels(persisted: &mut News, incoming: &News) -> bool {
    let mut changed = false;

    let incoming_names: HashSet<&str> = incoming
        .labels
        .iter()
        .map(|label| label.name.as_str())
        .collect();
    let before = persisted.labels.len();
    persisted
        .labels
        .retain(|label| incoming_names.contains(label.name.as_str()));
    changed |= persisted.labels.len() != before;

    for label in &incoming.labels {
        if !persisted.has_label(&label.name) {
            persisted.labels.push(label.clone());
            changed = true;
        }
    }

    changed
}

fn merge_attachment(existing: &mut Attachment, incoming: Attachment) -> bool {
    let mut changed = overwrite(&mut existing.mime_type, &incoming.mime_type);
    changed |= overwrite(&mut existing.length, &incoming.length);
    changed
}

fn merge_category(existing: &mut Category, incoming: Category) -> bool {
    overwrite(&mut existing.domain, &incoming.domain)
}

/// Nested merge of an optional person entity (author). A vanished incoming
/// author removes the persisted one and records the deletion.
fn merge_person_opt(
    existing: &mut Option<Person>,
    incoming: Option<&Person>,
    result: &mut MergeResult,
) -> bool {
    match (existing.take(), incoming) {
        (None, None) => false,
        (Some(mut current), Some(other)) => {
            let mut changed = overwrite(&mut current.name, &other.name);
            changed |= overwrite(&mut current.uri, &other.uri);
            changed |= overwrite(&mut current.email, &other.email);
            *existing = Some(current);
            changed
        }
        (None, Some(other)) => {
            *existing = Some(other.clone());
            true
        }
        (Some(current), None) => {
            if let Some(id) = current.id {
                result.add_removed(EntityRef::Person(id));
            }
            true
        }
    }
}

/// Last-write-wins field update with change detection.
fn overwrite<T: PartialEq + Clone>(target: &mut T, source: &T) -> bool {
    if target != source {
        *target = source.clone();
        true
    } else {
        false
    }
}
