//! Integration tests for feed-level reconciliation: match, merge, prune,
//! adopt, and the persistence handshake through the merge result.
//!
//! Each test builds its own persisted/incoming entity graphs; nothing is
//! shared between tests.

use pretty_assertions::assert_eq;

use riffle::dao::{FeedDao, SequenceIdGenerator};
use riffle::model::{Feed, FeedRef, Guid, News, State};
use riffle::{merge_and_clean_up, EntityRef, MergeError};

const FEED_LINK: &str = "https://example.com/feed";

fn persisted_feed() -> Feed {
    let mut feed = Feed::new(FEED_LINK);
    feed.id = Some(1);
    feed
}

fn item(id: Option<i64>, guid: &str, title: &str, state: State) -> News {
    let mut news = News::new(1, FEED_LINK);
    news.id = id;
    news.guid = Some(Guid::new(guid));
    news.title = Some(title.to_string());
    news.state = state;
    news
}

// ============================================================================
// Matching and state transitions
// ============================================================================

#[test]
fn test_guid_match_with_title_change_marks_updated_and_adopts_new() {
    let mut feed = persisted_feed();
    feed.add_news(item(Some(10), "g1", "A title", State::Read).into_ref());
    feed.add_news(item(Some(11), "g2", "B title", State::New).into_ref());
    let persisted = feed.into_ref();

    let mut incoming = persisted_feed();
    incoming.id = None;
    incoming.add_news(item(None, "g1", "A title, revised", State::New).into_ref());
    incoming.add_news(item(None, "g3", "C title", State::New).into_ref());
    let incoming = incoming.into_ref();

    let ids = SequenceIdGenerator::starting_at(100);
    let result = merge_and_clean_up(&persisted, &incoming, &ids).unwrap();

    // A is matched via GUID and updated; C's adoption is a structural change
    assert_eq!(result.updated().collect::<Vec<_>>(), vec![EntityRef::News(10)]);
    assert_eq!(result.removed().count(), 0);
    assert!(result.structural_change());

    let feed = persisted.read();
    assert_eq!(feed.news_len(), 3);

    let a = feed.news()[0].read();
    assert_eq!(a.state, State::Updated, "consumed item with new title");
    assert_eq!(a.title.as_deref(), Some("A title, revised"));

    // B had no incoming counterpart and is not deleted: left alone
    let b = feed.news()[1].read();
    assert_eq!(b.state, State::New);
    assert_eq!(b.title.as_deref(), Some("B title"));

    // C was adopted with a generated id and attached to the feed
    let c = feed.news()[2].read();
    assert_eq!(c.id, Some(100));
    assert_eq!(c.parent_id, 1);
    assert_eq!(c.feed_link, FEED_LINK);

    // The state index followed every transition
    assert_eq!(feed.count_by_states(&[State::Updated]), 1);
    assert_eq!(feed.count_by_states(&[State::New]), 2);
    assert_eq!(feed.state_index().total_len(), 3);
}

#[test]
fn test_idempotent_merge_of_identical_copy_reports_nothing() {
    let mut feed = persisted_feed();
    feed.title = Some("Example".to_string());
    feed.add_news(item(Some(10), "g1", "A title", State::Read).into_ref());
    feed.add_news(item(Some(11), "g2", "B title", State::Unread).into_ref());
    let persisted = feed.into_ref();

    // A fresh object graph with the same content
    let mut copy = persisted_feed();
    copy.id = None;
    copy.title = Some("Example".to_string());
    copy.add_news(item(None, "g1", "A title", State::Read).into_ref());
    copy.add_news(item(None, "g2", "B title", State::Unread).into_ref());
    let incoming = copy.into_ref();

    let ids = SequenceIdGenerator::new();
    let result = merge_and_clean_up(&persisted, &incoming, &ids).unwrap();

    assert!(result.is_empty(), "nothing to persist after an identical merge");
    assert!(!result.structural_change());
    assert_eq!(persisted.read().news_len(), 2);
}

#[test]
fn test_deleted_item_with_incoming_counterpart_is_not_pruned() {
    let mut feed = persisted_feed();
    feed.add_news(item(Some(10), "g1", "A title", State::Deleted).into_ref());
    let persisted = feed.into_ref();

    let mut incoming = persisted_feed();
    incoming.id = None;
    incoming.add_news(item(None, "g1", "A title", State::New).into_ref());
    let incoming = incoming.into_ref();

    let ids = SequenceIdGenerator::new();
    let result = merge_and_clean_up(&persisted, &incoming, &ids).unwrap();

    assert_eq!(result.removed().count(), 0);
    let feed = persisted.read();
    assert_eq!(feed.news_len(), 1);
    // Merge logic never resurrects to NEW
    assert_eq!(feed.news()[0].read().state, State::Deleted);
}

// ============================================================================
// Preconditions
// ============================================================================

#[test]
fn test_self_merge_fails_fast() {
    let persisted = persisted_feed().into_ref();
    let ids = SequenceIdGenerator::new();
    let err = merge_and_clean_up(&persisted, &persisted, &ids).unwrap_err();
    assert!(matches!(err, MergeError::SelfMerge));
}

#[test]
fn test_different_links_fail_fast() {
    let persisted = persisted_feed().into_ref();
    let incoming = Feed::new("https://other.example.com/feed").into_ref();
    let ids = SequenceIdGenerator::new();
    let err = merge_and_clean_up(&persisted, &incoming, &ids).unwrap_err();
    assert!(matches!(err, MergeError::FeedLinkMismatch { .. }));
}

#[test]
fn test_equivalent_normalized_links_are_accepted() {
    let persisted = Feed::new("https://Example.com/feed/").into_ref();
    let incoming = Feed::new("https://example.com/feed").into_ref();
    let ids = SequenceIdGenerator::new();
    assert!(merge_and_clean_up(&persisted, &incoming, &ids).is_ok());
}

#[test]
fn test_corrupt_stored_link_is_surfaced() {
    let persisted = Feed::new("not a uri at all").into_ref();
    let incoming = Feed::new(FEED_LINK).into_ref();
    let ids = SequenceIdGenerator::new();
    let err = merge_and_clean_up(&persisted, &incoming, &ids).unwrap_err();
    assert!(matches!(err, MergeError::CorruptLink(_)));
}

// ============================================================================
// Prune strategies
// ============================================================================

/// Builds a feed of `total` items where the indices in `deleted` are marked
/// DELETED, plus the survivor ids in original order.
fn prune_fixture(total: usize, deleted: &[usize]) -> (FeedRef, Vec<i64>, Vec<i64>) {
    let mut feed = persisted_feed();
    let mut survivors = Vec::new();
    let mut pruned = Vec::new();
    for i in 0..total {
        let id = i as i64 + 1;
        let state = if deleted.contains(&i) {
            pruned.push(id);
            State::Deleted
        } else {
            survivors.push(id);
            State::Read
        };
        feed.add_news(item(Some(id), &format!("g{id}"), &format!("Item {id}"), state).into_ref());
    }
    (feed.into_ref(), survivors, pruned)
}

fn run_prune(total: usize, deleted_count: usize) {
    let deleted: Vec<usize> = (0..deleted_count).collect();
    let (persisted, survivors, pruned) = prune_fixture(total, &deleted);

    // Empty incoming feed: every persisted item is unmatched
    let mut incoming = persisted_feed();
    incoming.id = None;
    let incoming = incoming.into_ref();

    let ids = SequenceIdGenerator::new();
    let result = merge_and_clean_up(&persisted, &incoming, &ids).unwrap();

    let feed = persisted.read();
    let remaining: Vec<i64> = feed
        .news()
        .iter()
        .map(|n| n.read().id.unwrap())
        .collect();
    assert_eq!(remaining, survivors, "survivor order must be preserved");

    let mut removed: Vec<EntityRef> = result.removed().collect();
    removed.sort_by_key(|e| match e {
        EntityRef::News(id) => *id,
        _ => i64::MAX,
    });
    let expected: Vec<EntityRef> = pruned.iter().map(|&id| EntityRef::News(id)).collect();
    assert_eq!(removed, expected);
    assert!(result.structural_change());
    assert_eq!(feed.state_index().total_len(), survivors.len());
}

#[test]
fn test_prune_one_by_one_below_relative_minimum() {
    run_prune(30, 4);
}

#[test]
fn test_prune_at_relative_boundary() {
    // 5 of 25 is exactly 1/5: compaction side of the boundary
    run_prune(25, 5);
    // 5 of 30 is below 1/5: one-by-one side
    run_prune(30, 5);
}

#[test]
fn test_prune_relative_rule_selects_compaction() {
    run_prune(30, 6);
}

#[test]
fn test_prune_above_absolute_threshold() {
    run_prune(30, 21);
}

#[test]
fn test_prune_both_strategies_agree_across_candidate_counts() {
    for deleted_count in [1, 2, 3, 4, 5, 6, 10, 15, 20, 21, 25, 30] {
        run_prune(30, deleted_count);
    }
}

// ============================================================================
// Deduplication of the incoming list
// ============================================================================

#[test]
fn test_incoming_duplicates_collapse_pairwise() {
    let persisted = persisted_feed().into_ref();

    let mut incoming = persisted_feed();
    incoming.id = None;
    incoming.add_news(item(None, "g1", "Same article", State::New).into_ref());
    incoming.add_news(item(None, "g1", "Same article", State::New).into_ref());
    let incoming = incoming.into_ref();

    let ids = SequenceIdGenerator::new();
    merge_and_clean_up(&persisted, &incoming, &ids).unwrap();

    assert_eq!(persisted.read().news_len(), 1, "first occurrence wins");
}

#[test]
fn test_synchronized_feed_dedups_by_guid_map() {
    let link = "reader://feeds/user-1/stream";
    let mut feed = Feed::new(link);
    feed.id = Some(1);
    let persisted = feed.into_ref();

    let mut incoming = Feed::new(link);
    let mut first = News::new(0, link);
    first.guid = Some(Guid::new("reader://item/aaa"));
    let mut dup = News::new(0, link);
    dup.guid = Some(Guid::new("reader://item/aaa"));
    let mut other = News::new(0, link);
    other.guid = Some(Guid::new("reader://item/bbb"));
    incoming.add_news(first.into_ref());
    incoming.add_news(dup.into_ref());
    incoming.add_news(other.into_ref());
    let incoming = incoming.into_ref();

    let ids = SequenceIdGenerator::new();
    let result = merge_and_clean_up(&persisted, &incoming, &ids).unwrap();

    assert_eq!(persisted.read().news_len(), 2);
    assert!(result.structural_change());
}

// ============================================================================
// Feed metadata
// ============================================================================

#[test]
fn test_feed_scalars_are_last_write_wins() {
    let mut feed = persisted_feed();
    feed.title = Some("Old title".to_string());
    feed.ttl = Some(60);
    let persisted = feed.into_ref();

    let mut incoming = persisted_feed();
    incoming.id = None;
    incoming.title = Some("New title".to_string());
    incoming.description = Some("Now with a description".to_string());
    let incoming = incoming.into_ref();

    let ids = SequenceIdGenerator::new();
    let result = merge_and_clean_up(&persisted, &incoming, &ids).unwrap();

    assert!(result.is_updated(EntityRef::Feed(1)));
    let feed = persisted.read();
    assert_eq!(feed.title.as_deref(), Some("New title"));
    assert_eq!(feed.description.as_deref(), Some("Now with a description"));
    // Absent on the incoming side wins too: last write, not a field merge
    assert_eq!(feed.ttl, None);
}

// ============================================================================
// Persistence handshake
// ============================================================================

#[derive(Default)]
struct RecordingStore {
    saved_feeds: Vec<i64>,
    saved_news: Vec<i64>,
    deleted: Vec<EntityRef>,
}

impl FeedDao for RecordingStore {
    type Error = std::convert::Infallible;

    fn load_feed(&self, _id: i64) -> Result<Option<Feed>, Self::Error> {
        Ok(None)
    }

    fn load_feed_by_link(&self, _link: &str) -> Result<Option<Feed>, Self::Error> {
        Ok(None)
    }

    fn save_feed(&mut self, feed: &Feed) -> Result<(), Self::Error> {
        self.saved_feeds.extend(feed.id);
        Ok(())
    }

    fn save_news(&mut self, news: &News) -> Result<(), Self::Error> {
        self.saved_news.extend(news.id);
        Ok(())
    }

    fn delete(&mut self, entity: EntityRef) -> Result<(), Self::Error> {
        self.deleted.push(entity);
        Ok(())
    }
}

#[test]
fn test_merge_result_drives_minimal_persistence() {
    let mut feed = persisted_feed();
    feed.add_news(item(Some(10), "g1", "A title", State::Read).into_ref());
    feed.add_news(item(Some(11), "g2", "Stale", State::Deleted).into_ref());
    let persisted = feed.into_ref();

    let mut incoming = persisted_feed();
    incoming.id = None;
    incoming.title = Some("Renamed".to_string());
    incoming.add_news(item(None, "g1", "A title, revised", State::New).into_ref());
    let incoming = incoming.into_ref();

    let ids = SequenceIdGenerator::new();
    let result = merge_and_clean_up(&persisted, &incoming, &ids).unwrap();

    let mut store = RecordingStore::default();
    let guard = persisted.read();
    for entity in result.removed() {
        store.delete(entity).unwrap();
    }
    for entity in result.updated() {
        match entity {
            EntityRef::Feed(_) => store.save_feed(&guard).unwrap(),
            EntityRef::News(id) => {
                let news = guard
                    .news()
                    .iter()
                    .find(|n| n.read().id == Some(id))
                    .expect("updated news must still be owned by the feed");
                store.save_news(&news.read()).unwrap();
            }
            _ => {}
        }
    }

    assert_eq!(store.deleted, vec![EntityRef::News(11)]);
    assert_eq!(store.saved_news, vec![10]);
    assert_eq!(store.saved_feeds, vec![1]);
}
