use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Category, Image, NewsRef, Person, State};
use crate::index::{ReplaceOutcome, StateIndex};
use crate::lock::EntityLock;

/// Shared handle to a lockable feed entity.
pub type FeedRef = Arc<EntityLock<Feed>>;

/// A subscribed feed and its owned news items.
///
/// Identity is the normalized link text; the persisted store holds at most
/// one feed per link. The `news` collection is the only strong ownership
/// relation in the entity graph; everything else refers to entities by id.
///
/// The feed keeps a [`StateIndex`] over its news identifiers so state counts
/// and per-state enumeration never walk the entity list. Index and news
/// collection are mutated together, always under the feed's write lock.
#[derive(Debug, Serialize, Deserialize)]
pub struct Feed {
    pub id: Option<i64>,
    /// Normalized link text, the feed's identity.
    pub link: String,

    pub title: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub language: Option<String>,
    pub copyright: Option<String>,
    pub docs: Option<String>,
    pub generator: Option<String>,
    pub webmaster: Option<String>,

    /// Epoch seconds.
    pub publish_date: Option<i64>,
    /// Epoch seconds of the channel's last build.
    pub build_date: Option<i64>,
    /// Minutes the source allows the content to be cached.
    pub ttl: Option<i64>,
    /// Feed format as reported by the parser (RSS 2.0, Atom 1.0, ...).
    pub format: Option<String>,

    pub image: Option<Image>,
    pub author: Option<Person>,
    pub categories: Vec<Category>,

    #[serde(skip)]
    news: Vec<NewsRef>,
    #[serde(skip)]
    index: StateIndex,

    pub properties: HashMap<String, Value>,
}

impl Feed {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            id: None,
            link: link.into(),
            title: None,
            description: None,
            homepage: None,
            language: None,
            copyright: None,
            docs: None,
            generator: None,
            webmaster: None,
            publish_date: None,
            build_date: None,
            ttl: None,
            format: None,
            image: None,
            author: None,
            categories: Vec::new(),
            news: Vec::new(),
            index: StateIndex::new(),
            properties: HashMap::new(),
        }
    }

    pub fn into_ref(self) -> FeedRef {
        Arc::new(EntityLock::new(self))
    }

    // ========================================================================
    // News ownership
    // ========================================================================

    pub fn news(&self) -> &[NewsRef] {
        &self.news
    }

    pub fn news_len(&self) -> usize {
        self.news.len()
    }

    /// Attaches a news item, indexing it when it already carries an id.
    pub fn add_news(&mut self, news: NewsRef) {
        let (id, state) = {
            let guard = news.read();
            (guard.id, guard.state)
        };
        if let Some(id) = id {
            self.index.add(id, state);
        }
        self.news.push(news);
    }

    /// Detaches all news, used when the loader replaces the collection.
    pub fn clear_news(&mut self) {
        self.news.clear();
        self.index = StateIndex::new();
    }

    pub(crate) fn news_mut(&mut self) -> &mut Vec<NewsRef> {
        &mut self.news
    }

    pub(crate) fn index_mut(&mut self) -> &mut StateIndex {
        &mut self.index
    }

    // ========================================================================
    // State index queries (read-only surface for the UI layer)
    // ========================================================================

    pub fn state_index(&self) -> &StateIndex {
        &self.index
    }

    /// Count of owned news in any of the given states.
    pub fn count_by_states(&self, states: &[State]) -> usize {
        self.index.count(states)
    }

    /// News in any of the given states, in index order (per-bucket order
    /// within a state, caller-supplied order across states).
    pub fn news_by_states(&self, states: &[State]) -> Vec<NewsRef> {
        let by_id: HashMap<i64, &NewsRef> = self
            .news
            .iter()
            .filter_map(|n| n.read().id.map(|id| (id, n)))
            .collect();
        self.index
            .enumerate(states)
            .into_iter()
            .filter_map(|id| by_id.get(&id).map(|n| Arc::clone(n)))
            .collect()
    }

    pub fn visible_news(&self) -> Vec<NewsRef> {
        self.news_by_states(&State::VISIBLE)
    }

    /// Rebuilds the state index from the owned news, reporting what changed.
    ///
    /// Used after a bulk load from persistence and by callers that track the
    /// container through `replace_all` semantics.
    pub fn reindex(&mut self) -> ReplaceOutcome {
        let mut incoming: HashMap<State, Vec<i64>> = HashMap::new();
        for news in &self.news {
            let guard = news.read();
            if let Some(id) = guard.id {
                incoming.entry(guard.state).or_default().push(id);
            }
        }
        self.index.replace_all(&incoming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::News;

    fn feed_with_items(states: &[State]) -> Feed {
        let mut feed = Feed::new("https://example.com/feed");
        feed.id = Some(1);
        for (i, &state) in states.iter().enumerate() {
            let mut news = News::new(1, "https://example.com/feed");
            news.id = Some(i as i64 + 1);
            news.state = state;
            feed.add_news(news.into_ref());
        }
        feed
    }

    #[test]
    fn test_add_news_indexes_by_state() {
        let feed = feed_with_items(&[State::New, State::Read, State::New]);
        assert_eq!(feed.count_by_states(&[State::New]), 2);
        assert_eq!(feed.count_by_states(&[State::Read]), 1);
        assert_eq!(feed.state_index().total_len(), feed.news_len());
    }

    #[test]
    fn test_news_by_states_resolves_entities() {
        let feed = feed_with_items(&[State::New, State::Read]);
        let read = feed.news_by_states(&[State::Read]);
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].read().id, Some(2));
    }

    #[test]
    fn test_visible_excludes_deleted() {
        let feed = feed_with_items(&[State::New, State::Deleted, State::Updated]);
        assert_eq!(feed.visible_news().len(), 2);
    }

    #[test]
    fn test_reindex_reports_new_news() {
        let mut feed = feed_with_items(&[State::Read]);
        let mut news = News::new(1, "https://example.com/feed");
        news.id = Some(50);
        // Bypass add_news indexing to simulate a stale index
        feed.news_mut().push(news.into_ref());

        let outcome = feed.reindex();
        assert!(outcome.changed);
        assert!(outcome.new_news_added);
        assert_eq!(feed.state_index().total_len(), 2);
    }
}
