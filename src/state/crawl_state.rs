use crate::url::visit_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::Url;

/// Set of normalized URLs that have already been fetched
///
/// Ordered so that serialized checkpoints are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitedSet {
    keys: BTreeSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a URL as visited. Returns false if it was already present.
    pub fn insert(&mut self, url: &Url) -> bool {
        self.keys.insert(visit_key(url))
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.keys.contains(&visit_key(url))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Resumable progress of one crawl
///
/// Mutated after every step and persisted after every page, so a later run
/// can continue from `pending_url` without re-fetching visited pages or
/// re-writing records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlState {
    /// Pages already fetched and processed
    pub visited: VisitedSet,

    /// Number of pages fetched, across all runs of this crawl
    pub pages_fetched: u32,

    /// Number of records durably written, across all runs of this crawl
    pub records_written: u64,

    /// The page to fetch next, if a pagination chain is in progress
    pub pending_url: Option<Url>,

    /// Index of the next seed to start a chain from
    #[serde(default)]
    pub seed_index: usize,

    /// Records of the pending page already written before the last failure
    #[serde(default)]
    pub pending_page_written: u64,

    /// Complete lines the output already held when this crawl started
    #[serde(default)]
    pub output_baseline: u64,
}

impl CrawlState {
    /// Creates an empty state for a fresh crawl
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the record budget is used up (`max_records == 0` is unbounded)
    pub fn records_exhausted(&self, max_records: u64) -> bool {
        max_records > 0 && self.records_written >= max_records
    }

    /// Returns true if the page budget is used up
    pub fn pages_exhausted(&self, max_pages: u32) -> bool {
        self.pages_fetched >= max_pages
    }

    /// Records one durably written record from the pending page
    pub fn record_written(&mut self) {
        self.records_written += 1;
        self.pending_page_written += 1;
    }

    /// Marks a fetched page visited under both its requested and final URLs
    pub fn mark_visited(&mut self, requested: &Url, final_url: &Url) {
        self.visited.insert(requested);
        self.visited.insert(final_url);
    }

    /// Moves the chain on to `next`, or ends it when `next` is None
    pub fn advance(&mut self, next: Option<Url>) {
        self.pending_url = next;
        self.pending_page_written = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_visited_set_uses_normalized_keys() {
        let mut visited = VisitedSet::new();
        assert!(visited.insert(&url("https://example.com/reviews?page=2")));
        assert!(!visited.insert(&url("https://www.example.com/reviews/?page=2#top")));
        assert!(visited.contains(&url("https://EXAMPLE.com/reviews?page=2&utm_source=x")));
        assert!(!visited.contains(&url("https://example.com/reviews?page=3")));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_record_budget() {
        let mut state = CrawlState::new();
        assert!(!state.records_exhausted(0));
        assert!(!state.records_exhausted(1));

        state.record_written();
        assert!(state.records_exhausted(1));
        assert!(!state.records_exhausted(0));
        assert_eq!(state.pending_page_written, 1);
    }

    #[test]
    fn test_page_budget() {
        let mut state = CrawlState::new();
        assert!(!state.pages_exhausted(1));
        state.pages_fetched = 1;
        assert!(state.pages_exhausted(1));
    }

    #[test]
    fn test_advance_resets_page_counter() {
        let mut state = CrawlState::new();
        state.record_written();
        state.advance(Some(url("https://example.com/reviews?page=2")));
        assert_eq!(state.pending_page_written, 0);
        assert_eq!(state.records_written, 1);
        assert!(state.pending_url.is_some());
    }

    #[test]
    fn test_mark_visited_covers_redirects() {
        let mut state = CrawlState::new();
        state.mark_visited(
            &url("http://example.com/reviews"),
            &url("https://example.com/reviews?page=1"),
        );
        assert!(state.visited.contains(&url("http://example.com/reviews")));
        assert!(state.visited.contains(&url("https://example.com/reviews?page=1")));
    }

    #[test]
    fn test_state_serializes_to_json() {
        let mut state = CrawlState::new();
        state.visited.insert(&url("https://example.com/reviews"));
        state.pages_fetched = 1;
        state.records_written = 2;
        state.pending_url = Some(url("https://example.com/reviews?page=2"));

        let json = serde_json::to_string(&state).unwrap();
        let restored: CrawlState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_older_state_without_seed_fields_loads() {
        let json = r#"{"visited":[],"pages_fetched":0,"records_written":0,"pending_url":null}"#;
        let state: CrawlState = serde_json::from_str(json).unwrap();
        assert_eq!(state.seed_index, 0);
        assert_eq!(state.pending_page_written, 0);
        assert_eq!(state.output_baseline, 0);
    }
}
