//! Candidate set keyed by exact URL.
//!
//! Merges hits from every (variant, backend) unit into a single set. The
//! first hit seen for a URL wins: its domain and snippet are kept and later
//! duplicates are dropped. URLs are compared as exact strings; no
//! normalisation is applied.

use std::collections::HashSet;

use crate::types::SearchHit;

/// Deduplicated candidate hits in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    hits: Vec<SearchHit>,
    seen: HashSet<String>,
}

impl CandidateSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a hit, returning `false` if its URL was already present.
    pub fn insert(&mut self, hit: SearchHit) -> bool {
        if self.seen.contains(&hit.url) {
            return false;
        }
        self.seen.insert(hit.url.clone());
        self.hits.push(hit);
        true
    }

    /// Whether a URL is already in the set.
    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Number of unique URLs.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether the set holds no URLs.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Unique URLs, in first-seen order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.hits.iter().map(|hit| hit.url.as_str())
    }

    /// The surviving hits.
    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    /// Consume the set, returning the surviving hits.
    pub fn into_hits(self) -> Vec<SearchHit> {
        self.hits
    }
}

impl Extend<SearchHit> for CandidateSet {
    fn extend<I: IntoIterator<Item = SearchHit>>(&mut self, iter: I) {
        for hit in iter {
            self.insert(hit);
        }
    }
}

impl FromIterator<SearchHit> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = SearchHit>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// Merge per-unit hit lists into one set, in the order given.
pub fn deduplicate<I>(batches: I) -> CandidateSet
where
    I: IntoIterator<Item = Vec<SearchHit>>,
{
    batches.into_iter().flatten().collect()
}
