//! Breadth-first URL frontier
//!
//! Owns both the queue of discovered-but-unfetched URLs and the set of every
//! URL ever queued, so a page is never fetched twice in one crawl.

use std::collections::{HashSet, VecDeque};

use url::Url;

/// A URL waiting to be fetched with its link distance from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
}

/// FIFO frontier with de-duplication
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    seen: HashSet<String>,
    visited: usize,
}

impl Frontier {
    /// Frontier seeded with `seed` at depth 0
    pub fn new(seed: Url) -> Self {
        let mut frontier = Self::default();
        frontier.push(seed, 0);
        frontier
    }

    /// Queue `url` unless it was queued before; returns whether it was added
    ///
    /// Fragments never change the fetched document, so they are dropped.
    pub fn push(&mut self, mut url: Url, depth: u32) -> bool {
        url.set_fragment(None);
        if !self.seen.insert(url.to_string()) {
            return false;
        }
        self.queue.push_back(FrontierEntry { url, depth });
        true
    }

    /// Queue every URL of `urls` at `depth`; returns how many were new
    pub fn extend<I>(&mut self, urls: I, depth: u32) -> usize
    where
        I: IntoIterator<Item = Url>,
    {
        urls.into_iter()
            .filter(|url| self.push(url.clone(), depth))
            .count()
    }

    /// Next URL in breadth-first order
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    /// Record that a popped URL has been fetched
    pub fn mark_visited(&mut self) {
        self.visited += 1;
    }

    /// Popped URLs that were fetched
    pub fn visited_count(&self) -> usize {
        self.visited
    }

    /// URLs still waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_breadth_first_order() {
        let mut frontier = Frontier::new(url("https://example.com/"));
        let seed = frontier.pop().unwrap();
        assert_eq!(seed.depth, 0);

        frontier.extend(
            [url("https://example.com/a"), url("https://example.com/b")],
            1,
        );
        frontier.push(url("https://example.com/a/1"), 2);

        let order: Vec<(String, u32)> = std::iter::from_fn(|| frontier.pop())
            .map(|e| (e.url.path().to_string(), e.depth))
            .collect();
        assert_eq!(
            order,
            vec![
                ("/a".to_string(), 1),
                ("/b".to_string(), 1),
                ("/a/1".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_duplicates_ignored() {
        let mut frontier = Frontier::new(url("https://example.com/"));
        assert!(!frontier.push(url("https://example.com/"), 1));
        assert!(!frontier.push(url("https://example.com/#top"), 1));
        assert!(frontier.push(url("https://example.com/page#intro"), 1));
        assert_eq!(frontier.len(), 2);

        frontier.pop();
        let page = frontier.pop().unwrap();
        assert_eq!(page.url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_popped_urls_stay_seen() {
        let mut frontier = Frontier::new(url("https://example.com/"));
        frontier.pop();
        frontier.mark_visited();
        assert!(frontier.is_empty());
        assert!(!frontier.push(url("https://example.com/"), 3));
        assert_eq!(frontier.visited_count(), 1);
    }

    #[test]
    fn test_extend_counts_new_urls() {
        let mut frontier = Frontier::new(url("https://example.com/"));
        let added = frontier.extend(
            [
                url("https://example.com/"),
                url("https://example.com/x"),
                url("https://example.com/x#frag"),
            ],
            1,
        );
        assert_eq!(added, 1);
    }
}
