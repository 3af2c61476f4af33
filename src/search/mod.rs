//! Phrase search over a pre-built link index.

pub mod tantivy;

use memchr::memchr;
use crate::error::Result;

pub use self::tantivy::TantivySearchClient;

/// A stored document as the scorer sees it: only its encoded links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDocument {
    /// `target<TAB>anchor<TAB>target<TAB>anchor...`
    pub links: String,
}

impl LinkDocument {
    pub fn new<S: Into<String>>(links: S) -> Self {
        Self { links: links.into() }
    }

    pub fn links(&self) -> LinkPairs<'_> {
        LinkPairs::new(&self.links)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchHits {
    /// Every document matching the phrase, not just the returned ones
    pub total_hits: usize,
    /// The top-ranked documents, at most the requested limit
    pub documents: Vec<LinkDocument>,
}

/// The full-text index as consumed by the scoring workers.
pub trait SearchIndexClient: Send + Sync {
    /// Returns up to `limit` top-ranked documents containing `tokens` as a phrase.
    fn phrase_search(&self, tokens: &[&str], limit: usize) -> Result<SearchHits>;
}

impl<T: SearchIndexClient + ?Sized> SearchIndexClient for &T {
    fn phrase_search(&self, tokens: &[&str], limit: usize) -> Result<SearchHits> {
        (**self).phrase_search(tokens, limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPair<'a> {
    pub target: &'a str,
    pub anchor: Option<&'a str>,
}

/// Decodes an encoded links field into `(target, anchor)` pairs.
///
/// The anchor of the last pair may be missing when the indexer trimmed
/// trailing separators. Pairs with an empty target are skipped.
#[derive(Debug, Clone)]
pub struct LinkPairs<'a> {
    rest: Option<&'a str>,
}

impl<'a> LinkPairs<'a> {
    pub fn new(links: &'a str) -> Self {
        Self {
            rest: if links.is_empty() { None } else { Some(links) },
        }
    }

    fn next_field(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match memchr(b'\t', rest.as_bytes()) {
            Some(i) => {
                self.rest = Some(&rest[i + 1..]);
                Some(&rest[..i])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

impl<'a> Iterator for LinkPairs<'a> {
    type Item = LinkPair<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let target = self.next_field()?;
            let anchor = self.next_field();
            if target.is_empty() {
                continue;
            }
            return Some(LinkPair { target, anchor });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_pairs_in_order() {
        let pairs: Vec<_> = LinkPairs::new("en:Paris\tParis\ten:France\tthe French").collect();
        assert_eq!(pairs, vec![
            LinkPair { target: "en:Paris", anchor: Some("Paris") },
            LinkPair { target: "en:France", anchor: Some("the French") },
        ]);
    }

    #[test]
    fn trailing_anchor_may_be_missing() {
        let pairs: Vec<_> = LinkPairs::new("en:Paris\tParis\ten:France").collect();
        assert_eq!(pairs[1], LinkPair { target: "en:France", anchor: None });
    }

    #[test]
    fn empty_fields_are_handled() {
        assert_eq!(LinkPairs::new("").count(), 0);
        let pairs: Vec<_> = LinkPairs::new("en:A\t\t\tignored\ten:B\tb").collect();
        assert_eq!(pairs, vec![
            LinkPair { target: "en:A", anchor: Some("") },
            LinkPair { target: "en:B", anchor: Some("b") },
        ]);
    }
}
