use std::fmt;
use std::sync::Arc;

/// One phrase awaiting disambiguation, numbered in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub seq: u64,
    pub phrase: String,
}

impl Candidate {
    pub fn new<S: Into<String>>(seq: u64, phrase: S) -> Self {
        Self { seq, phrase: phrase.into() }
    }
}

/// Terminal state of a candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Too rare, or no target backed by an exact anchor match
    Dead,
    Resolved(Resolution),
    /// Evaluation could not complete; the worker that saw it has stopped
    Failed(String),
}

/// A completed evaluation, tagged with the candidate's position.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub seq: u64,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredTarget {
    pub key: Arc<str>,
    pub search_support: u32,
    pub exact_support: u32,
    /// Integer percentage in `0..=100`
    pub confidence: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub phrase: String,
    /// Distinct exact-match surface forms, most frequent first
    pub forms: Vec<String>,
    pub total_hits: usize,
    pub weight: u32,
    pub targets: Vec<ScoredTarget>,
}

impl fmt::Display for Resolution {
    /// `phrase<TAB>forms<TAB>hits<TAB>weight<TAB>key|search|exact|conf%...`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.phrase, self.forms.join("|"), self.total_hits, self.weight)?;
        for target in &self.targets {
            write!(
                f,
                "\t{}|{}|{}|{}%",
                target.key, target.search_support, target.exact_support, target.confidence
            )?;
        }
        Ok(())
    }
}
