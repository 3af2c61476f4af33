use std::sync::Arc;
use ahash::{AHashMap, AHashSet};
use log::trace;
use crate::config::subsystems::AnalyzerConfig;
use crate::entities::EntityIdentityMap;
use crate::error::Result;
use crate::search::SearchIndexClient;
use crate::types::{Resolution, ScoredTarget, Verdict};
use super::counter::SupportCounter;

/// Per-worker buffers reused across candidates.
#[derive(Debug, Default)]
pub struct EvaluationScratch {
    targets: SupportCounter<Arc<str>>,
    /// Surface forms are plain counts; a document can add one per exact target.
    forms: AHashMap<String, u32>,
    seen: AHashSet<Arc<str>>,
    seen_exact: AHashSet<Arc<str>>,
}

impl EvaluationScratch {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear(&mut self) {
        self.targets.clear();
        self.forms.clear();
    }
}

/// Scores one candidate phrase against the link index.
pub struct CandidateEvaluator<S> {
    index: S,
    entities: Arc<EntityIdentityMap>,
    config: AnalyzerConfig,
    blacklist: AHashSet<Arc<str>>,
}

/// `round(ln(1 + 0.1 score) / ln(1 + 0.1 total_weight) * 100)`, within `0..=100`.
pub fn confidence(score: u32, total_weight: u32) -> u32 {
    let norm = (0.1 * total_weight as f64).ln_1p();
    if norm <= 0.0 {
        return 0;
    }
    let ratio = (0.1 * score as f64).ln_1p() / norm;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u32
}

/// Forms by descending count, ties by ascending text.
fn ranked_forms(forms: &AHashMap<String, u32>) -> Vec<String> {
    let mut ranked: Vec<(&String, u32)> = forms.iter().map(|(form, &count)| (form, count)).collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().map(|(form, _)| form.clone()).collect()
}

/// Unicode-aware case-insensitive comparison without allocating.
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

impl<S: SearchIndexClient> CandidateEvaluator<S> {
    pub fn new(index: S, entities: Arc<EntityIdentityMap>, config: AnalyzerConfig) -> Self {
        let blacklist = config
            .blacklist
            .iter()
            .map(|key| Arc::from(key.as_str()))
            .collect();
        Self { index, entities, config, blacklist }
    }

    /// A blacklisted key only counts when the phrase itself names it.
    fn is_blacklisted(&self, key: &str, phrase_lower: &str) -> bool {
        self.blacklist.contains(key) && !key.to_lowercase().contains(phrase_lower)
    }

    pub fn evaluate(&self, phrase: &str, scratch: &mut EvaluationScratch) -> Result<Verdict> {
        let tokens: Vec<&str> = phrase.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(Verdict::Dead);
        }
        scratch.clear();

        let hits = self.index.phrase_search(&tokens, self.config.max_documents)?;
        let returned = hits.documents.len();
        if returned < self.config.minimum_mentions {
            trace!("{:?}: only {} mentions", phrase, returned);
            return Ok(Verdict::Dead);
        }
        let mut min_support = self.config.min_support.max((returned / 10) as u32);
        let phrase_lower = phrase.to_lowercase();
        let boost = self.config.exact_boost;

        let mut weight: u32 = 0;
        for document in &hits.documents {
            scratch.seen.clear();
            scratch.seen_exact.clear();
            let mut used = false;
            let mut exact = false;
            for link in document.links() {
                let Some(entity) = self.entities.get(link.target) else {
                    continue;
                };
                if self.is_blacklisted(entity, &phrase_lower) {
                    continue;
                }
                if scratch.seen.insert(Arc::clone(entity)) {
                    scratch.targets.add_search(Arc::clone(entity));
                    used = true;
                }
                if let Some(anchor) = link.anchor {
                    if eq_ignore_case(anchor, phrase) && scratch.seen_exact.insert(Arc::clone(entity)) {
                        match scratch.forms.get_mut(anchor) {
                            Some(count) => *count += 1,
                            None => {
                                scratch.forms.insert(anchor.to_string(), 1);
                            }
                        }
                        scratch.targets.add_exact(Arc::clone(entity));
                        exact = true;
                    }
                }
            }
            if used {
                weight = weight.saturating_add(1);
            }
            if exact {
                weight = weight.saturating_add(boost);
            }
        }

        let mut targets = Vec::new();
        for entry in scratch.targets.descending() {
            // Exact-supported entries rank first, so nothing after this qualifies.
            if entry.exact() == 0 {
                break;
            }
            let score = entry.search().saturating_add(boost.saturating_mul(entry.exact()));
            if score < min_support {
                break;
            }
            if score / 2 > min_support {
                min_support = score / 2;
            }
            targets.push(ScoredTarget {
                confidence: confidence(score, weight),
                search_support: entry.search(),
                exact_support: entry.exact(),
                key: entry.key,
            });
        }

        if targets.is_empty() {
            return Ok(Verdict::Dead);
        }
        let forms = ranked_forms(&scratch.forms);
        Ok(Verdict::Resolved(Resolution {
            phrase: phrase.to_string(),
            forms,
            total_hits: hits.total_hits,
            weight,
            targets,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{LinkDocument, SearchHits};
    use crate::config::subsystems::analyzer::MINIMUM_MENTIONS;

    struct FixedIndex(Vec<String>);

    impl SearchIndexClient for FixedIndex {
        fn phrase_search(&self, _tokens: &[&str], limit: usize) -> Result<SearchHits> {
            let documents: Vec<LinkDocument> = self.0.iter().take(limit).map(LinkDocument::new).collect();
            Ok(SearchHits { total_hits: self.0.len(), documents })
        }
    }

    fn entities(pairs: &[(&str, &str)]) -> Arc<EntityIdentityMap> {
        let mut map = EntityIdentityMap::new();
        for (title, key) in pairs {
            map.insert(Arc::from(*title), Arc::from(*key));
        }
        Arc::new(map)
    }

    fn evaluator(docs: Vec<String>, pairs: &[(&str, &str)]) -> CandidateEvaluator<FixedIndex> {
        CandidateEvaluator::new(FixedIndex(docs), entities(pairs), AnalyzerConfig::default())
    }

    fn repeat(doc: &str, n: usize) -> Vec<String> {
        vec![doc.to_string(); n]
    }

    #[test]
    fn too_few_mentions_is_dead() {
        let eval = evaluator(repeat("en:Paris\tParis", MINIMUM_MENTIONS - 1), &[("en:Paris", "Q90|Paris")]);
        let verdict = eval.evaluate("paris", &mut EvaluationScratch::new()).unwrap();
        assert_eq!(verdict, Verdict::Dead);
    }

    #[test]
    fn exact_anchor_support_resolves() {
        let eval = evaluator(repeat("en:Paris\tParis", MINIMUM_MENTIONS), &[("en:Paris", "Q90|Paris")]);
        let Verdict::Resolved(resolution) = eval.evaluate("paris", &mut EvaluationScratch::new()).unwrap() else {
            panic!("expected a resolution");
        };
        assert_eq!(resolution.forms, vec!["Paris".to_string()]);
        assert_eq!(resolution.total_hits, 20);
        assert_eq!(resolution.weight, 20 * 17);
        assert_eq!(resolution.targets.len(), 1);
        let target = &resolution.targets[0];
        assert_eq!(&*target.key, "Q90|Paris");
        assert_eq!((target.search_support, target.exact_support, target.confidence), (20, 20, 100));
        assert_eq!(resolution.to_string(), "paris\tParis\t20\t340\tQ90|Paris|20|20|100%");
    }

    #[test]
    fn co_occurrence_alone_is_never_emitted() {
        let eval = evaluator(repeat("en:Paris\tCity of Light", 50), &[("en:Paris", "Q90|Paris")]);
        assert_eq!(eval.evaluate("paris", &mut EvaluationScratch::new()).unwrap(), Verdict::Dead);
    }

    #[test]
    fn weak_alternatives_are_cut_by_the_rising_floor() {
        let mut docs = repeat("en:Paris\tParis\ten:Paris Hilton\tthe heiress", 30);
        docs.extend(repeat("en:Paris Hilton\tparis", 2));
        let eval = evaluator(docs, &[("en:Paris", "Q90|Paris"), ("en:Paris Hilton", "Q47899|Paris Hilton")]);
        let Verdict::Resolved(resolution) = eval.evaluate("paris", &mut EvaluationScratch::new()).unwrap() else {
            panic!("expected a resolution");
        };
        let keys: Vec<&str> = resolution.targets.iter().map(|t| &*t.key).collect();
        assert_eq!(keys, vec!["Q90|Paris"]);
        assert_eq!(resolution.forms, vec!["Paris".to_string(), "paris".to_string()]);
    }

    #[test]
    fn every_emitted_target_has_exact_support_and_ordered_confidence() {
        let mut docs = repeat("en:A\tmercury", 40);
        docs.extend(repeat("en:B\tMercury", 30));
        docs.extend(repeat("en:C\tplanet", 10));
        let eval = evaluator(docs, &[("en:A", "Q1|A"), ("en:B", "Q2|B"), ("en:C", "Q3|C")]);
        let Verdict::Resolved(resolution) = eval.evaluate("mercury", &mut EvaluationScratch::new()).unwrap() else {
            panic!("expected a resolution");
        };
        assert_eq!(resolution.targets.len(), 2);
        assert!(resolution.targets.iter().all(|t| t.exact_support >= 1 && t.confidence <= 100));
        assert!(resolution.targets[0].confidence >= resolution.targets[1].confidence);
        assert_eq!(&*resolution.targets[0].key, "Q1|A");
    }

    #[test]
    fn blacklisted_target_is_skipped_unless_named() {
        let census = "Q2035701|Race and ethnicity in the United States Census";
        let docs = repeat("en:Census\tcensus", 30);
        let eval = evaluator(docs.clone(), &[("en:Census", census)]);
        assert!(matches!(eval.evaluate("census", &mut EvaluationScratch::new()).unwrap(), Verdict::Resolved(_)));

        let docs = repeat("en:Census\tpopulation", 30);
        let eval = evaluator(docs, &[("en:Census", census)]);
        assert_eq!(eval.evaluate("population", &mut EvaluationScratch::new()).unwrap(), Verdict::Dead);
    }

    #[test]
    fn form_counts_beyond_the_search_range_resolve() {
        // Two exact targets per document push the form tally past 0xFFFF.
        let docs = repeat("en:A\tParis\ten:B\tParis", 32_768);
        let eval = evaluator(docs, &[("en:A", "Q1|A"), ("en:B", "Q2|B")]);
        let Verdict::Resolved(resolution) = eval.evaluate("paris", &mut EvaluationScratch::new()).unwrap() else {
            panic!("expected a resolution");
        };
        assert_eq!(resolution.forms, vec!["Paris".to_string()]);
        assert_eq!(resolution.weight, 32_768 * 17);
        let supports: Vec<(u32, u32)> = resolution
            .targets
            .iter()
            .map(|t| (t.search_support, t.exact_support))
            .collect();
        assert_eq!(supports, vec![(32_768, 32_768), (32_768, 32_768)]);
    }

    #[test]
    fn forms_rank_by_count_then_text() {
        let mut forms = AHashMap::new();
        forms.insert("paris".to_string(), 2);
        forms.insert("PARIS".to_string(), 2);
        forms.insert("Paris".to_string(), 70_000);
        assert_eq!(ranked_forms(&forms), vec!["Paris", "PARIS", "paris"]);
    }

    #[test]
    fn oversized_boost_saturates_instead_of_overflowing() {
        let config = AnalyzerConfig { exact_boost: 300_000_000, ..AnalyzerConfig::default() };
        let eval = CandidateEvaluator::new(
            FixedIndex(repeat("en:Paris\tParis", MINIMUM_MENTIONS)),
            entities(&[("en:Paris", "Q90|Paris")]),
            config,
        );
        let Verdict::Resolved(resolution) = eval.evaluate("paris", &mut EvaluationScratch::new()).unwrap() else {
            panic!("expected a resolution");
        };
        assert_eq!(resolution.weight, u32::MAX);
        assert_eq!(resolution.targets[0].confidence, 100);
    }

    #[test]
    fn confidence_is_bounded_and_monotonic() {
        assert_eq!(confidence(340, 340), 100);
        assert_eq!(confidence(0, 340), 0);
        assert_eq!(confidence(5, 0), 0);
        let mut last = 0;
        for score in (0..=500).step_by(25) {
            let c = confidence(score, 500);
            assert!(c >= last && c <= 100);
            last = c;
        }
    }

    #[test]
    fn case_insensitive_match_handles_unicode() {
        assert!(eq_ignore_case("ÉCOLE", "école"));
        assert!(!eq_ignore_case("ecole", "école"));
    }
}
