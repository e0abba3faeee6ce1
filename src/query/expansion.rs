//! Pseudo-relevance feedback for Indri: expand a query with the stems that
//! best characterize the top of its initial ranking.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};
use tracing::debug;
use crate::core::config::FeedbackConfig;
use crate::core::error::Result;
use crate::query::ast::{QueryNode, WeightedNode};
use crate::query::eval::EvalContext;
use crate::scoring::scorer;
use crate::search::results::ScoredDocument;

#[derive(Debug, Clone, PartialEq)]
struct TermScore {
    term: String,
    score: f64,
}

impl Eq for TermScore {}

impl PartialOrd for TermScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Higher score is greater; among equal scores the smaller term is greater
impl Ord for TermScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.total_cmp(&other.score)
            .then_with(|| other.term.cmp(&self.term))
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackExpander {
    pub docs: usize,
    pub terms: usize,
    pub mu: f64,
    pub original_weight: f64,
    pub field: String,
}

impl FeedbackExpander {
    pub fn from_config(config: &FeedbackConfig) -> Self {
        FeedbackExpander {
            docs: config.docs,
            terms: config.terms,
            mu: config.mu,
            original_weight: config.original_weight,
            field: "body".to_string(),
        }
    }

    /// Best expansion terms with their scores, best first.
    pub fn expansion_terms(&self, ctx: &EvalContext, ranking: &[ScoredDocument]) -> Result<Vec<(String, f64)>> {
        let collection_length = ctx.stats.collection_length(ctx.store, &self.field)?;
        if collection_length == 0 {
            return Ok(Vec::new());
        }

        // (doc score, doc length, term vector) for each feedback document
        let mut feedback_docs = Vec::new();
        let mut ctf: BTreeMap<String, u64> = BTreeMap::new();
        for doc in ranking.iter().take(self.docs) {
            let Some(vector) = ctx.store.term_vector(doc.doc_id, &self.field)? else {
                continue;
            };
            let doc_len = ctx.store.doc_length(&self.field, doc.doc_id)? as f64;
            for entry in &vector.entries {
                if entry.stem.contains('.') || entry.stem.contains(',') {
                    continue;
                }
                ctf.insert(entry.stem.clone(), entry.ctf);
            }
            feedback_docs.push((doc.score, doc_len, vector));
        }

        let mut heap: BinaryHeap<Reverse<TermScore>> = BinaryHeap::with_capacity(self.terms + 1);
        for (term, &term_ctf) in &ctf {
            let p_mle = scorer::p_mle(term_ctf, collection_length);
            if p_mle <= 0.0 {
                continue;
            }
            let idf = (1.0 / p_mle).ln();

            let mut score = 0.0;
            for (doc_score, doc_len, vector) in &feedback_docs {
                let denom = doc_len + self.mu;
                if denom <= 0.0 {
                    continue;
                }
                let tf = vector.get(term).map_or(0.0, |e| e.tf as f64);
                score += (tf + self.mu * p_mle) / denom * doc_score * idf;
            }

            heap.push(Reverse(TermScore { term: term.clone(), score }));
            if heap.len() > self.terms {
                heap.pop();
            }
        }

        Ok(heap.into_sorted_vec()
            .into_iter()
            .map(|Reverse(t)| (t.term, t.score))
            .collect())
    }

    /// `#WAND(w original (1 - w) #WAND(score_i term_i ...))`, or the
    /// original query when no expansion term is found.
    pub fn expand(&self, ctx: &EvalContext, original: QueryNode, ranking: &[ScoredDocument]) -> Result<QueryNode> {
        let terms = self.expansion_terms(ctx, ranking)?;
        if terms.is_empty() || self.original_weight >= 1.0 {
            return Ok(original);
        }

        let expanded = QueryNode::WAnd(terms.into_iter()
            .map(|(term, score)| WeightedNode::new(score, QueryNode::term(term, self.field.clone())))
            .collect());
        debug!(expanded = %expanded, "expanded query");

        Ok(QueryNode::WAnd(vec![
            WeightedNode::new(self.original_weight, original),
            WeightedNode::new(1.0 - self.original_weight, expanded),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DocId;
    use crate::index::memory::{IndexDocument, MemoryIndex};
    use crate::scoring::stats::CollectionStats;

    fn fixture() -> MemoryIndex {
        let mut index = MemoryIndex::new();
        index.add_document(IndexDocument::new("d0").field("body", "smog smog ozone city")).unwrap();
        index.add_document(IndexDocument::new("d1").field("body", "smog ozone harbor")).unwrap();
        index.add_document(IndexDocument::new("d2").field("body", "river fish harbor boats sail")).unwrap();
        index
    }

    fn expander(terms: usize) -> FeedbackExpander {
        FeedbackExpander {
            docs: 2,
            terms,
            mu: 0.0,
            original_weight: 0.5,
            field: "body".to_string(),
        }
    }

    fn ranking() -> Vec<ScoredDocument> {
        vec![
            ScoredDocument::new(DocId(0), "d0", 0.8),
            ScoredDocument::new(DocId(1), "d1", 0.4),
            ScoredDocument::new(DocId(2), "d2", 0.1),
        ]
    }

    #[test]
    fn test_expansion_term_scores() {
        let index = fixture();
        let stats = CollectionStats::new();
        let ctx = EvalContext::new(&index, &stats);

        let terms = expander(10).expansion_terms(&ctx, &ranking()).unwrap();
        // Only stems of the two feedback documents are candidates
        assert_eq!(terms.len(), 4);
        assert!(terms.iter().all(|(t, _)| t != "river"));

        // smog: ctf 3 of 12 tokens; tf 2/4 in d0 and 1/3 in d1
        let p: f64 = 3.0 / 12.0;
        let expected = (2.0 / 4.0 * 0.8 + 1.0 / 3.0 * 0.4) * (1.0 / p).ln();
        assert_eq!(terms[0].0, "smog");
        assert!((terms[0].1 - expected).abs() < 1e-12);
    }

    #[test]
    fn test_bounded_term_count() {
        let index = fixture();
        let stats = CollectionStats::new();
        let ctx = EvalContext::new(&index, &stats);

        let terms = expander(2).expansion_terms(&ctx, &ranking()).unwrap();
        assert_eq!(terms.len(), 2);
        assert!(terms[0].1 >= terms[1].1);
    }

    #[test]
    fn test_expand_wraps_original() {
        let index = fixture();
        let stats = CollectionStats::new();
        let ctx = EvalContext::new(&index, &stats);
        let original = QueryNode::And(vec![QueryNode::term("smog", "body")]);

        let expanded = expander(3).expand(&ctx, original.clone(), &ranking()).unwrap();
        match expanded {
            QueryNode::WAnd(args) => {
                assert_eq!(args.len(), 2);
                assert_eq!(args[0].node, original);
                assert_eq!(args[1].weight, 0.5);
                assert!(matches!(&args[1].node, QueryNode::WAnd(terms) if terms.len() == 3));
            }
            other => panic!("unexpected node {}", other),
        }

        let unchanged = expander(3).expand(&ctx, original.clone(), &[]).unwrap();
        assert_eq!(unchanged, original);
    }
}
