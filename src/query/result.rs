use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::posting::InvertedList;
use crate::index::store::PostingStore;
use crate::scoring::model::IndriParams;
use crate::scoring::scorer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreEntry {
    pub doc_id: DocId,
    pub score: f64,
}

/// Score a child contributes for a document missing from its score list.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultScore {
    Zero,
    /// Indri smoothing of a single term: tf = 0 in the document's field.
    Smoothed { params: IndriParams, field: String, p_mle: f64 },
    /// `prod(d_i ^ w_i)` over child defaults.
    Geometric(Vec<(f64, DefaultScore)>),
    /// `sum(w_i * d_i)` over child defaults.
    Weighted(Vec<(f64, DefaultScore)>),
}

impl DefaultScore {
    pub fn score(&self, store: &dyn PostingStore, doc_id: DocId) -> Result<f64> {
        match self {
            DefaultScore::Zero => Ok(0.0),
            DefaultScore::Smoothed { params, field, p_mle } => {
                let doc_len = store.doc_length(field, doc_id)? as f64;
                Ok(scorer::indri_default_score(params, doc_len, *p_mle))
            }
            DefaultScore::Geometric(children) => {
                let mut score = 1.0;
                for (weight, child) in children {
                    score *= child.score(store, doc_id)?.powf(*weight);
                }
                Ok(score)
            }
            DefaultScore::Weighted(children) => {
                let mut score = 0.0;
                for (weight, child) in children {
                    score += weight * child.score(store, doc_id)?;
                }
                Ok(score)
            }
        }
    }
}

/// Scored documents in strictly increasing doc id order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreList {
    pub entries: Vec<ScoreEntry>,
    pub default: DefaultScore,
}

impl ScoreList {
    pub fn new(default: DefaultScore) -> Self {
        ScoreList {
            entries: Vec::new(),
            default,
        }
    }

    pub fn empty() -> Self {
        ScoreList::new(DefaultScore::Zero)
    }

    pub fn push(&mut self, doc_id: DocId, score: f64) {
        debug_assert!(self.entries.last().map_or(true, |e| e.doc_id < doc_id));
        self.entries.push(ScoreEntry { doc_id, score });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, doc_id: DocId) -> Option<f64> {
        self.entries.binary_search_by_key(&doc_id, |e| e.doc_id)
            .ok()
            .map(|i| self.entries[i].score)
    }

    /// Build from unordered (doc, score) pairs, e.g. a hash accumulator.
    pub fn from_unsorted(mut pairs: Vec<(DocId, f64)>, default: DefaultScore) -> Self {
        pairs.sort_unstable_by_key(|(doc_id, _)| *doc_id);
        ScoreList {
            entries: pairs.into_iter()
                .map(|(doc_id, score)| ScoreEntry { doc_id, score })
                .collect(),
            default,
        }
    }
}

/// Output of evaluating a query node.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Inverted(InvertedList),
    Scores(ScoreList),
}
