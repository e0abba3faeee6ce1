use std::collections::BinaryHeap;
use std::cmp::Ordering;
use tracing::debug;
use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::store::PostingStore;
use crate::query::result::ScoreList;

/// Document with relevance score and its external id
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub external_id: String,
    pub score: f64,
}

impl ScoredDocument {
    pub fn new(doc_id: DocId, external_id: impl Into<String>, score: f64) -> Self {
        ScoredDocument {
            doc_id,
            external_id: external_id.into(),
            score,
        }
    }
}

// Ordering is rank order: `Less` ranks first. Higher scores first, ties by
// ascending external id.
impl PartialEq for ScoredDocument {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredDocument {}

impl PartialOrd for ScoredDocument {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDocument {
    fn cmp(&self, other: &Self) -> Ordering {
        other.score.total_cmp(&self.score)
            .then_with(|| self.external_id.cmp(&other.external_id))
    }
}

/// Top-N collector. The heap top is the worst retained document.
pub struct TopNCollector {
    heap: BinaryHeap<ScoredDocument>,
    n: usize,
    total_collected: usize,  // Documents offered, retained or not
}

impl TopNCollector {
    pub fn new(n: usize) -> Self {
        TopNCollector {
            heap: BinaryHeap::with_capacity(n + 1),
            n,
            total_collected: 0,
        }
    }

    pub fn collect(&mut self, doc: ScoredDocument) {
        self.total_collected += 1;
        if self.n == 0 {
            return;
        }

        if self.heap.len() < self.n {
            self.heap.push(doc);
        } else if self.heap.peek().is_some_and(|worst| doc < *worst) {
            self.heap.pop();
            self.heap.push(doc);
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Retained documents, best first.
    pub fn into_ranked(self) -> Vec<ScoredDocument> {
        self.heap.into_sorted_vec()
    }
}

/// The best `n` documents of a score list. External ids are resolved up
/// front so the tie-break never reaches back into the store.
pub fn top_n(store: &dyn PostingStore, scores: &ScoreList, n: usize) -> Result<Vec<ScoredDocument>> {
    let mut collector = TopNCollector::new(n);
    for entry in &scores.entries {
        let external_id = store.external_id(entry.doc_id)?;
        collector.collect(ScoredDocument::new(entry.doc_id, external_id, entry.score));
    }
    debug!(offered = collector.total_collected, kept = collector.len(), "top-n collected");
    Ok(collector.into_ranked())
}
