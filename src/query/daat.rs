//! Document-at-a-time combination of child score lists.
//!
//! Every child list is sorted by doc id; outputs keep that order.

use std::collections::HashMap;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::store::PostingStore;
use crate::query::result::{DefaultScore, ScoreList};

/// Boolean `#AND`. The shortest list drives; the score is the minimum child
/// score when ranked, 1.0 otherwise.
pub fn boolean_and(mut lists: Vec<ScoreList>, ranked: bool) -> ScoreList {
    let mut result = ScoreList::empty();
    lists.sort_by_key(ScoreList::len);
    let Some((driver, rest)) = lists.split_first() else {
        return result;
    };

    let mut cursors = vec![0usize; rest.len()];
    'docs: for entry in &driver.entries {
        let mut score = if ranked { entry.score } else { 1.0 };
        for (list, cursor) in rest.iter().zip(cursors.iter_mut()) {
            while *cursor < list.len() && list.entries[*cursor].doc_id < entry.doc_id {
                *cursor += 1;
            }
            match list.entries.get(*cursor) {
                None => break 'docs,
                Some(other) if other.doc_id != entry.doc_id => continue 'docs,
                Some(other) => {
                    if ranked {
                        score = score.min(other.score);
                    }
                }
            }
        }
        result.push(entry.doc_id, score);
    }

    result
}

/// Boolean `#OR`. The score is the maximum child score when ranked, 1.0 otherwise.
pub fn boolean_or(lists: Vec<ScoreList>, ranked: bool) -> ScoreList {
    let mut scores: HashMap<DocId, f64> = HashMap::new();
    for list in &lists {
        for entry in &list.entries {
            let score = if ranked { entry.score } else { 1.0 };
            scores.entry(entry.doc_id)
                .and_modify(|s| *s = s.max(score))
                .or_insert(score);
        }
    }
    ScoreList::from_unsorted(scores.into_iter().collect(), DefaultScore::Zero)
}

/// BM25 `#SUM`: sum of `user_weight * score` over the children holding the document.
pub fn bm25_sum(lists: Vec<(f64, ScoreList)>) -> ScoreList {
    let mut scores: HashMap<DocId, f64> = HashMap::new();
    for (user_weight, list) in &lists {
        for entry in &list.entries {
            *scores.entry(entry.doc_id).or_insert(0.0) += user_weight * entry.score;
        }
    }
    ScoreList::from_unsorted(scores.into_iter().collect(), DefaultScore::Zero)
}

/// Indri `#AND`: `(prod s_i) ^ (1/q)`, i.e. `#WAND` with equal weights.
pub fn indri_and(store: &dyn PostingStore, lists: Vec<ScoreList>) -> Result<ScoreList> {
    weighted_and(store, lists.into_iter().map(|l| (1.0, l)).collect())
}

/// `#WAND`: weighted geometric mean with weights normalized to sum to 1.
pub fn weighted_and(store: &dyn PostingStore, lists: Vec<(f64, ScoreList)>) -> Result<ScoreList> {
    let (weights, lists) = normalize_weights(lists, "#WAND")?;
    let mut result = fold_with_defaults(store, &lists, 1.0, |acc, i, score| {
        acc * score.powf(weights[i])
    })?;
    result.default = DefaultScore::Geometric(
        weights.iter().copied().zip(lists.into_iter().map(|l| l.default)).collect(),
    );
    Ok(result)
}

/// `#WSUM`: weighted arithmetic mean with weights normalized to sum to 1.
pub fn weighted_sum(store: &dyn PostingStore, lists: Vec<(f64, ScoreList)>) -> Result<ScoreList> {
    let (weights, lists) = normalize_weights(lists, "#WSUM")?;
    let mut result = fold_with_defaults(store, &lists, 0.0, |acc, i, score| {
        acc + weights[i] * score
    })?;
    result.default = DefaultScore::Weighted(
        weights.iter().copied().zip(lists.into_iter().map(|l| l.default)).collect(),
    );
    Ok(result)
}

fn normalize_weights(lists: Vec<(f64, ScoreList)>, operator: &str) -> Result<(Vec<f64>, Vec<ScoreList>)> {
    let total: f64 = lists.iter().map(|(w, _)| *w).sum();
    if lists.iter().any(|(w, _)| !(*w >= 0.0)) || !(total > 0.0) {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("{} weights must be non-negative with a positive sum", operator),
        ));
    }
    Ok(lists.into_iter().map(|(w, l)| (w / total, l)).unzip())
}

/// Doc ids present in any list, merged in increasing order.
fn union_doc_ids(lists: &[ScoreList]) -> Vec<DocId> {
    let mut cursors = vec![0usize; lists.len()];
    let mut docs = Vec::new();

    loop {
        let next = lists.iter()
            .zip(&cursors)
            .filter_map(|(list, &c)| list.entries.get(c).map(|e| e.doc_id))
            .min();
        let Some(doc_id) = next else {
            break;
        };
        docs.push(doc_id);
        for (list, cursor) in lists.iter().zip(cursors.iter_mut()) {
            if list.entries.get(*cursor).is_some_and(|e| e.doc_id == doc_id) {
                *cursor += 1;
            }
        }
    }

    docs
}

/// Fold every child's score into each document of the union, substituting
/// the child's default score where the document is absent.
fn fold_with_defaults<F>(
    store: &dyn PostingStore,
    lists: &[ScoreList],
    init: f64,
    mut combine: F,
) -> Result<ScoreList>
where
    F: FnMut(f64, usize, f64) -> f64,
{
    let docs = union_doc_ids(lists);
    let mut scores = vec![init; docs.len()];

    for (i, list) in lists.iter().enumerate() {
        let mut entries = list.entries.iter().peekable();
        for (doc_id, acc) in docs.iter().zip(scores.iter_mut()) {
            let score = match entries.next_if(|e| e.doc_id == *doc_id) {
                Some(entry) => entry.score,
                None => list.default.score(store, *doc_id)?,
            };
            *acc = combine(*acc, i, score);
        }
    }

    let mut result = ScoreList::empty();
    for (doc_id, score) in docs.into_iter().zip(scores) {
        result.push(doc_id, score);
    }
    Ok(result)
}
