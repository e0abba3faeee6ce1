//! Term-level scoring formulas shared by the `#SCORE` operator, default
//! scores of absent documents, and the per-field LTR features.

use crate::scoring::model::{Bm25Params, IndriParams};

/// Robertson/Sparck-Jones weight: `ln((N - df + 0.5) / (df + 0.5))`.
/// Negative for terms occurring in more than half of the collection.
pub fn rsj_weight(num_docs: u64, doc_freq: u64) -> f64 {
    let n = num_docs as f64;
    let df = doc_freq as f64;
    ((n - df + 0.5) / (df + 0.5)).ln()
}

/// BM25 tf weight: `tf / (tf + k1 * (1 - b + b * docLen / avgDocLen))`.
pub fn bm25_tf_weight(params: &Bm25Params, tf: f64, doc_len: f64, avg_doc_len: f64) -> f64 {
    let norm = if avg_doc_len > 0.0 { doc_len / avg_doc_len } else { 0.0 };
    tf / (tf + params.k1() * (1.0 - params.b() + params.b() * norm))
}

/// BM25 user weight for a query term repeated `qtf` times.
pub fn bm25_user_weight(params: &Bm25Params, qtf: f64) -> f64 {
    (params.k3() + 1.0) * qtf / (params.k3() + qtf)
}

/// Full BM25 contribution of one term in one document, without user weight.
pub fn bm25_term_score(
    params: &Bm25Params,
    num_docs: u64,
    doc_freq: u64,
    tf: f64,
    doc_len: f64,
    avg_doc_len: f64,
) -> f64 {
    rsj_weight(num_docs, doc_freq) * bm25_tf_weight(params, tf, doc_len, avg_doc_len)
}

/// Maximum likelihood estimate of a term in a field: `ctf / |C|`.
pub fn p_mle(ctf: u64, collection_length: u64) -> f64 {
    if collection_length == 0 {
        0.0
    } else {
        ctf as f64 / collection_length as f64
    }
}

/// Indri term score:
/// `lambda * (tf + mu * P_mle) / (docLen + mu) + (1 - lambda) * P_mle`.
pub fn indri_term_score(params: &IndriParams, tf: f64, doc_len: f64, p_mle: f64) -> f64 {
    let denom = doc_len + params.mu();
    let smoothed = if denom > 0.0 { (tf + params.mu() * p_mle) / denom } else { 0.0 };
    params.lambda() * smoothed + (1.0 - params.lambda()) * p_mle
}

/// Score of a document that does not contain the term (tf = 0).
pub fn indri_default_score(params: &IndriParams, doc_len: f64, p_mle: f64) -> f64 {
    indri_term_score(params, 0.0, doc_len, p_mle)
}
