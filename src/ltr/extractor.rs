use std::collections::HashMap;
use tracing::{debug, warn};
use crate::core::error::{Error, Result};
use crate::core::types::DocId;
use crate::index::store::{PostingStore, TermVector};
use crate::ltr::features::{Feature, FEATURE_COUNT, FIELD_FEATURES};
use crate::ltr::vector::FeatureVector;
use crate::scoring::model::{Bm25Params, IndriParams};
use crate::scoring::scorer;
use crate::scoring::stats::CollectionStats;

fn log_failure(source: &str, error: &Error) {
    if error.is_lookup_miss() {
        debug!(source, error = %error, "feature input unavailable");
    } else {
        warn!(source, error = %error, "feature input failed, using default");
    }
}

/// A failed feature computation contributes NaN instead of failing the row.
fn recover(result: Result<f64>, feature: Feature) -> f64 {
    result.unwrap_or_else(|e| {
        log_failure(&format!("{:?}", feature), &e);
        f64::NAN
    })
}

fn recover_option<T>(result: Result<Option<T>>, source: &str) -> Option<T> {
    result.unwrap_or_else(|e| {
        log_failure(source, &e);
        None
    })
}

pub fn url_depth(raw_url: Option<&str>) -> f64 {
    raw_url.map_or(0.0, |url| url.matches('/').count() as f64)
}

pub fn from_wikipedia(raw_url: Option<&str>) -> f64 {
    match raw_url {
        Some(url) if url.to_lowercase().contains("wikipedia.org") => 1.0,
        _ => 0.0,
    }
}

pub fn domain_prior(raw_url: Option<&str>) -> f64 {
    let Some(url) = raw_url else {
        return 0.0;
    };
    if url.contains(".edu") || url.contains(".mil") {
        1.0
    } else if url.contains(".org") {
        0.95
    } else {
        0.0
    }
}

/// Computes the feature row of one (query, document) pair directly from the
/// document's term vectors and stored attributes.
pub struct FeatureExtractor<'a> {
    store: &'a dyn PostingStore,
    stats: &'a CollectionStats,
    bm25: Bm25Params,
    indri: IndriParams,
    page_rank: &'a HashMap<String, f64>,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(
        store: &'a dyn PostingStore,
        stats: &'a CollectionStats,
        bm25: Bm25Params,
        indri: IndriParams,
        page_rank: &'a HashMap<String, f64>,
    ) -> Self {
        FeatureExtractor { store, stats, bm25, indri, page_rank }
    }

    /// Feature row for `doc_id`. Disabled features are left as NaN and
    /// never computed; a feature whose inputs cannot be read is NaN too.
    pub fn extract(&self, query: &FeatureVector, doc_id: DocId, external_id: &str) -> [f64; FEATURE_COUNT] {
        let mask = query.mask();
        let mut row = [f64::NAN; FEATURE_COUNT];

        let raw_url = recover_option(self.store.stored_field(doc_id, "rawUrl"), "rawUrl");
        let raw_url = raw_url.as_deref();

        if mask.is_enabled(Feature::SpamScore) {
            row[Feature::SpamScore.index()] = recover(self.spam_score(doc_id), Feature::SpamScore);
        }
        if mask.is_enabled(Feature::UrlDepth) {
            row[Feature::UrlDepth.index()] = url_depth(raw_url);
        }
        if mask.is_enabled(Feature::FromWikipedia) {
            row[Feature::FromWikipedia.index()] = from_wikipedia(raw_url);
        }
        if mask.is_enabled(Feature::PageRank) {
            row[Feature::PageRank.index()] = match self.page_rank.get(external_id) {
                Some(&score) => score,
                None => {
                    warn!(external_id, "no page rank for document");
                    f64::NAN
                }
            };
        }

        let mut contains_query_term = false;
        for fields in &FIELD_FEATURES {
            let wanted = [fields.bm25, fields.indri, fields.overlap, Feature::ContainsQueryTerm]
                .iter()
                .any(|f| mask.is_enabled(*f));
            if !wanted {
                continue;
            }

            let Some(vector) = recover_option(self.store.term_vector(doc_id, fields.field), fields.field) else {
                continue;
            };

            if mask.is_enabled(fields.bm25) {
                row[fields.bm25.index()] = recover(self.bm25_score(query, &vector, fields.field, doc_id), fields.bm25);
            }
            if mask.is_enabled(fields.indri) {
                row[fields.indri.index()] = recover(self.indri_score(query, &vector, fields.field, doc_id), fields.indri);
            }
            if mask.is_enabled(fields.overlap) {
                row[fields.overlap.index()] = overlap(query, &vector);
            }
            contains_query_term |= vector.stems().any(|s| query.term_table().contains_key(s));
        }

        if mask.is_enabled(Feature::DomainPrior) {
            row[Feature::DomainPrior.index()] = domain_prior(raw_url);
        }
        if mask.is_enabled(Feature::ContainsQueryTerm) {
            row[Feature::ContainsQueryTerm.index()] = if contains_query_term { 1.0 } else { 0.0 };
        }

        row
    }

    fn spam_score(&self, doc_id: DocId) -> Result<f64> {
        Ok(self.store.stored_field(doc_id, "score")?
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(f64::NAN))
    }

    /// BM25 over the document's own stems that occur in the query.
    fn bm25_score(&self, query: &FeatureVector, vector: &TermVector, field: &str, doc_id: DocId) -> Result<f64> {
        let num_docs = self.store.num_docs();
        let avg_len = self.stats.avg_field_length(self.store, field)?;
        let doc_len = self.store.doc_length(field, doc_id)? as f64;

        let mut score = 0.0;
        for entry in &vector.entries {
            let Some(&qtf) = query.term_table().get(&entry.stem) else {
                continue;
            };
            let term = scorer::bm25_term_score(&self.bm25, num_docs, entry.df, entry.tf as f64, doc_len, avg_len);
            score += term * scorer::bm25_user_weight(&self.bm25, qtf as f64);
        }
        Ok(score)
    }

    /// Indri query likelihood: `prod(score_t ^ (qtf / |q|))` over unique
    /// query stems, 0 when the field shares no stem with the query.
    fn indri_score(&self, query: &FeatureVector, vector: &TermVector, field: &str, doc_id: DocId) -> Result<f64> {
        let table = query.term_table();
        if !vector.stems().any(|s| table.contains_key(s)) {
            return Ok(0.0);
        }

        let collection_length = self.stats.collection_length(self.store, field)?;
        let doc_len = self.store.doc_length(field, doc_id)? as f64;
        let query_length = query.query_length() as f64;

        let mut score = 1.0;
        for (stem, &qtf) in table {
            let (tf, ctf) = match vector.get(stem) {
                Some(entry) => (entry.tf as f64, entry.ctf),
                None => (0.0, self.stats.ctf(self.store, stem, field)?),
            };
            let p_mle = scorer::p_mle(ctf, collection_length);
            score *= scorer::indri_term_score(&self.indri, tf, doc_len, p_mle).powf(qtf as f64 / query_length);
        }
        Ok(score)
    }
}

/// Sum of query counts of the query stems present in the field, over |q|.
pub fn overlap(query: &FeatureVector, vector: &TermVector) -> f64 {
    if query.query_length() == 0 {
        return 0.0;
    }
    let count: usize = vector.stems()
        .filter_map(|s| query.term_table().get(s))
        .sum();
    count as f64 / query.query_length() as f64
}
