//! Learning-to-rank driver: feature files for training and for re-ranking
//! an initial BM25 ranking, the external trainer round trip, and the final
//! re-ranked TREC output.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};
use crate::analysis::analyzer::Analyzer;
use crate::core::config::{Config, RetrievalAlgorithm};
use crate::core::error::{Error, ErrorKind, Result};
use crate::index::store::PostingStore;
use crate::ltr::extractor::FeatureExtractor;
use crate::ltr::features::FeatureMask;
use crate::ltr::trainer::SvmRankTrainer;
use crate::ltr::vector::FeatureVector;
use crate::scoring::stats::CollectionStats;
use crate::search::engine::{QueryEngine, QueryLine};
use crate::search::results::{ScoredDocument, TopNCollector};
use crate::search::trec;

/// One `qid 0 external_id label` relevance judgment.
#[derive(Debug, Clone, PartialEq)]
pub struct QrelEntry {
    pub query_id: String,
    pub external_id: String,
    pub label: i32,
}

impl FromStr for QrelEntry {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [query_id, _, external_id, label] = fields[..] else {
            return Err(Error::parse(format!("qrel line '{}' needs 4 fields", line)));
        };
        let label = label.parse()
            .map_err(|_| Error::parse(format!("qrel label '{}' is not an integer", label)))?;
        Ok(QrelEntry {
            query_id: query_id.to_string(),
            external_id: external_id.to_string(),
            label,
        })
    }
}

/// Candidate documents of one test query, in initial ranking order.
pub type Candidates = (String, Vec<ScoredDocument>);

/// `external_id score` lines; blank lines are ignored.
pub fn parse_page_ranks<R: BufRead>(reader: R) -> Result<HashMap<String, f64>> {
    let mut scores = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let Some(external_id) = fields.next() else {
            continue;
        };
        let score = fields.next()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| Error::parse(format!("page rank line '{}' lacks a score", line)))?;
        scores.insert(external_id.to_string(), score);
    }
    Ok(scores)
}

/// Classifier output: one score per line, in feature-file row order.
pub fn parse_predictions<R: BufRead>(reader: R) -> Result<Vec<f64>> {
    let mut predictions = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let score = line.parse()
            .map_err(|_| Error::parse(format!("prediction '{}' is not a number", line)))?;
        predictions.push(score);
    }
    Ok(predictions)
}

/// Replace each candidate's score with its prediction and re-sort each
/// query's candidates. Predictions are consumed in candidate order.
pub fn rerank(candidates: &[Candidates], predictions: &[f64]) -> Result<Vec<Candidates>> {
    let expected: usize = candidates.iter().map(|(_, docs)| docs.len()).sum();
    if expected != predictions.len() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("{} predictions for {} candidates", predictions.len(), expected),
        ));
    }

    let mut predictions = predictions.iter();
    let mut reranked = Vec::with_capacity(candidates.len());
    for (query_id, docs) in candidates {
        let mut collector = TopNCollector::new(docs.len());
        for (doc, &score) in docs.iter().zip(predictions.by_ref()) {
            collector.collect(ScoredDocument::new(doc.doc_id, doc.external_id.clone(), score));
        }
        reranked.push((query_id.clone(), collector.into_ranked()));
    }
    Ok(reranked)
}

pub struct LearnToRank<'a> {
    store: &'a dyn PostingStore,
    config: Config,
    stats: CollectionStats,
    analyzer: Analyzer,
    mask: FeatureMask,
    page_rank: HashMap<String, f64>,
    trainer: SvmRankTrainer,
}

impl<'a> LearnToRank<'a> {
    pub fn new(store: &'a dyn PostingStore, config: &Config, page_rank: HashMap<String, f64>) -> Result<Self> {
        config.validate()?;
        Ok(LearnToRank {
            store,
            config: config.clone(),
            stats: CollectionStats::new(),
            analyzer: Analyzer::english(),
            mask: config.feature_mask()?,
            page_rank,
            trainer: SvmRankTrainer::from_config(&config.ltr),
        })
    }

    pub fn mask(&self) -> &FeatureMask {
        &self.mask
    }

    /// Normalized feature rows of `judged` (external id, label) documents.
    /// Documents missing from the index are skipped.
    pub fn feature_vector(&self, query: &QueryLine, judged: &[(String, i32)]) -> Result<FeatureVector> {
        let extractor = FeatureExtractor::new(
            self.store,
            &self.stats,
            self.config.bm25_params()?,
            self.config.indri_params()?,
            &self.page_rank,
        );
        let terms = self.analyzer.terms(&query.text);
        let mut vector = FeatureVector::new(query.id.clone(), &terms, self.mask);

        for (external_id, label) in judged {
            let doc_id = match self.store.internal_id(external_id) {
                Ok(doc_id) => doc_id,
                Err(e) if e.is_lookup_miss() => {
                    warn!(qid = %query.id, external_id = %external_id, "judged document not in index, skipped");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let row = extractor.extract(&vector, doc_id, external_id);
            vector.add_document(external_id.clone(), *label, row);
        }

        vector.normalize();
        Ok(vector)
    }

    /// Feature rows of every judged document, one query after another.
    pub fn write_training_features<W: Write>(&self, queries: &[QueryLine], qrels: &[QrelEntry], out: &mut W) -> Result<()> {
        for query in queries {
            let judged: Vec<(String, i32)> = qrels.iter()
                .filter(|q| q.query_id == query.id)
                .map(|q| (q.external_id.clone(), q.label))
                .collect();
            let vector = self.feature_vector(query, &judged)?;
            info!(qid = %query.id, docs = vector.len(), "training features written");
            write!(out, "{}", vector)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Feature rows (label 0) for the top of each query's BM25 ranking.
    /// Returns the candidates in the order their rows were written.
    pub fn write_test_features<W: Write>(&self, queries: &[QueryLine], out: &mut W) -> Result<Vec<Candidates>> {
        let mut initial = self.config.clone();
        initial.retrieval_algorithm = RetrievalAlgorithm::Bm25;
        initial.feedback.enabled = false;
        let engine = QueryEngine::new(self.store, &initial)?;

        let mut candidates = Vec::with_capacity(queries.len());
        for query in queries {
            let ranking = engine.search(&query.text, self.config.ltr.initial_ranking_depth)?;
            let judged: Vec<(String, i32)> = ranking.iter()
                .map(|d| (d.external_id.clone(), 0))
                .collect();
            let vector = self.feature_vector(query, &judged)?;
            info!(qid = %query.id, docs = vector.len(), "test features written");
            write!(out, "{}", vector)?;
            candidates.push((query.id.clone(), ranking));
        }
        out.flush()?;
        Ok(candidates)
    }

    pub fn train(&self, train_file: &Path, model_file: &Path) -> Result<()> {
        self.trainer.train(train_file, model_file)
    }

    pub fn classify(&self, test_file: &Path, model_file: &Path, predictions_file: &Path) -> Result<()> {
        self.trainer.classify(test_file, model_file, predictions_file)
    }

    /// Train on `train_queries`, re-rank the BM25 candidates of
    /// `test_queries`, and write the re-ranked TREC run to `out`.
    /// Intermediate files are kept in `work_dir`.
    pub fn run<W: Write>(
        &self,
        train_queries: &[QueryLine],
        qrels: &[QrelEntry],
        test_queries: &[QueryLine],
        work_dir: &Path,
        out: &mut W,
    ) -> Result<()> {
        let train_file = work_dir.join("train.dat");
        let model_file = work_dir.join("model.dat");
        let test_file = work_dir.join("test.dat");
        let predictions_file = work_dir.join("predictions.dat");

        self.write_training_features(train_queries, qrels, &mut BufWriter::new(File::create(&train_file)?))?;
        self.train(&train_file, &model_file)?;

        let candidates = self.write_test_features(test_queries, &mut BufWriter::new(File::create(&test_file)?))?;
        self.classify(&test_file, &model_file, &predictions_file)?;

        let predictions = parse_predictions(BufReader::new(File::open(&predictions_file)?))?;
        for (query_id, ranking) in rerank(&candidates, &predictions)? {
            trec::write_ranking(out, &query_id, &ranking, &self.config.run_id)?;
        }
        out.flush()?;
        Ok(())
    }
}
