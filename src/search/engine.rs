use std::io::Write;
use std::str::FromStr;
use tracing::{debug, info, warn};
use crate::analysis::analyzer::Analyzer;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::index::store::PostingStore;
use crate::query::ast::QueryNode;
use crate::query::eval::EvalContext;
use crate::query::expansion::FeedbackExpander;
use crate::query::parser::QueryParser;
use crate::query::result::ScoreList;
use crate::scoring::model::RankingModel;
use crate::scoring::stats::CollectionStats;
use crate::search::results::{self, ScoredDocument};
use crate::search::trec;

/// One `qid:query text` line of a query file.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryLine {
    pub id: String,
    pub text: String,
}

impl QueryLine {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        QueryLine {
            id: id.into(),
            text: text.into(),
        }
    }
}

impl FromStr for QueryLine {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let (id, text) = line.split_once(':')
            .ok_or_else(|| Error::parse(format!("query line '{}' lacks a 'qid:' prefix", line)))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::parse(format!("query line '{}' has an empty id", line)));
        }
        Ok(QueryLine::new(id, text.trim()))
    }
}

/// Parses, evaluates and ranks queries against one store under one
/// ranking model. Collection statistics are cached for the engine's lifetime.
pub struct QueryEngine<'a> {
    store: &'a dyn PostingStore,
    stats: CollectionStats,
    model: RankingModel,
    parser: QueryParser,
    top_n: usize,
    run_id: String,
    feedback: Option<FeedbackExpander>,
}

impl<'a> QueryEngine<'a> {
    pub fn new(store: &'a dyn PostingStore, config: &Config) -> Result<Self> {
        QueryEngine::with_analyzer(store, config, Analyzer::english())
    }

    pub fn with_analyzer(store: &'a dyn PostingStore, config: &Config, analyzer: Analyzer) -> Result<Self> {
        config.validate()?;
        let model = config.ranking_model()?;

        let feedback = match (config.feedback.enabled, &model) {
            (true, RankingModel::Indri(_)) => Some(FeedbackExpander::from_config(&config.feedback)),
            (true, other) => {
                warn!(model = other.name(), "query expansion is only defined for indri, disabled");
                None
            }
            (false, _) => None,
        };

        Ok(QueryEngine {
            store,
            stats: CollectionStats::new(),
            model,
            parser: QueryParser::new(analyzer, config.default_field.clone())?,
            top_n: config.top_n,
            run_id: config.run_id.clone(),
            feedback,
        })
    }

    pub fn context(&self) -> EvalContext<'_> {
        EvalContext::new(self.store, &self.stats)
    }

    pub fn parse(&self, query: &str) -> Result<Option<QueryNode>> {
        self.parser.parse(query, &self.model)
    }

    pub fn evaluate(&self, node: &QueryNode) -> Result<ScoreList> {
        self.context().evaluate_scores(node, &self.model)
    }

    /// Evaluate `node` and keep the best `n` documents.
    pub fn rank(&self, node: &QueryNode, n: usize) -> Result<Vec<ScoredDocument>> {
        let scores = self.evaluate(node)?;
        debug!(query = %node, matched = scores.len(), "evaluated query");
        results::top_n(self.store, &scores, n)
    }

    /// Parse, evaluate (with feedback when enabled) and rank a query.
    pub fn search(&self, query: &str, n: usize) -> Result<Vec<ScoredDocument>> {
        let Some(node) = self.parse(query)? else {
            return Ok(Vec::new());
        };

        match &self.feedback {
            Some(expander) => {
                let initial = self.rank(&node, expander.docs)?;
                let expanded = expander.expand(&self.context(), node, &initial)?;
                self.rank(&expanded, n)
            }
            None => self.rank(&node, n),
        }
    }

    /// Run each query in order and write its top documents in TREC format.
    pub fn run_batch<W: Write>(&self, queries: &[QueryLine], out: &mut W) -> Result<()> {
        for query in queries {
            let ranking = self.search(&query.text, self.top_n)?;
            info!(qid = %query.id, results = ranking.len(), "query complete");
            trec::write_ranking(out, &query.id, &ranking, &self.run_id)?;
        }
        out.flush()?;
        Ok(())
    }
}
