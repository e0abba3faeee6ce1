use tracing::debug;
use crate::core::error::{Error, ErrorKind, Result};
use crate::index::posting::InvertedList;
use crate::index::store::PostingStore;
use crate::query::ast::{QueryNode, WeightedNode};
use crate::query::daat;
use crate::query::proximity;
use crate::query::result::{DefaultScore, QueryResult, ScoreList};
use crate::scoring::model::RankingModel;
use crate::scoring::scorer;
use crate::scoring::stats::CollectionStats;

/// Everything an operator needs besides its children: the index and the
/// run-wide statistics cache.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub store: &'a dyn PostingStore,
    pub stats: &'a CollectionStats,
}

impl<'a> EvalContext<'a> {
    pub fn new(store: &'a dyn PostingStore, stats: &'a CollectionStats) -> Self {
        EvalContext { store, stats }
    }

    /// Evaluate `node` and coerce an inverted-list result into scores, as if
    /// the tree were wrapped in `#SCORE`.
    pub fn evaluate_scores(&self, node: &QueryNode, model: &RankingModel) -> Result<ScoreList> {
        match self.evaluate(node, model)? {
            QueryResult::Scores(scores) => Ok(scores),
            QueryResult::Inverted(list) => self.score_inverted(&list, model),
        }
    }

    pub fn evaluate(&self, node: &QueryNode, model: &RankingModel) -> Result<QueryResult> {
        check_supported(node, model)?;

        match node {
            QueryNode::Term { term, field } => {
                let list = self.store.postings(term, field)?;
                self.stats.remember_ctf(term, field, list.ctf);
                debug!(term = %term, field = %field, df = list.doc_freq(), "fetched postings");
                Ok(QueryResult::Inverted(list))
            }
            QueryNode::Syn(args) => {
                let lists = self.evaluate_inverted(args, model, "#SYN")?;
                Ok(QueryResult::Inverted(proximity::syn(lists)?))
            }
            QueryNode::Near { distance, args } => {
                let lists = self.evaluate_inverted(args, model, "#NEAR")?;
                Ok(QueryResult::Inverted(proximity::near(lists, *distance)?))
            }
            QueryNode::Window { distance, args } => {
                let lists = self.evaluate_inverted(args, model, "#WINDOW")?;
                Ok(QueryResult::Inverted(proximity::window(lists, *distance)?))
            }
            QueryNode::Score(child) => Ok(QueryResult::Scores(self.evaluate_scores(child, model)?)),
            QueryNode::And(args) => {
                let lists = self.evaluate_children(args, model)?;
                let scores = match model {
                    RankingModel::Indri(_) => daat::indri_and(self.store, lists)?,
                    _ => daat::boolean_and(lists, *model == RankingModel::RankedBoolean),
                };
                Ok(QueryResult::Scores(scores))
            }
            QueryNode::Or(args) => {
                let lists = self.evaluate_children(args, model)?;
                Ok(QueryResult::Scores(daat::boolean_or(lists, *model == RankingModel::RankedBoolean)))
            }
            QueryNode::Sum(args) => Ok(QueryResult::Scores(self.evaluate_sum(args, model)?)),
            QueryNode::WSum(args) => {
                let lists = self.evaluate_weighted(args, model)?;
                Ok(QueryResult::Scores(daat::weighted_sum(self.store, lists)?))
            }
            QueryNode::WAnd(args) => {
                let lists = self.evaluate_weighted(args, model)?;
                Ok(QueryResult::Scores(daat::weighted_and(self.store, lists)?))
            }
        }
    }

    /// `#SCORE` over an inverted list under `model`.
    pub fn score_inverted(&self, list: &InvertedList, model: &RankingModel) -> Result<ScoreList> {
        let mut scores = ScoreList::empty();

        match model {
            RankingModel::UnrankedBoolean => {
                for posting in &list.postings {
                    scores.push(posting.doc_id, 1.0);
                }
            }
            RankingModel::RankedBoolean => {
                for posting in &list.postings {
                    scores.push(posting.doc_id, posting.term_freq as f64);
                }
            }
            RankingModel::Bm25(params) => {
                let num_docs = self.store.num_docs();
                let avg_len = self.stats.avg_field_length(self.store, &list.field)?;
                for posting in &list.postings {
                    let doc_len = self.store.doc_length(&list.field, posting.doc_id)? as f64;
                    let score = scorer::bm25_term_score(
                        params,
                        num_docs,
                        list.doc_freq(),
                        posting.term_freq as f64,
                        doc_len,
                        avg_len,
                    );
                    scores.push(posting.doc_id, score);
                }
            }
            RankingModel::Indri(params) => {
                let collection_length = self.stats.collection_length(self.store, &list.field)?;
                let p_mle = scorer::p_mle(list.ctf, collection_length);
                for posting in &list.postings {
                    let doc_len = self.store.doc_length(&list.field, posting.doc_id)? as f64;
                    let score = scorer::indri_term_score(params, posting.term_freq as f64, doc_len, p_mle);
                    scores.push(posting.doc_id, score);
                }
                scores.default = DefaultScore::Smoothed {
                    params: *params,
                    field: list.field.clone(),
                    p_mle,
                };
            }
        }

        Ok(scores)
    }

    fn evaluate_inverted(
        &self,
        args: &[QueryNode],
        model: &RankingModel,
        operator: &str,
    ) -> Result<Vec<InvertedList>> {
        args.iter()
            .map(|arg| match self.evaluate(arg, model)? {
                QueryResult::Inverted(list) => Ok(list),
                QueryResult::Scores(_) => Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("{} arguments must be inverted lists, got {}", operator, arg.name()),
                )),
            })
            .collect()
    }

    fn evaluate_children(&self, args: &[QueryNode], model: &RankingModel) -> Result<Vec<ScoreList>> {
        args.iter().map(|arg| self.evaluate_scores(arg, model)).collect()
    }

    fn evaluate_weighted(&self, args: &[WeightedNode], model: &RankingModel) -> Result<Vec<(f64, ScoreList)>> {
        args.iter()
            .map(|arg| Ok((arg.weight, self.evaluate_scores(&arg.node, model)?)))
            .collect()
    }

    /// BM25 `#SUM`: structurally identical arguments are evaluated once and
    /// weighted by their query term frequency.
    fn evaluate_sum(&self, args: &[QueryNode], model: &RankingModel) -> Result<ScoreList> {
        let RankingModel::Bm25(params) = model else {
            return Err(unsupported(&QueryNode::Sum(Vec::new()), model));
        };

        let mut groups: Vec<(&QueryNode, usize)> = Vec::new();
        for arg in args {
            match groups.iter_mut().find(|(node, _)| *node == arg) {
                Some((_, qtf)) => *qtf += 1,
                None => groups.push((arg, 1)),
            }
        }

        let mut lists = Vec::with_capacity(groups.len());
        for (node, qtf) in groups {
            let user_weight = scorer::bm25_user_weight(params, qtf as f64);
            lists.push((user_weight, self.evaluate_scores(node, model)?));
        }
        Ok(daat::bm25_sum(lists))
    }
}

fn unsupported(node: &QueryNode, model: &RankingModel) -> Error {
    Error::new(
        ErrorKind::UnsupportedQuery,
        format!("{} is not defined for the {} model", node.name(), model.name()),
    )
}

fn check_supported(node: &QueryNode, model: &RankingModel) -> Result<()> {
    let supported = match node {
        QueryNode::Term { .. }
        | QueryNode::Syn(_)
        | QueryNode::Near { .. }
        | QueryNode::Window { .. }
        | QueryNode::Score(_) => true,
        QueryNode::And(_) => model.is_boolean() || matches!(model, RankingModel::Indri(_)),
        QueryNode::Or(_) => model.is_boolean(),
        QueryNode::Sum(_) => matches!(model, RankingModel::Bm25(_)),
        QueryNode::WSum(_) | QueryNode::WAnd(_) => matches!(model, RankingModel::Indri(_)),
    };

    if supported {
        Ok(())
    } else {
        Err(unsupported(node, model))
    }
}
