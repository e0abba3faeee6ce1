use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{map, map_res, value, verify},
    multi::many0,
    number::complete::double,
    sequence::preceded,
};
use regex::Regex;
use tracing::debug;
use crate::analysis::analyzer::Analyzer;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::FIELDS;
use crate::query::ast::{QueryNode, WeightedNode};
use crate::scoring::model::RankingModel;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operator {
    And,
    Or,
    Sum,
    WAnd,
    WSum,
    Syn,
    Score,
    Near(u32),
    Window(u32),
}

impl Operator {
    fn is_weighted(self) -> bool {
        matches!(self, Operator::WAnd | Operator::WSum)
    }
}

/// Syntax tree before analysis: raw term text, optional weights.
#[derive(Debug, Clone, PartialEq)]
enum RawNode {
    Term(String),
    Op { operator: Operator, args: Vec<RawArg> },
}

#[derive(Debug, Clone, PartialEq)]
struct RawArg {
    weight: Option<f64>,
    node: RawNode,
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

fn separator(input: &str) -> IResult<&str, &str> {
    take_while(is_separator).parse(input)
}

fn distance(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |d: &str| d.parse::<u32>()).parse(input)
}

fn operator(input: &str) -> IResult<&str, Operator> {
    alt((
        map(preceded(tag_no_case("#near/"), distance), Operator::Near),
        map(preceded(tag_no_case("#window/"), distance), Operator::Window),
        value(Operator::WAnd, tag_no_case("#wand")),
        value(Operator::WSum, tag_no_case("#wsum")),
        value(Operator::And, tag_no_case("#and")),
        value(Operator::Or, tag_no_case("#or")),
        value(Operator::Sum, tag_no_case("#sum")),
        value(Operator::Syn, tag_no_case("#syn")),
        value(Operator::Score, tag_no_case("#score")),
    )).parse(input)
}

fn term(input: &str) -> IResult<&str, RawNode> {
    map(
        verify(
            take_while1(|c: char| !is_separator(c) && c != '(' && c != ')'),
            |s: &str| !s.starts_with('#'),
        ),
        |s: &str| RawNode::Term(s.to_string()),
    ).parse(input)
}

fn weighted_arg(input: &str) -> IResult<&str, RawArg> {
    let (input, weight) = double(input)?;
    let (input, _) = take_while1(is_separator).parse(input)?;
    let (input, node) = node(input)?;
    Ok((input, RawArg { weight: Some(weight), node }))
}

fn plain_arg(input: &str) -> IResult<&str, RawArg> {
    map(node, |node| RawArg { weight: None, node }).parse(input)
}

fn operator_node(input: &str) -> IResult<&str, RawNode> {
    let (input, operator) = operator(input)?;
    let (input, _) = preceded(multispace0, char('(')).parse(input)?;
    let (input, args) = if operator.is_weighted() {
        many0(preceded(separator, weighted_arg)).parse(input)?
    } else {
        many0(preceded(separator, plain_arg)).parse(input)?
    };
    let (input, _) = preceded(separator, char(')')).parse(input)?;
    Ok((input, RawNode::Op { operator, args }))
}

fn node(input: &str) -> IResult<&str, RawNode> {
    alt((operator_node, term)).parse(input)
}

/// Structured query parser producing analyzed operator trees.
///
/// Syntax: `#AND #OR #SUM #WAND #WSUM #SYN #SCORE #NEAR/k #WINDOW/k`
/// (case-insensitive), weights before each argument of `#WAND`/`#WSUM`,
/// and terms optionally suffixed with `.body .title .url .keywords .inlink`.
/// A query not starting with `#` is wrapped in the model's default operator.
pub struct QueryParser {
    analyzer: Analyzer,
    default_field: String,
    field_suffix: Regex,
}

impl QueryParser {
    pub fn new(analyzer: Analyzer, default_field: impl Into<String>) -> Result<Self> {
        let field_suffix = Regex::new(&format!(r"(?i)^(.+)\.({})$", FIELDS.join("|")))
            .map_err(|e| Error::new(ErrorKind::Internal, format!("field suffix pattern: {}", e)))?;
        Ok(QueryParser {
            analyzer,
            default_field: default_field.into(),
            field_suffix,
        })
    }

    pub fn default_operator(model: &RankingModel) -> &'static str {
        match model {
            RankingModel::UnrankedBoolean | RankingModel::RankedBoolean => "#or",
            RankingModel::Bm25(_) => "#sum",
            RankingModel::Indri(_) => "#and",
        }
    }

    /// Parse and analyze `query`. Returns `None` when nothing searchable
    /// is left after analysis (e.g. a stopword-only query).
    pub fn parse(&self, query: &str, model: &RankingModel) -> Result<Option<QueryNode>> {
        let trimmed = query.trim();
        let text = if trimmed.starts_with('#') {
            trimmed.to_string()
        } else {
            format!("{}({})", Self::default_operator(model), trimmed)
        };

        let (rest, raw) = preceded(separator, node)
            .parse(text.as_str())
            .map_err(|e| Error::parse(format!("malformed query '{}': {}", query, e)))?;
        let (rest, _) = separator(rest)
            .map_err(|e| Error::parse(format!("malformed query '{}': {}", query, e)))?;
        if !rest.is_empty() {
            return Err(Error::parse(format!("unexpected text '{}' in query '{}'", rest, query)));
        }

        let mut nodes = self.build(raw)?;
        let root = match nodes.len() {
            0 => None,
            1 => nodes.pop(),
            _ => Some(QueryNode::And(nodes)),
        };
        if let Some(root) = &root {
            debug!(query = %query, parsed = %root, terms = root.term_count(), "parsed query");
        }
        Ok(root)
    }

    /// Analyze a raw node. A term may yield zero stems (stopword) or several.
    fn build(&self, raw: RawNode) -> Result<Vec<QueryNode>> {
        match raw {
            RawNode::Term(text) => Ok(self.analyze_term(&text)),
            RawNode::Op { operator, args } => {
                if args.is_empty() {
                    return Err(Error::parse(format!("operator {:?} has no arguments", operator)));
                }
                self.build_operator(operator, args)
            }
        }
    }

    fn build_operator(&self, operator: Operator, args: Vec<RawArg>) -> Result<Vec<QueryNode>> {
        if operator.is_weighted() {
            let mut weighted = Vec::new();
            for arg in args {
                let weight = arg.weight
                    .ok_or_else(|| Error::parse(format!("{:?} argument is missing a weight", operator)))?;
                for node in self.build(arg.node)? {
                    weighted.push(WeightedNode::new(weight, node));
                }
            }
            if weighted.is_empty() {
                return Ok(Vec::new());
            }
            return Ok(vec![match operator {
                Operator::WAnd => QueryNode::WAnd(weighted),
                _ => QueryNode::WSum(weighted),
            }]);
        }

        let mut children = Vec::new();
        for arg in args {
            children.extend(self.build(arg.node)?);
        }
        if children.is_empty() {
            return Ok(Vec::new());
        }

        let node = match operator {
            Operator::And => QueryNode::And(children),
            Operator::Or => QueryNode::Or(children),
            Operator::Sum => QueryNode::Sum(children),
            Operator::Syn => QueryNode::Syn(children),
            Operator::Near(0) | Operator::Window(0) => {
                return Err(Error::parse(format!("{:?} needs a positive distance", operator)));
            }
            Operator::Near(distance) => QueryNode::Near { distance, args: children },
            Operator::Window(distance) => QueryNode::Window { distance, args: children },
            Operator::Score => {
                if children.len() != 1 {
                    return Err(Error::parse("#SCORE takes exactly one argument"));
                }
                QueryNode::Score(Box::new(children.remove(0)))
            }
            Operator::WAnd | Operator::WSum => {
                return Err(Error::new(ErrorKind::Internal, "weighted operator without weights"));
            }
        };
        Ok(vec![node])
    }

    fn analyze_term(&self, text: &str) -> Vec<QueryNode> {
        let (word, field) = match self.field_suffix.captures(text) {
            Some(caps) => (
                caps.get(1).map_or(text, |m| m.as_str()),
                caps.get(2).map_or(self.default_field.clone(), |m| m.as_str().to_lowercase()),
            ),
            None => (text, self.default_field.clone()),
        };

        self.analyzer.terms(word)
            .into_iter()
            .map(|stem| QueryNode::term(stem, field.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::model::{Bm25Params, IndriParams};

    fn parser() -> QueryParser {
        QueryParser::new(Analyzer::english(), "body").unwrap()
    }

    fn bm25() -> RankingModel {
        RankingModel::Bm25(Bm25Params::default())
    }

    #[test]
    fn test_unstructured_query_gets_default_operator() {
        let p = parser();
        let node = p.parse("polluted rivers", &bm25()).unwrap().unwrap();
        assert_eq!(node.to_string(), "#SUM( pollut.body river.body )");

        let node = p.parse("polluted rivers", &RankingModel::Indri(IndriParams::default())).unwrap().unwrap();
        assert!(matches!(node, QueryNode::And(_)));

        let node = p.parse("rivers", &RankingModel::UnrankedBoolean).unwrap().unwrap();
        assert!(matches!(node, QueryNode::Or(_)));
    }

    #[test]
    fn test_structured_operators_and_fields() {
        let p = parser();
        let node = p.parse(
            "#AND( #near/2(Air Pollution.title) #Window/8(city.url, smog) obama.inlink )",
            &RankingModel::RankedBoolean,
        ).unwrap().unwrap();
        assert_eq!(
            node.to_string(),
            "#AND( #NEAR/2( air.body pollut.title ) #WINDOW/8( citi.url smog.body ) obama.inlink )"
        );
    }

    #[test]
    fn test_weighted_operator() {
        let p = parser();
        let node = p.parse("#WAND( 0.7 #AND(apple pie) 0.3 tarts.title )", &bm25()).unwrap().unwrap();
        match node {
            QueryNode::WAnd(args) => {
                assert_eq!(args.len(), 2);
                assert_eq!(args[0].weight, 0.7);
                assert_eq!(args[1].node, QueryNode::term("tart", "title"));
            }
            other => panic!("unexpected node {}", other),
        }
    }

    #[test]
    fn test_stopwords_are_dropped() {
        let p = parser();
        let node = p.parse("#OR(the #AND(of and) river)", &RankingModel::UnrankedBoolean).unwrap().unwrap();
        assert_eq!(node.to_string(), "#OR( river.body )");
        assert!(p.parse("the of", &bm25()).unwrap().is_none());
    }

    #[test]
    fn test_malformed_queries() {
        let p = parser();
        for query in ["#AND(a b", "#AND(a b))", "#AND()", "#WSUM(apple 0.5 pie)", "#NEAR/0(a b)", "#SCORE(apple pie)"] {
            let err = p.parse(query, &bm25()).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Parse, "query {}", query);
        }
    }
}
