use std::fmt;

/// Query operator tree. Parents own their children by value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    Term { term: String, field: String },
    Syn(Vec<QueryNode>),
    Near { distance: u32, args: Vec<QueryNode> },    // Ordered, consecutive gaps in (0, distance]
    Window { distance: u32, args: Vec<QueryNode> },  // Unordered, span < distance
    Score(Box<QueryNode>),
    And(Vec<QueryNode>),
    Or(Vec<QueryNode>),
    Sum(Vec<QueryNode>),
    WSum(Vec<WeightedNode>),
    WAnd(Vec<WeightedNode>),
}

/// Child of a weighted operator; weights are normalized at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedNode {
    pub weight: f64,
    pub node: QueryNode,
}

impl WeightedNode {
    pub fn new(weight: f64, node: QueryNode) -> Self {
        WeightedNode { weight, node }
    }
}

impl QueryNode {
    pub fn term(term: impl Into<String>, field: impl Into<String>) -> Self {
        QueryNode::Term {
            term: term.into(),
            field: field.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QueryNode::Term { .. } => "#TERM",
            QueryNode::Syn(_) => "#SYN",
            QueryNode::Near { .. } => "#NEAR",
            QueryNode::Window { .. } => "#WINDOW",
            QueryNode::Score(_) => "#SCORE",
            QueryNode::And(_) => "#AND",
            QueryNode::Or(_) => "#OR",
            QueryNode::Sum(_) => "#SUM",
            QueryNode::WSum(_) => "#WSUM",
            QueryNode::WAnd(_) => "#WAND",
        }
    }

    /// Number of leaf terms below (and including) this node.
    pub fn term_count(&self) -> usize {
        match self {
            QueryNode::Term { .. } => 1,
            QueryNode::Score(child) => child.term_count(),
            QueryNode::Syn(args)
            | QueryNode::Near { args, .. }
            | QueryNode::Window { args, .. }
            | QueryNode::And(args)
            | QueryNode::Or(args)
            | QueryNode::Sum(args) => args.iter().map(QueryNode::term_count).sum(),
            QueryNode::WSum(args) | QueryNode::WAnd(args) => {
                args.iter().map(|a| a.node.term_count()).sum()
            }
        }
    }
}

fn write_args(f: &mut fmt::Formatter, name: &str, args: &[QueryNode]) -> fmt::Result {
    write!(f, "{}( ", name)?;
    for arg in args {
        write!(f, "{} ", arg)?;
    }
    write!(f, ")")
}

fn write_weighted(f: &mut fmt::Formatter, name: &str, args: &[WeightedNode]) -> fmt::Result {
    write!(f, "{}( ", name)?;
    for arg in args {
        write!(f, "{} {} ", arg.weight, arg.node)?;
    }
    write!(f, ")")
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueryNode::Term { term, field } => write!(f, "{}.{}", term, field),
            QueryNode::Near { distance, args } => write_args(f, &format!("#NEAR/{}", distance), args),
            QueryNode::Window { distance, args } => write_args(f, &format!("#WINDOW/{}", distance), args),
            QueryNode::Score(child) => write!(f, "#SCORE( {} )", child),
            QueryNode::Syn(args)
            | QueryNode::And(args)
            | QueryNode::Or(args)
            | QueryNode::Sum(args) => write_args(f, self.name(), args),
            QueryNode::WSum(args) | QueryNode::WAnd(args) => write_weighted(f, self.name(), args),
        }
    }
}
