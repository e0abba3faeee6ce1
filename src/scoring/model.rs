use crate::core::error::{Error, Result};

/// BM25 parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    k1: f64,  // Term frequency saturation
    b: f64,   // Length normalization strength, in [0, 1]
    k3: f64,  // Query term frequency saturation
}

impl Bm25Params {
    pub fn new(k1: f64, b: f64, k3: f64) -> Result<Self> {
        if !(k1 >= 0.0) {
            return Err(Error::invalid_argument(format!("BM25 k1 must be >= 0, got {}", k1)));
        }
        if !(0.0..=1.0).contains(&b) {
            return Err(Error::invalid_argument(format!("BM25 b must be in [0, 1], got {}", b)));
        }
        if !(k3 >= 0.0) {
            return Err(Error::invalid_argument(format!("BM25 k3 must be >= 0, got {}", k3)));
        }
        Ok(Bm25Params { k1, b, k3 })
    }

    pub fn k1(&self) -> f64 {
        self.k1
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    pub fn k3(&self) -> f64 {
        self.k3
    }
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params { k1: 1.2, b: 0.75, k3: 0.0 }
    }
}

/// Indri (Dirichlet + Jelinek-Mercer smoothed query likelihood) parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndriParams {
    mu: f64,
    lambda: f64,
}

impl IndriParams {
    pub fn new(mu: f64, lambda: f64) -> Result<Self> {
        if !(mu >= 0.0) {
            return Err(Error::invalid_argument(format!("Indri mu must be >= 0, got {}", mu)));
        }
        if !(0.0..=1.0).contains(&lambda) {
            return Err(Error::invalid_argument(format!("Indri lambda must be in [0, 1], got {}", lambda)));
        }
        Ok(IndriParams { mu, lambda })
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

impl Default for IndriParams {
    fn default() -> Self {
        IndriParams { mu: 2500.0, lambda: 0.4 }
    }
}

/// Ranking semantics an operator tree is evaluated under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RankingModel {
    UnrankedBoolean,
    RankedBoolean,
    Bm25(Bm25Params),
    Indri(IndriParams),
}

impl RankingModel {
    pub fn name(&self) -> &'static str {
        match self {
            RankingModel::UnrankedBoolean => "unranked_boolean",
            RankingModel::RankedBoolean => "ranked_boolean",
            RankingModel::Bm25(_) => "bm25",
            RankingModel::Indri(_) => "indri",
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, RankingModel::UnrankedBoolean | RankingModel::RankedBoolean)
    }
}
