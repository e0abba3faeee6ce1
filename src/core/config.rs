use serde::{Serialize, Deserialize};
use crate::core::error::{Error, Result};
use crate::ltr::features::FeatureMask;
use crate::scoring::model::{Bm25Params, IndriParams, RankingModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalAlgorithm {
    UnrankedBoolean,
    RankedBoolean,
    Bm25,
    Indri,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Config {
    pub k1: f64,
    pub b: f64,
    pub k3: f64,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Bm25Config { k1: 1.2, b: 0.75, k3: 0.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndriConfig {
    pub mu: f64,
    pub lambda: f64,
}

impl Default for IndriConfig {
    fn default() -> Self {
        IndriConfig { mu: 2500.0, lambda: 0.4 }
    }
}

/// Pseudo-relevance feedback settings (Indri only)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub enabled: bool,
    pub docs: usize,            // top documents of the initial ranking
    pub terms: usize,           // expansion terms kept
    pub mu: f64,                // smoothing used when scoring candidate terms
    pub original_weight: f64,   // weight of the user query in the final #WAND
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        FeedbackConfig {
            enabled: false,
            docs: 10,
            terms: 10,
            mu: 0.0,
            original_weight: 0.5,
        }
    }
}

impl FeedbackConfig {
    /// Parameter ranges are only enforced when feedback is enabled.
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if !(0.0..=1.0).contains(&self.original_weight) {
            return Err(Error::invalid_argument(format!(
                "feedback original_weight must be in [0, 1], got {}", self.original_weight
            )));
        }
        if !(self.mu >= 0.0) {
            return Err(Error::invalid_argument(format!("feedback mu must be >= 0, got {}", self.mu)));
        }
        if self.docs == 0 {
            return Err(Error::invalid_argument("feedback docs must be positive"));
        }
        if self.terms == 0 {
            return Err(Error::invalid_argument("feedback terms must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LtrConfig {
    pub svm_rank_learn_path: String,
    pub svm_rank_classify_path: String,
    pub svm_rank_c: f64,
    pub feature_disable: String,        // comma separated, 1-indexed
    pub initial_ranking_depth: usize,   // candidates re-ranked at test time
}

impl Default for LtrConfig {
    fn default() -> Self {
        LtrConfig {
            svm_rank_learn_path: "svm_rank_learn".to_string(),
            svm_rank_classify_path: "svm_rank_classify".to_string(),
            svm_rank_c: 0.001,
            feature_disable: String::new(),
            initial_ranking_depth: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub retrieval_algorithm: RetrievalAlgorithm,
    pub bm25: Bm25Config,
    pub indri: IndriConfig,
    pub default_field: String,
    pub top_n: usize,
    pub run_id: String,
    pub feedback: FeedbackConfig,
    pub ltr: LtrConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            retrieval_algorithm: RetrievalAlgorithm::Bm25,
            bm25: Bm25Config::default(),
            indri: IndriConfig::default(),
            default_field: "body".to_string(),
            top_n: 100,
            run_id: "run-1".to_string(),
            feedback: FeedbackConfig::default(),
            ltr: LtrConfig::default(),
        }
    }
}

impl Config {
    /// Load a configuration and reject out-of-range parameters up front.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.ranking_model()?;
        self.bm25_params()?;
        self.indri_params()?;
        self.feedback.validate()?;
        self.feature_mask()?;
        Ok(())
    }

    pub fn bm25_params(&self) -> Result<Bm25Params> {
        Bm25Params::new(self.bm25.k1, self.bm25.b, self.bm25.k3)
    }

    pub fn indri_params(&self) -> Result<IndriParams> {
        IndriParams::new(self.indri.mu, self.indri.lambda)
    }

    pub fn ranking_model(&self) -> Result<RankingModel> {
        Ok(match self.retrieval_algorithm {
            RetrievalAlgorithm::UnrankedBoolean => RankingModel::UnrankedBoolean,
            RetrievalAlgorithm::RankedBoolean => RankingModel::RankedBoolean,
            RetrievalAlgorithm::Bm25 => RankingModel::Bm25(self.bm25_params()?),
            RetrievalAlgorithm::Indri => RankingModel::Indri(self.indri_params()?),
        })
    }

    pub fn feature_mask(&self) -> Result<FeatureMask> {
        FeatureMask::parse(&self.ltr.feature_disable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = Config::from_json_str(r#"{"retrieval_algorithm": "indri"}"#).unwrap();
        assert_eq!(config.top_n, 100);
        assert_eq!(config.default_field, "body");
        match config.ranking_model().unwrap() {
            RankingModel::Indri(p) => {
                assert_eq!(p.mu(), 2500.0);
                assert_eq!(p.lambda(), 0.4);
            }
            other => panic!("unexpected model {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_parameters_rejected_at_load() {
        let err = Config::from_json_str(r#"{"bm25": {"k1": -1.0}}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);

        let err = Config::from_json_str(r#"{"indri": {"lambda": 1.5}}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_out_of_range_feedback_rejected() {
        let cases = [
            r#""original_weight": -0.5"#,
            r#""original_weight": 1.5"#,
            r#""mu": -10.0"#,
            r#""docs": 0"#,
            r#""terms": 0"#,
        ];
        for case in cases {
            let json = format!(
                r#"{{"retrieval_algorithm": "indri", "feedback": {{"enabled": true, {}}}}}"#,
                case
            );
            let err = Config::from_json_str(&json).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidArgument, "{}", json);
        }

        // Unchecked while feedback is off; the bounds themselves are valid
        Config::from_json_str(r#"{"feedback": {"enabled": false, "docs": 0}}"#).unwrap();
        Config::from_json_str(r#"{"feedback": {"enabled": true, "original_weight": 1.0, "mu": 0.0}}"#).unwrap();
    }

    #[test]
    fn test_bad_feature_disable_rejected() {
        let err = Config::from_json_str(r#"{"ltr": {"feature_disable": "3,19"}}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = Config::from_json_str("{not json").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }
}
