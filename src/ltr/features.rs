use crate::core::error::{Error, Result};

pub const FEATURE_COUNT: usize = 18;

/// Learning-to-rank features, in output column order (1-indexed on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    SpamScore,
    UrlDepth,
    FromWikipedia,
    PageRank,
    BodyBm25,
    BodyIndri,
    BodyOverlap,
    TitleBm25,
    TitleIndri,
    TitleOverlap,
    UrlBm25,
    UrlIndri,
    UrlOverlap,
    InlinkBm25,
    InlinkIndri,
    InlinkOverlap,
    DomainPrior,
    ContainsQueryTerm,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::SpamScore,
        Feature::UrlDepth,
        Feature::FromWikipedia,
        Feature::PageRank,
        Feature::BodyBm25,
        Feature::BodyIndri,
        Feature::BodyOverlap,
        Feature::TitleBm25,
        Feature::TitleIndri,
        Feature::TitleOverlap,
        Feature::UrlBm25,
        Feature::UrlIndri,
        Feature::UrlOverlap,
        Feature::InlinkBm25,
        Feature::InlinkIndri,
        Feature::InlinkOverlap,
        Feature::DomainPrior,
        Feature::ContainsQueryTerm,
    ];

    /// Zero-based column index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// One-based feature number used in feature files and disable lists.
    pub fn number(self) -> usize {
        self.index() + 1
    }
}

/// The three per-field features computed from one term vector.
#[derive(Debug, Clone, Copy)]
pub struct FieldFeatures {
    pub field: &'static str,
    pub bm25: Feature,
    pub indri: Feature,
    pub overlap: Feature,
}

pub const FIELD_FEATURES: [FieldFeatures; 4] = [
    FieldFeatures { field: "body", bm25: Feature::BodyBm25, indri: Feature::BodyIndri, overlap: Feature::BodyOverlap },
    FieldFeatures { field: "title", bm25: Feature::TitleBm25, indri: Feature::TitleIndri, overlap: Feature::TitleOverlap },
    FieldFeatures { field: "url", bm25: Feature::UrlBm25, indri: Feature::UrlIndri, overlap: Feature::UrlOverlap },
    FieldFeatures { field: "inlink", bm25: Feature::InlinkBm25, indri: Feature::InlinkIndri, overlap: Feature::InlinkOverlap },
];

/// Set of disabled features, parsed from a comma separated 1-indexed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureMask {
    disabled: [bool; FEATURE_COUNT],
}

impl FeatureMask {
    pub fn all_enabled() -> Self {
        FeatureMask::default()
    }

    pub fn parse(list: &str) -> Result<Self> {
        let mut mask = FeatureMask::default();
        for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let number: usize = item.parse()
                .map_err(|_| Error::invalid_argument(format!("feature '{}' is not a number", item)))?;
            if !(1..=FEATURE_COUNT).contains(&number) {
                return Err(Error::invalid_argument(format!(
                    "feature {} out of range 1..={}", number, FEATURE_COUNT
                )));
            }
            mask.disabled[number - 1] = true;
        }
        Ok(mask)
    }

    pub fn disable(&mut self, feature: Feature) {
        self.disabled[feature.index()] = true;
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        !self.disabled[feature.index()]
    }

    pub fn enabled(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(|f| self.is_enabled(*f))
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }
}
