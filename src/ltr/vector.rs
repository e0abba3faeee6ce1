use std::collections::BTreeMap;
use std::fmt;
use crate::ltr::features::{Feature, FeatureMask, FEATURE_COUNT};

/// Feature rows for one query: a column per feature, plus the label and
/// external id of each document added.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    query_id: String,
    mask: FeatureMask,
    term_table: BTreeMap<String, usize>,  // query stem -> occurrences in the query
    query_length: usize,
    columns: Vec<Vec<f64>>,
    labels: Vec<i32>,
    external_ids: Vec<String>,
}

impl FeatureVector {
    pub fn new(query_id: impl Into<String>, query_terms: &[String], mask: FeatureMask) -> Self {
        let mut term_table = BTreeMap::new();
        for term in query_terms {
            *term_table.entry(term.clone()).or_insert(0) += 1;
        }

        FeatureVector {
            query_id: query_id.into(),
            mask,
            term_table,
            query_length: query_terms.len(),
            columns: vec![Vec::new(); FEATURE_COUNT],
            labels: Vec::new(),
            external_ids: Vec::new(),
        }
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn mask(&self) -> &FeatureMask {
        &self.mask
    }

    pub fn term_table(&self) -> &BTreeMap<String, usize> {
        &self.term_table
    }

    pub fn query_length(&self) -> usize {
        self.query_length
    }

    /// Number of documents added.
    pub fn len(&self) -> usize {
        self.external_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.external_ids.is_empty()
    }

    pub fn external_ids(&self) -> &[String] {
        &self.external_ids
    }

    pub fn add_document(&mut self, external_id: impl Into<String>, label: i32, values: [f64; FEATURE_COUNT]) {
        for (column, value) in self.columns.iter_mut().zip(values) {
            column.push(value);
        }
        self.labels.push(label);
        self.external_ids.push(external_id.into());
    }

    pub fn value(&self, row: usize, feature: Feature) -> f64 {
        self.columns[feature.index()][row]
    }

    /// Min-max scale every enabled column to [0, 1]; NaN becomes 0.
    /// A column already spanning exactly [0, 1] only has its NaNs replaced;
    /// a constant column collapses to 0. Applying it twice changes nothing.
    pub fn normalize(&mut self) {
        for feature in Feature::ALL {
            if self.mask.is_enabled(feature) {
                normalize_column(&mut self.columns[feature.index()]);
            }
        }
    }
}

fn normalize_column(column: &mut [f64]) {
    let mut bounds: Option<(f64, f64)> = None;
    for &v in column.iter().filter(|v| !v.is_nan()) {
        bounds = Some(match bounds {
            Some((min, max)) => (min.min(v), max.max(v)),
            None => (v, v),
        });
    }

    let Some((min, max)) = bounds else {
        column.fill(0.0);
        return;
    };

    if min == 0.0 && (max == 0.0 || max == 1.0) {
        for v in column.iter_mut().filter(|v| v.is_nan()) {
            *v = 0.0;
        }
    } else if max == min {
        column.fill(0.0);
    } else {
        for v in column.iter_mut() {
            *v = if v.is_nan() { 0.0 } else { (*v - min) / (max - min) };
        }
    }
}

/// SVM-rank lines: `<label> qid:<id> <n>:<value> ... # <external id>`,
/// listing enabled features only.
impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (row, external_id) in self.external_ids.iter().enumerate() {
            write!(f, "{} qid:{} ", self.labels[row], self.query_id)?;
            for feature in self.mask.enabled() {
                write!(f, "{}:{} ", feature.number(), self.value(row, feature))?;
            }
            writeln!(f, "# {}", external_id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fill: f64) -> [f64; FEATURE_COUNT] {
        [fill; FEATURE_COUNT]
    }

    fn vector(mask: FeatureMask) -> FeatureVector {
        let terms = vec!["air".to_string(), "pollut".to_string(), "air".to_string()];
        FeatureVector::new("7", &terms, mask)
    }

    #[test]
    fn test_term_table_counts_duplicates() {
        let fv = vector(FeatureMask::all_enabled());
        assert_eq!(fv.term_table().get("air"), Some(&2));
        assert_eq!(fv.query_length(), 3);
    }

    #[test]
    fn test_normalize_min_max() {
        let mut fv = vector(FeatureMask::all_enabled());
        let mut a = row(2.0);
        a[Feature::BodyBm25.index()] = 4.0;
        let mut b = row(f64::NAN);
        b[Feature::BodyBm25.index()] = 1.0;
        let mut c = row(2.0);
        c[Feature::BodyBm25.index()] = 2.5;
        fv.add_document("a", 2, a);
        fv.add_document("b", 1, b);
        fv.add_document("c", 0, c);
        fv.normalize();

        assert_eq!(fv.value(0, Feature::BodyBm25), 1.0);
        assert_eq!(fv.value(1, Feature::BodyBm25), 0.0);
        assert_eq!(fv.value(2, Feature::BodyBm25), 0.5);
        // Constant column with a NaN collapses to 0
        assert!((0..3).all(|r| fv.value(r, Feature::SpamScore) == 0.0));
    }

    #[test]
    fn test_normalize_keeps_unit_range_and_is_idempotent() {
        let mut fv = vector(FeatureMask::all_enabled());
        let mut a = row(0.0);
        a[Feature::UrlDepth.index()] = 0.25;
        let mut b = row(1.0);
        b[Feature::UrlDepth.index()] = f64::NAN;
        let mut c = row(0.0);
        c[Feature::UrlDepth.index()] = 1.0;
        let mut d = row(1.0);
        d[Feature::UrlDepth.index()] = 0.0;
        fv.add_document("a", 1, a);
        fv.add_document("b", 0, b);
        fv.add_document("c", 0, c);
        fv.add_document("d", 0, d);

        fv.normalize();
        assert_eq!(fv.value(0, Feature::UrlDepth), 0.25);
        assert_eq!(fv.value(1, Feature::UrlDepth), 0.0);
        assert_eq!(fv.value(2, Feature::UrlDepth), 1.0);
        assert_eq!(fv.value(1, Feature::SpamScore), 1.0);

        let first = fv.to_string();
        fv.normalize();
        assert_eq!(fv.to_string(), first);
    }

    #[test]
    fn test_display_lists_enabled_features_only() {
        let mut mask = FeatureMask::all_enabled();
        for feature in Feature::ALL.iter().skip(2) {
            mask.disable(*feature);
        }
        let mut fv = vector(mask);
        let mut values = row(0.0);
        values[Feature::UrlDepth.index()] = 3.0;
        fv.add_document("clueweb09-en0000-00-00000", 2, values);

        assert_eq!(fv.to_string(), "2 qid:7 1:0 2:3 # clueweb09-en0000-00-00000\n");
    }
}
