use super::error::ScoringError;

/// A sparse feature row: `(index, weight)` pairs in ascending index order.
///
/// Features that are absent carry zero weight. A blank text produces an
/// empty row, which every classifier still maps to a class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    pub indices: Vec<usize>,
    pub values: Vec<f32>,
}

impl FeatureRow {
    pub fn new(indices: Vec<usize>, values: Vec<f32>) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        Self { indices, values }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Weight of a single feature, zero when absent.
    pub fn get(&self, index: usize) -> f32 {
        self.indices
            .binary_search(&index)
            .map(|pos| self.values[pos])
            .unwrap_or(0.0)
    }
}

/// Turns raw texts into feature rows using a frozen vocabulary.
pub trait Vectorize {
    /// Number of columns in the produced feature space
    fn n_features(&self) -> usize;

    /// Vectorizes every text, one row per input, same order.
    fn vectorize(&self, texts: &[&str]) -> Result<Vec<FeatureRow>, ScoringError>;
}

/// Maps feature rows to encoded class indices.
pub trait Classify {
    /// Number of features the decision function expects
    fn n_features(&self) -> usize;

    /// Encoded class indices the classifier can emit
    fn class_indices(&self) -> &[usize];

    /// Short human-readable model kind, used in diagnostics
    fn kind(&self) -> &str {
        "custom"
    }

    /// Predicts one class index per row, same order.
    fn classify(&self, rows: &[FeatureRow]) -> Result<Vec<usize>, ScoringError>;
}

/// Maps encoded class indices back to their label strings.
pub trait DecodeLabel {
    /// The full label table, indexed by encoded value
    fn labels(&self) -> &[String];

    /// Decodes one label per index, same order.
    fn decode(&self, indices: &[usize]) -> Result<Vec<String>, ScoringError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_row_lookup() {
        let row = FeatureRow::new(vec![1, 4, 7], vec![0.5, 0.25, 0.125]);
        assert_eq!(row.get(4), 0.25);
        assert_eq!(row.get(5), 0.0);
        assert!(!row.is_empty());
        assert!(FeatureRow::default().is_empty());
    }
}
