use log::debug;
use ndarray::{Array1, Array2};
use serde::Deserialize;

use super::capabilities::{Classify, FeatureRow};
use super::error::ScoringError;
use super::utils::argmax;

fn default_kind() -> String {
    "LinearClassifier".to_string()
}

/// On-disk shape of a fitted linear classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierArtifact {
    #[serde(default = "default_kind")]
    pub kind: String,
    pub coef: Vec<Vec<f32>>,
    pub intercept: Vec<f32>,
    pub classes: Vec<usize>,
}

/// A frozen linear decision function `X · coefᵀ + intercept`.
///
/// With a single coefficient row the model is binary: a strictly positive
/// score selects `classes[1]`, anything else `classes[0]`. With one row per
/// class the highest score wins, ties going to the earlier class.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    kind: String,
    coef: Array2<f32>,
    intercept: Array1<f32>,
    classes: Vec<usize>,
}

impl LinearClassifier {
    pub fn from_artifact(artifact: ClassifierArtifact) -> Result<Self, ScoringError> {
        let invalid = |msg: String| ScoringError::ArtifactLoadError(msg);

        let n_rows = artifact.coef.len();
        let n_classes = artifact.classes.len();
        if n_rows == 0 {
            return Err(invalid("Coefficient matrix is empty".into()));
        }
        if n_classes < 2 {
            return Err(invalid(format!(
                "Classifier must know at least 2 classes, found {}",
                n_classes
            )));
        }
        if n_rows == 1 && n_classes != 2 {
            return Err(invalid(format!(
                "Binary coefficient matrix requires exactly 2 classes, found {}",
                n_classes
            )));
        }
        if n_rows > 1 && n_rows != n_classes {
            return Err(invalid(format!(
                "Coefficient row count mismatch: {} rows for {} classes",
                n_rows, n_classes
            )));
        }
        if artifact.intercept.len() != n_rows {
            return Err(invalid(format!(
                "Intercept length mismatch: expected {}, got {}",
                n_rows,
                artifact.intercept.len()
            )));
        }

        let n_features = artifact.coef[0].len();
        if n_features == 0 {
            return Err(invalid("Coefficient rows are empty".into()));
        }
        if let Some(pos) = artifact.coef.iter().position(|row| row.len() != n_features) {
            return Err(invalid(format!(
                "Coefficient row {} has {} features, expected {}",
                pos,
                artifact.coef[pos].len(),
                n_features
            )));
        }

        let flat: Vec<f32> = artifact.coef.into_iter().flatten().collect();
        if flat.iter().chain(artifact.intercept.iter()).any(|w| !w.is_finite()) {
            return Err(invalid("Classifier weights must be finite".into()));
        }
        let coef = Array2::from_shape_vec((n_rows, n_features), flat)
            .map_err(|e| invalid(format!("Failed to shape coefficient matrix: {}", e)))?;

        Ok(Self {
            kind: artifact.kind,
            coef,
            intercept: Array1::from(artifact.intercept),
            classes: artifact.classes,
        })
    }

    /// Parses and validates a classifier from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self, ScoringError> {
        let artifact: ClassifierArtifact = serde_json::from_str(json)
            .map_err(|e| ScoringError::ArtifactLoadError(format!("Invalid classifier JSON: {}", e)))?;
        Self::from_artifact(artifact)
    }

    pub fn is_binary(&self) -> bool {
        self.coef.nrows() == 1
    }

    fn check_row(&self, row: &FeatureRow) -> Result<(), ScoringError> {
        match row.indices.iter().find(|&&i| i >= self.coef.ncols()) {
            Some(index) => Err(ScoringError::PredictionError(format!(
                "Feature index {} is outside the model's {} features",
                index,
                self.coef.ncols()
            ))),
            None => Ok(()),
        }
    }

    /// Raw decision scores, shape `(rows, 1)` for binary models and
    /// `(rows, classes)` otherwise.
    pub fn decision_function(&self, rows: &[FeatureRow]) -> Result<Array2<f32>, ScoringError> {
        let mut scores = Array2::zeros((rows.len(), self.coef.nrows()));
        for (mut out, row) in scores.outer_iter_mut().zip(rows) {
            self.check_row(row)?;
            out.assign(&self.intercept);
            for (index, value) in row.iter() {
                out.scaled_add(value, &self.coef.column(index));
            }
        }
        Ok(scores)
    }
}

impl Classify for LinearClassifier {
    fn n_features(&self) -> usize {
        self.coef.ncols()
    }

    fn class_indices(&self) -> &[usize] {
        &self.classes
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn classify(&self, rows: &[FeatureRow]) -> Result<Vec<usize>, ScoringError> {
        let scores = self.decision_function(rows)?;
        let predictions = scores
            .outer_iter()
            .map(|row| {
                if self.is_binary() {
                    if row[0] > 0.0 {
                        self.classes[1]
                    } else {
                        self.classes[0]
                    }
                } else {
                    // rows are never empty, so argmax always finds a position
                    self.classes[argmax(row.iter().copied()).unwrap_or(0)]
                }
            })
            .collect::<Vec<_>>();
        debug!("Classified {} rows with {}", predictions.len(), self.kind);
        Ok(predictions)
    }
}
