use std::collections::HashMap;

use serde::Deserialize;

use super::capabilities::DecodeLabel;
use super::error::ScoringError;

/// On-disk shape of a fitted label encoder.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelEncoderArtifact {
    pub classes: Vec<String>,
}

/// A frozen index-to-label lookup table.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    pub fn from_artifact(artifact: LabelEncoderArtifact) -> Result<Self, ScoringError> {
        Self::new(artifact.classes)
    }

    /// Creates an encoder whose encoded values are the positions in `classes`.
    pub fn new(classes: Vec<impl Into<String>>) -> Result<Self, ScoringError> {
        let classes: Vec<String> = classes.into_iter().map(Into::into).collect();
        if classes.is_empty() {
            return Err(ScoringError::ArtifactLoadError(
                "Label encoder has no classes".into(),
            ));
        }

        let mut index = HashMap::with_capacity(classes.len());
        for (i, label) in classes.iter().enumerate() {
            if label.trim().is_empty() {
                return Err(ScoringError::ArtifactLoadError(format!(
                    "Label {} is empty",
                    i
                )));
            }
            if index.insert(label.clone(), i).is_some() {
                return Err(ScoringError::ArtifactLoadError(format!(
                    "Duplicate label '{}'",
                    label
                )));
            }
        }

        Ok(Self { classes, index })
    }

    /// Parses and validates a label encoder from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self, ScoringError> {
        let artifact: LabelEncoderArtifact = serde_json::from_str(json).map_err(|e| {
            ScoringError::ArtifactLoadError(format!("Invalid label encoder JSON: {}", e))
        })?;
        Self::from_artifact(artifact)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Encodes labels into their indices.
    pub fn transform(&self, labels: &[&str]) -> Result<Vec<usize>, ScoringError> {
        labels
            .iter()
            .map(|label| {
                self.index.get(*label).copied().ok_or_else(|| {
                    ScoringError::ValidationError(format!("Unknown label '{}'", label))
                })
            })
            .collect()
    }

    /// Decodes indices back into their labels.
    pub fn inverse_transform(&self, indices: &[usize]) -> Result<Vec<String>, ScoringError> {
        indices
            .iter()
            .map(|&i| {
                self.classes.get(i).cloned().ok_or_else(|| {
                    ScoringError::PredictionError(format!(
                        "Class index {} has no label (encoder knows {})",
                        i,
                        self.classes.len()
                    ))
                })
            })
            .collect()
    }
}

impl DecodeLabel for LabelEncoder {
    fn labels(&self) -> &[String] {
        &self.classes
    }

    fn decode(&self, indices: &[usize]) -> Result<Vec<String>, ScoringError> {
        self.inverse_transform(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_for_every_label() {
        let encoder = LabelEncoder::new(vec!["negative", "neutral", "positive"]).unwrap();
        for label in encoder.labels().to_vec() {
            let encoded = encoder.transform(&[label.as_str()]).unwrap();
            assert_eq!(encoder.inverse_transform(&encoded).unwrap(), vec![label]);
        }
    }

    #[test]
    fn test_unknown_index_is_rejected() {
        let encoder = LabelEncoder::new(vec!["negative", "positive"]).unwrap();
        assert!(matches!(
            encoder.inverse_transform(&[2]),
            Err(ScoringError::PredictionError(_))
        ));
        assert!(encoder.transform(&["meh"]).is_err());
    }

    #[test]
    fn test_duplicate_and_empty_labels_are_rejected() {
        assert!(LabelEncoder::new(vec!["positive", "positive"]).is_err());
        assert!(LabelEncoder::new(vec!["positive", " "]).is_err());
        assert!(LabelEncoder::new(Vec::<String>::new()).is_err());
    }
}
