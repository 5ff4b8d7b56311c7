use std::sync::Arc;

use log::debug;

use super::capabilities::{Classify, DecodeLabel, Vectorize};
use super::error::ScoringError;
use super::label_encoder::LabelEncoder;
use super::linear::LinearClassifier;
use super::vectorizer::TfidfVectorizer;
use super::PipelineInfo;
use crate::artifact_store::ArtifactPaths;

/// The three frozen artifacts a pipeline scores with.
///
/// Constructed once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ScoringArtifacts<V = TfidfVectorizer, C = LinearClassifier, D = LabelEncoder> {
    pub vectorizer: V,
    pub classifier: C,
    pub label_encoder: D,
}

impl<V: Vectorize, C: Classify, D: DecodeLabel> ScoringArtifacts<V, C, D> {
    pub fn new(vectorizer: V, classifier: C, label_encoder: D) -> Self {
        Self {
            vectorizer,
            classifier,
            label_encoder,
        }
    }

    /// Checks that the three artifacts were fitted together.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let vectorizer_features = self.vectorizer.n_features();
        let classifier_features = self.classifier.n_features();
        if vectorizer_features != classifier_features {
            return Err(ScoringError::ArtifactLoadError(format!(
                "Feature count mismatch: vectorizer produces {}, classifier expects {}",
                vectorizer_features, classifier_features
            )));
        }

        let labels = self.label_encoder.labels().len();
        if let Some(index) = self
            .classifier
            .class_indices()
            .iter()
            .find(|&&i| i >= labels)
        {
            return Err(ScoringError::ArtifactLoadError(format!(
                "Classifier class {} has no label in the encoder ({} labels)",
                index, labels
            )));
        }
        Ok(())
    }
}

/// Scores review texts with a frozen vectorizer, classifier and label encoder.
///
/// Scoring is a pure function of the artifacts and the input: the same text
/// always yields the same label, and batch results line up with their inputs.
///
/// # Thread Safety
///
/// Artifacts live behind an `Arc` and are never written after construction,
/// so a pipeline can be cloned cheaply and shared across threads.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use reviewsent::{LabelEncoder, LinearClassifier, ScoringArtifacts, ScoringPipeline, TfidfVectorizer};
///
/// let vectorizer = TfidfVectorizer::from_json_str(
///     r#"{ "vocabulary": {"great": 0, "useless": 1}, "idf": [1.0, 1.0] }"#,
/// )?;
/// let classifier = LinearClassifier::from_json_str(
///     r#"{ "coef": [[2.0, -2.0]], "intercept": [0.0], "classes": [0, 1] }"#,
/// )?;
/// let label_encoder = LabelEncoder::new(vec!["negative", "positive"])?;
///
/// let pipeline = ScoringPipeline::from_artifacts(ScoringArtifacts::new(
///     vectorizer,
///     classifier,
///     label_encoder,
/// ))?;
///
/// assert_eq!(pipeline.score_one("great app")?, "positive");
/// assert_eq!(pipeline.score(&["useless", "great"])?, vec!["negative", "positive"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ScoringPipeline<V = TfidfVectorizer, C = LinearClassifier, D = LabelEncoder> {
    artifacts: Arc<ScoringArtifacts<V, C, D>>,
    paths: Option<ArtifactPaths>,
}

impl<V, C, D> Clone for ScoringPipeline<V, C, D> {
    fn clone(&self) -> Self {
        Self {
            artifacts: Arc::clone(&self.artifacts),
            paths: self.paths.clone(),
        }
    }
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ScoringPipeline>();
    }
};

impl ScoringPipeline {
    /// Creates a new builder for loading a pipeline from artifact files
    pub fn builder() -> super::builder::ScoringPipelineBuilder {
        super::builder::ScoringPipelineBuilder::new()
    }
}

impl<V: Vectorize, C: Classify, D: DecodeLabel> ScoringPipeline<V, C, D> {
    /// Wraps already constructed artifacts after checking they fit together.
    pub fn from_artifacts(artifacts: ScoringArtifacts<V, C, D>) -> Result<Self, ScoringError> {
        artifacts.validate()?;
        Ok(Self {
            artifacts: Arc::new(artifacts),
            paths: None,
        })
    }

    pub(crate) fn with_paths(mut self, paths: ArtifactPaths) -> Self {
        self.paths = Some(paths);
        self
    }

    pub fn artifacts(&self) -> &ScoringArtifacts<V, C, D> {
        &self.artifacts
    }

    /// The closed set of labels this pipeline can produce
    pub fn labels(&self) -> &[String] {
        self.artifacts.label_encoder.labels()
    }

    /// Returns information about the loaded artifacts
    pub fn info(&self) -> PipelineInfo {
        PipelineInfo {
            paths: self.paths.clone(),
            labels: self.labels().to_vec(),
            n_features: self.artifacts.vectorizer.n_features(),
            classifier_kind: self.artifacts.classifier.kind().to_string(),
        }
    }

    /// Scores a batch of texts, returning one label per text in input order.
    ///
    /// All texts go through the vectorizer and classifier in a single call.
    /// Blank texts are scored like any other; rejecting them is the caller's
    /// decision.
    ///
    /// # Errors
    /// - `ValidationError` if `texts` is empty
    /// - `PredictionError` if an artifact produces an inconsistent result
    pub fn score<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<String>, ScoringError> {
        if texts.is_empty() {
            return Err(ScoringError::ValidationError(
                "At least one text is required for scoring".into(),
            ));
        }

        let texts: Vec<&str> = texts.iter().map(|t| t.as_ref()).collect();
        let rows = self.artifacts.vectorizer.vectorize(&texts)?;
        let indices = self.artifacts.classifier.classify(&rows)?;
        let labels = self.artifacts.label_encoder.decode(&indices)?;

        if labels.len() != texts.len() {
            return Err(ScoringError::PredictionError(format!(
                "Expected {} labels, got {}",
                texts.len(),
                labels.len()
            )));
        }

        debug!("Scored {} texts", labels.len());
        Ok(labels)
    }

    /// Scores a single text.
    pub fn score_one(&self, text: &str) -> Result<String, ScoringError> {
        self.score(&[text])?
            .pop()
            .ok_or_else(|| ScoringError::PredictionError("No label returned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::capabilities::FeatureRow;

    /// Vectorizes by text length so tests can steer the classifier directly.
    struct LengthVectorizer;

    impl Vectorize for LengthVectorizer {
        fn n_features(&self) -> usize {
            1
        }

        fn vectorize(&self, texts: &[&str]) -> Result<Vec<FeatureRow>, ScoringError> {
            Ok(texts
                .iter()
                .map(|t| FeatureRow::new(vec![0], vec![t.trim().len() as f32]))
                .collect())
        }
    }

    struct ThresholdClassifier {
        classes: Vec<usize>,
    }

    impl Classify for ThresholdClassifier {
        fn n_features(&self) -> usize {
            1
        }

        fn class_indices(&self) -> &[usize] {
            &self.classes
        }

        fn classify(&self, rows: &[FeatureRow]) -> Result<Vec<usize>, ScoringError> {
            Ok(rows
                .iter()
                .map(|r| if r.get(0) > 5.0 { self.classes[1] } else { self.classes[0] })
                .collect())
        }
    }

    fn mock_pipeline() -> ScoringPipeline<LengthVectorizer, ThresholdClassifier, LabelEncoder> {
        ScoringPipeline::from_artifacts(ScoringArtifacts::new(
            LengthVectorizer,
            ThresholdClassifier { classes: vec![0, 1] },
            LabelEncoder::new(vec!["short", "long"]).unwrap(),
        ))
        .unwrap()
    }

    #[test]
    fn test_score_with_mock_artifacts() {
        let pipeline = mock_pipeline();
        let labels = pipeline.score(&["tiny", "considerably longer", ""]).unwrap();
        assert_eq!(labels, vec!["short", "long", "short"]);
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let pipeline = mock_pipeline();
        let empty: [&str; 0] = [];
        assert!(matches!(
            pipeline.score(&empty),
            Err(ScoringError::ValidationError(_))
        ));
    }

    #[test]
    fn test_mismatched_artifacts_fail_validation() {
        let result = ScoringPipeline::from_artifacts(ScoringArtifacts::new(
            LengthVectorizer,
            ThresholdClassifier { classes: vec![0, 3] },
            LabelEncoder::new(vec!["short", "long"]).unwrap(),
        ));
        assert!(matches!(result, Err(ScoringError::ArtifactLoadError(_))));
    }

    #[test]
    fn test_info_reports_custom_kind() {
        let info = mock_pipeline().info();
        assert_eq!(info.labels, vec!["short", "long"]);
        assert_eq!(info.n_features, 1);
        assert_eq!(info.classifier_kind, "custom");
        assert!(info.paths.is_none());
    }
}
