mod builder;
mod capabilities;
mod error;
mod label_encoder;
mod linear;
mod scoring;
mod utils;
mod vectorizer;

pub use builder::ScoringPipelineBuilder;
pub use capabilities::{Classify, DecodeLabel, FeatureRow, Vectorize};
pub use error::ScoringError;
pub use label_encoder::{LabelEncoder, LabelEncoderArtifact};
pub use linear::{ClassifierArtifact, LinearClassifier};
pub use scoring::{ScoringArtifacts, ScoringPipeline};
pub use utils::Norm;
pub use vectorizer::{TfidfVectorizer, VectorizerArtifact, DEFAULT_TOKEN_PATTERN};

use crate::artifact_store::ArtifactPaths;

/// Information about the artifacts a pipeline was built from
#[derive(Debug, Clone)]
pub struct PipelineInfo {
    /// Artifact file locations, when loaded from disk
    pub paths: Option<ArtifactPaths>,
    /// Labels the pipeline can produce, in encoder order
    pub labels: Vec<String>,
    /// Number of features in the vectorizer's vocabulary
    pub n_features: usize,
    /// Kind of the classifier model
    pub classifier_kind: String,
}
