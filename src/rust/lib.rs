//! Sentiment scoring for app-store style reviews using pre-trained TF-IDF and
//! linear classifier artifacts.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use reviewsent::{
//!     LabelEncoder, LinearClassifier, ScoringArtifacts, ScoringPipeline, TfidfVectorizer,
//! };
//!
//! let vectorizer = TfidfVectorizer::from_json_str(
//!     r#"{"vocabulary": {"love": 0, "useless": 1}, "idf": [1.0, 1.0]}"#,
//! )?;
//! let classifier = LinearClassifier::from_json_str(
//!     r#"{"coef": [[1.0, -1.0]], "intercept": [0.0], "classes": [0, 1]}"#,
//! )?;
//! let encoder = LabelEncoder::new(vec!["negative", "positive"])?;
//!
//! let pipeline =
//!     ScoringPipeline::from_artifacts(ScoringArtifacts::new(vectorizer, classifier, encoder))?;
//! assert_eq!(pipeline.score_one("I love it")?, "positive");
//! # Ok(())
//! # }
//! ```
//!
//! Artifacts are usually loaded from a directory instead:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use reviewsent::ScoringPipeline;
//!
//! let pipeline = ScoringPipeline::builder()
//!     .with_artifact_dir("artifacts")?
//!     .build()?;
//! let labels = pipeline.score(&["great app", "crashes every time"])?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The pipeline holds its artifacts behind an `Arc` and never mutates them, so
//! clones can be moved to other threads freely.

pub mod artifact_store;
pub mod batch;
pub mod config;
pub mod pipeline;
pub mod review;
pub mod timestamp;

pub use artifact_store::{ArtifactError, ArtifactKind, ArtifactPaths, ArtifactStore};
pub use batch::{score_csv_file, score_table, BatchSummary, DateWindow, ReviewTable, ScoredBatch};
pub use config::ScoringConfig;
pub use pipeline::{
    Classify, DecodeLabel, FeatureRow, LabelEncoder, LinearClassifier, PipelineInfo,
    ScoringArtifacts, ScoringError, ScoringPipeline, ScoringPipelineBuilder, TfidfVectorizer,
    Vectorize,
};
pub use review::{score_review, write_results, PredictionResult, Review};

pub fn init_logger() {
    env_logger::init();
}
