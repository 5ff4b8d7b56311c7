use std::path::{Path, PathBuf};

use log::{error, info};

use super::error::ScoringError;
use super::scoring::{ScoringArtifacts, ScoringPipeline};
use crate::artifact_store::{ArtifactPaths, ArtifactStore};
use crate::config::ScoringConfig;

/// A builder for loading a [`ScoringPipeline`] with a fluent interface.
///
/// Artifacts come from, in order of preference: explicitly set file paths,
/// an explicitly set directory, or the directory resolved by the
/// [`ScoringConfig`].
#[derive(Default, Debug)]
pub struct ScoringPipelineBuilder {
    artifact_dir: Option<PathBuf>,
    paths: Option<ArtifactPaths>,
    config: ScoringConfig,
}

impl ScoringPipelineBuilder {
    /// Creates a new builder with default configuration
    ///
    /// # Example
    /// ```
    /// use reviewsent::ScoringPipelineBuilder;
    ///
    /// let builder = ScoringPipelineBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            artifact_dir: None,
            paths: None,
            config: ScoringConfig::default(),
        }
    }

    /// Sets the configuration used to resolve and verify the artifacts
    ///
    /// # Example
    /// ```
    /// use reviewsent::{ScoringConfig, ScoringPipelineBuilder};
    ///
    /// let builder = ScoringPipelineBuilder::new()
    ///     .with_config(ScoringConfig::default().with_verify_checksums(false));
    /// ```
    pub fn with_config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads the three artifacts from their conventional names inside `dir`
    ///
    /// # Returns
    /// * `Result<Self, ScoringError>` - The builder instance if successful, or an error if:
    ///   - The path is empty
    ///   - Artifact locations are already set
    ///   - The directory does not exist
    pub fn with_artifact_dir(mut self, dir: impl AsRef<Path>) -> Result<Self, ScoringError> {
        let dir = dir.as_ref();
        if dir.as_os_str().is_empty() {
            return Err(ScoringError::ArtifactLoadError(
                "Artifact directory cannot be empty".to_string(),
            ));
        }
        if self.artifact_dir.is_some() || self.paths.is_some() {
            return Err(ScoringError::ArtifactLoadError(
                "Artifact locations already set".to_string(),
            ));
        }
        if !dir.is_dir() {
            return Err(ScoringError::ArtifactLoadError(format!(
                "Artifact directory not found: {}",
                dir.display()
            )));
        }
        self.artifact_dir = Some(dir.to_path_buf());
        Ok(self)
    }

    /// Sets explicit locations for each artifact file
    ///
    /// # Returns
    /// * `Result<Self, ScoringError>` - The builder instance if successful, or an error if:
    ///   - Any path is empty
    ///   - Artifact locations are already set
    ///   - Any file does not exist
    ///
    /// # Example
    /// ```
    /// use reviewsent::ScoringPipelineBuilder;
    ///
    /// let builder = ScoringPipelineBuilder::new().with_custom_artifacts(
    ///     "path/to/classifier.json",
    ///     "path/to/vectorizer.json",
    ///     "path/to/label_encoder.json",
    /// );
    /// assert!(builder.is_err()); // the files do not exist
    /// ```
    pub fn with_custom_artifacts(
        mut self,
        classifier_path: impl AsRef<Path>,
        vectorizer_path: impl AsRef<Path>,
        label_encoder_path: impl AsRef<Path>,
    ) -> Result<Self, ScoringError> {
        let paths = ArtifactPaths {
            classifier: classifier_path.as_ref().to_path_buf(),
            vectorizer: vectorizer_path.as_ref().to_path_buf(),
            label_encoder: label_encoder_path.as_ref().to_path_buf(),
        };

        for path in [&paths.classifier, &paths.vectorizer, &paths.label_encoder] {
            if path.as_os_str().is_empty() {
                return Err(ScoringError::ArtifactLoadError(
                    "Artifact paths cannot be empty".to_string(),
                ));
            }
        }
        if self.artifact_dir.is_some() || self.paths.is_some() {
            return Err(ScoringError::ArtifactLoadError(
                "Artifact locations already set".to_string(),
            ));
        }
        for path in [&paths.classifier, &paths.vectorizer, &paths.label_encoder] {
            if !path.exists() {
                return Err(ScoringError::ArtifactLoadError(format!(
                    "Artifact file not found: {}",
                    path.display()
                )));
            }
        }

        self.paths = Some(paths);
        Ok(self)
    }

    fn store(&self) -> ArtifactStore {
        if let Some(paths) = &self.paths {
            return ArtifactStore::from_paths(paths.clone());
        }
        let dir = self
            .artifact_dir
            .clone()
            .unwrap_or_else(|| self.config.resolve_artifact_dir());
        ArtifactStore::new(dir)
    }

    /// Loads the artifacts and returns the final pipeline
    ///
    /// # Returns
    /// * `Result<ScoringPipeline, ScoringError>` - The pipeline if successful, or an
    ///   `ArtifactLoadError` if any artifact is missing, corrupt or inconsistent
    pub fn build(self) -> Result<ScoringPipeline, ScoringError> {
        let store = self.store();
        let artifacts: ScoringArtifacts =
            store.load(self.config.verify_checksums).map_err(|e| {
                error!("Failed to load artifacts: {}", e);
                ScoringError::from(e)
            })?;

        let pipeline =
            ScoringPipeline::from_artifacts(artifacts)?.with_paths(store.paths().clone());
        info!(
            "Scoring pipeline ready with labels {:?}",
            pipeline.labels()
        );
        Ok(pipeline)
    }
}
