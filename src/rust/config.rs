use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::pipeline::ScoringError;

/// Environment variable overriding the default artifact directory
pub const ARTIFACTS_ENV_VAR: &str = "REVIEWSENT_ARTIFACTS";
/// Column appended after `predicted_sentiment` when display labels are configured
pub const DEFAULT_DISPLAY_COLUMN: &str = "sentiment_display";
/// Name recorded for manual reviews submitted without one
pub const DEFAULT_ANONYMOUS_NAME: &str = "(Anonymous)";

/// Settings shared by every scoring interaction of the process.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Directory holding the artifact files. Resolved lazily when unset.
    pub artifact_dir: Option<PathBuf>,
    /// Check artifact files against `manifest.json` when it exists
    pub verify_checksums: bool,
    /// Optional human-language rendering of each label
    pub display_labels: Option<HashMap<String, String>>,
    pub display_column: String,
    pub anonymous_name: String,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            artifact_dir: None,
            verify_checksums: true,
            display_labels: None,
            display_column: DEFAULT_DISPLAY_COLUMN.to_string(),
            anonymous_name: DEFAULT_ANONYMOUS_NAME.to_string(),
        }
    }
}

impl ScoringConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    pub fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    pub fn with_display_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.display_labels = Some(labels);
        self
    }

    /// Loads display labels from a JSON object of `label -> display string`.
    pub fn with_display_labels_file(self, path: impl AsRef<Path>) -> Result<Self, ScoringError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ScoringError::ValidationError(format!(
                "Failed to read display labels {}: {}",
                path.display(),
                e
            ))
        })?;
        let labels: HashMap<String, String> = serde_json::from_str(&raw).map_err(|e| {
            ScoringError::ValidationError(format!(
                "Display labels {} must be a JSON object of strings: {}",
                path.display(),
                e
            ))
        })?;
        debug!("Loaded {} display labels from {:?}", labels.len(), path);
        Ok(self.with_display_labels(labels))
    }

    pub fn with_display_column(mut self, column: impl Into<String>) -> Self {
        self.display_column = column.into();
        self
    }

    pub fn with_anonymous_name(mut self, name: impl Into<String>) -> Self {
        self.anonymous_name = name.into();
        self
    }

    /// Display string for a label. Labels without a mapping render as
    /// themselves; `None` when display labels are not configured at all.
    pub fn display_label(&self, label: &str) -> Option<String> {
        self.display_labels
            .as_ref()
            .map(|labels| labels.get(label).cloned().unwrap_or_else(|| label.to_string()))
    }

    /// The artifact directory this configuration points at.
    pub fn resolve_artifact_dir(&self) -> PathBuf {
        match &self.artifact_dir {
            Some(dir) => dir.clone(),
            None => Self::default_artifact_dir(),
        }
    }

    /// Returns the default artifact directory path
    pub fn default_artifact_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(ARTIFACTS_ENV_VAR) {
            if !path.trim().is_empty() {
                info!("Using artifact directory from {}", ARTIFACTS_ENV_VAR);
                return PathBuf::from(path);
            }
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("reviewsent").join("artifacts");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir
                .join(".local")
                .join("share")
                .join("reviewsent")
                .join("artifacts");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("reviewsent").join("artifacts")
    }
}
