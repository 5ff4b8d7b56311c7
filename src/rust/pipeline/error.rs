use std::fmt;

/// Represents the different types of errors that can occur while scoring reviews.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// An artifact is missing, unreadable or corrupt. The pipeline cannot start.
    ArtifactLoadError(String),
    /// A manual review was submitted with blank text
    EmptyInputError(String),
    /// Error occurred due to invalid input parameters
    ValidationError(String),
    /// The uploaded CSV could not be read or written
    CsvError(String),
    /// Error occurred while making predictions
    PredictionError(String),
}

impl ScoringError {
    /// Returns true when the process cannot serve any request after this error.
    ///
    /// Only artifact failures are fatal; everything else is scoped to the
    /// interaction that triggered it and the caller may retry with new input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ArtifactLoadError(_))
    }

    /// The message without the error kind prefix
    pub fn message(&self) -> &str {
        match self {
            Self::ArtifactLoadError(msg)
            | Self::EmptyInputError(msg)
            | Self::ValidationError(msg)
            | Self::CsvError(msg)
            | Self::PredictionError(msg) => msg,
        }
    }
}

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArtifactLoadError(msg) => write!(f, "Artifact load error: {}", msg),
            Self::EmptyInputError(msg) => write!(f, "Empty input: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::CsvError(msg) => write!(f, "CSV error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
        }
    }
}

impl std::error::Error for ScoringError {}

impl From<csv::Error> for ScoringError {
    fn from(err: csv::Error) -> Self {
        ScoringError::CsvError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_artifact_errors_are_fatal() {
        assert!(ScoringError::ArtifactLoadError("gone".into()).is_fatal());
        assert!(!ScoringError::EmptyInputError("blank".into()).is_fatal());
        assert!(!ScoringError::ValidationError("no column".into()).is_fatal());
        assert!(!ScoringError::CsvError("bad row".into()).is_fatal());
        assert!(!ScoringError::PredictionError("index".into()).is_fatal());
    }

    #[test]
    fn test_display_prefixes() {
        let err = ScoringError::ValidationError("File must contain a 'review' column".into());
        assert_eq!(err.to_string(), "Validation error: File must contain a 'review' column");
    }
}
