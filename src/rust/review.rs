use std::io::Write;

use chrono::{DateTime, FixedOffset};
use log::{info, warn};

use crate::config::ScoringConfig;
use crate::pipeline::{Classify, DecodeLabel, ScoringError, ScoringPipeline, Vectorize};
use crate::timestamp;

/// Default file name for a manually scored review
pub const MANUAL_OUTPUT_FILE: &str = "manual_review_prediction.csv";

/// Column holding the predicted label in every CSV this crate writes
pub const PREDICTION_COLUMN: &str = "predicted_sentiment";

const MANUAL_COLUMNS: [&str; 5] = ["name", "star_rating", "date", "review", PREDICTION_COLUMN];

/// A single user-submitted review.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub text: String,
    pub name: Option<String>,
    pub star_rating: Option<u8>,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl Review {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            name: None,
            star_rating: None,
            timestamp: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_star_rating(mut self, stars: u8) -> Self {
        self.star_rating = Some(stars);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Checks a manually entered review before it is scored.
    ///
    /// # Errors
    /// - `EmptyInputError` if the text is blank or whitespace only
    /// - `ValidationError` if the star rating is outside 1..=5
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.text.trim().is_empty() {
            return Err(ScoringError::EmptyInputError(
                "Please fill in the review first".into(),
            ));
        }
        if let Some(stars) = self.star_rating {
            if !(1..=5).contains(&stars) {
                return Err(ScoringError::ValidationError(format!(
                    "Star rating must be between 1 and 5, got {}",
                    stars
                )));
            }
        }
        Ok(())
    }
}

/// A review together with the label the pipeline assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub review: Review,
    pub predicted_sentiment: String,
    /// Human-language rendering of the label, when display labels are configured
    pub display_label: Option<String>,
}

impl PredictionResult {
    fn record(&self) -> Vec<String> {
        let review = &self.review;
        let mut record = vec![
            review.name.clone().unwrap_or_default(),
            review
                .star_rating
                .map(|s| s.to_string())
                .unwrap_or_default(),
            review
                .timestamp
                .as_ref()
                .map(timestamp::format_timestamp)
                .unwrap_or_default(),
            review.text.clone(),
            self.predicted_sentiment.clone(),
        ];
        if let Some(display) = &self.display_label {
            record.push(display.clone());
        }
        record
    }
}

/// Scores one manually entered review.
///
/// Blank text is rejected with `EmptyInputError` and nothing is scored. A
/// missing or blank name becomes the configured anonymous name, and a missing
/// timestamp becomes the current local time.
pub fn score_review<V, C, D>(
    pipeline: &ScoringPipeline<V, C, D>,
    review: Review,
    config: &ScoringConfig,
) -> Result<PredictionResult, ScoringError>
where
    V: Vectorize,
    C: Classify,
    D: DecodeLabel,
{
    if let Err(e) = review.validate() {
        warn!("Manual review rejected: {}", e);
        return Err(e);
    }

    let label = pipeline.score_one(&review.text)?;
    info!("Manual review scored as '{}'", label);

    let name = review
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| config.anonymous_name.clone());
    let timestamp = review.timestamp.unwrap_or_else(timestamp::now);

    Ok(PredictionResult {
        display_label: config.display_label(&label),
        predicted_sentiment: label,
        review: Review {
            name: Some(name),
            timestamp: Some(timestamp),
            ..review
        },
    })
}

/// Writes scored manual reviews as CSV with a header row.
pub fn write_results<W: Write>(
    results: &[PredictionResult],
    writer: W,
    config: &ScoringConfig,
) -> Result<(), ScoringError> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = MANUAL_COLUMNS.to_vec();
    if config.display_labels.is_some() {
        header.push(&config.display_column);
    }
    csv.write_record(&header)?;

    for result in results {
        csv.write_record(result.record())?;
    }
    csv.flush()
        .map_err(|e| ScoringError::CsvError(format!("Failed to write CSV: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{LabelEncoder, LinearClassifier, ScoringArtifacts, TfidfVectorizer};
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn pipeline() -> ScoringPipeline {
        let vectorizer = TfidfVectorizer::from_json_str(
            r#"{"vocabulary": {"love": 0, "useless": 1}, "idf": [1.0, 1.0]}"#,
        )
        .unwrap();
        let classifier = LinearClassifier::from_json_str(
            r#"{"coef": [[1.0, -1.0]], "intercept": [0.0], "classes": [0, 1]}"#,
        )
        .unwrap();
        let encoder = LabelEncoder::new(vec!["negative", "positive"]).unwrap();
        ScoringPipeline::from_artifacts(ScoringArtifacts::new(vectorizer, classifier, encoder))
            .unwrap()
    }

    fn fixed_time() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 31, 14, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_blank_review_is_rejected() {
        let config = ScoringConfig::default();
        for text in ["", "   ", "\n\t"] {
            let result = score_review(&pipeline(), Review::new(text), &config);
            assert!(matches!(result, Err(ScoringError::EmptyInputError(_))));
        }
    }

    #[test]
    fn test_star_rating_range() {
        let config = ScoringConfig::default();
        let review = Review::new("love it").with_star_rating(6);
        assert!(matches!(
            score_review(&pipeline(), review, &config),
            Err(ScoringError::ValidationError(_))
        ));
    }

    #[test]
    fn test_anonymous_name_and_label() {
        let config = ScoringConfig::default();
        let review = Review::new("I love this tuner")
            .with_name("  ")
            .with_star_rating(5)
            .with_timestamp(fixed_time());
        let result = score_review(&pipeline(), review, &config).unwrap();
        assert_eq!(result.predicted_sentiment, "positive");
        assert_eq!(result.review.name.as_deref(), Some("(Anonymous)"));
        assert_eq!(result.display_label, None);
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        let config = ScoringConfig::default();
        let result = score_review(&pipeline(), Review::new("useless"), &config).unwrap();
        assert_eq!(result.predicted_sentiment, "negative");
        assert!(result.review.timestamp.is_some());
    }

    #[test]
    fn test_write_results_csv() {
        let mut labels = HashMap::new();
        labels.insert("positive".to_string(), "Positif".to_string());
        let config = ScoringConfig::default().with_display_labels(labels);

        let review = Review::new("love, love, love")
            .with_name("Dewi")
            .with_star_rating(4)
            .with_timestamp(fixed_time());
        let result = score_review(&pipeline(), review, &config).unwrap();

        let mut out = Vec::new();
        write_results(&[result], &mut out, &config).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "name,star_rating,date,review,predicted_sentiment,sentiment_display\n\
             Dewi,4,2024-05-31 14:30,\"love, love, love\",positive,Positif\n"
        );
    }
}
