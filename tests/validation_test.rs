mod common;

use reviewsent::{
    score_review, LabelEncoder, LinearClassifier, Review, ScoringArtifacts, ScoringConfig,
    ScoringError, ScoringPipeline, TfidfVectorizer,
};

#[test]
fn test_duplicate_label() {
    let result = LabelEncoder::new(vec!["positive", "negative", "positive"]);
    assert!(matches!(result, Err(ScoringError::ArtifactLoadError(_))));
}

#[test]
fn test_many_labels() -> Result<(), ScoringError> {
    let labels: Vec<String> = (0..10).map(|i| format!("class_{}", i)).collect();
    let encoder = LabelEncoder::new(labels)?;

    let coef: Vec<Vec<f32>> = (0..10)
        .map(|i| (0..10).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();
    let intercept = vec![0.0f32; 10];
    let classes: Vec<usize> = (0..10).collect();
    let classifier = LinearClassifier::from_json_str(
        &serde_json::json!({ "coef": coef, "intercept": intercept, "classes": classes })
            .to_string(),
    )?;

    let vocabulary: serde_json::Map<String, serde_json::Value> = (0..10)
        .map(|i| (format!("word{}", i), serde_json::Value::from(i)))
        .collect();
    let idf = vec![1.0f32; 10];
    let vectorizer = TfidfVectorizer::from_json_str(
        &serde_json::json!({ "vocabulary": vocabulary, "idf": idf }).to_string(),
    )?;

    let pipeline =
        ScoringPipeline::from_artifacts(ScoringArtifacts::new(vectorizer, classifier, encoder))?;
    assert_eq!(pipeline.score_one("word7 word7 word2")?, "class_7");
    // no known tokens: every score ties at zero and the first class wins
    assert_eq!(pipeline.score_one("nothing known")?, "class_0");
    Ok(())
}

#[test]
fn test_mismatched_feature_counts() -> Result<(), ScoringError> {
    let vectorizer = TfidfVectorizer::from_json_str(
        r#"{"vocabulary": {"good": 0, "bad": 1, "meh": 2}, "idf": [1.0, 1.0, 1.0]}"#,
    )?;
    let classifier = LinearClassifier::from_json_str(
        r#"{"coef": [[1.0, -1.0]], "intercept": [0.0], "classes": [0, 1]}"#,
    )?;
    let encoder = LabelEncoder::new(vec!["negative", "positive"])?;

    let result =
        ScoringPipeline::from_artifacts(ScoringArtifacts::new(vectorizer, classifier, encoder));
    assert!(matches!(result, Err(ScoringError::ArtifactLoadError(_))));
    Ok(())
}

#[test]
fn test_classifier_class_outside_encoder() -> Result<(), ScoringError> {
    let vectorizer =
        TfidfVectorizer::from_json_str(r#"{"vocabulary": {"good": 0}, "idf": [1.0]}"#)?;
    let classifier = LinearClassifier::from_json_str(
        r#"{"coef": [[1.0]], "intercept": [0.0], "classes": [0, 5]}"#,
    )?;
    let encoder = LabelEncoder::new(vec!["negative", "positive"])?;

    let result =
        ScoringPipeline::from_artifacts(ScoringArtifacts::new(vectorizer, classifier, encoder));
    assert!(matches!(result, Err(ScoringError::ArtifactLoadError(_))));
    Ok(())
}

#[test]
fn test_blank_manual_review() -> Result<(), ScoringError> {
    let pipeline = common::demo_pipeline()?;
    let config = ScoringConfig::default();
    for text in ["", "    ", "\t\n"] {
        let result = score_review(&pipeline, Review::new(text).with_name("Rina"), &config);
        assert!(matches!(result, Err(ScoringError::EmptyInputError(_))));
    }
    Ok(())
}

#[test]
fn test_star_rating_bounds() -> Result<(), ScoringError> {
    let pipeline = common::demo_pipeline()?;
    let config = ScoringConfig::default();
    for stars in [0, 6, 255] {
        let review = Review::new("love the tuner").with_star_rating(stars);
        let result = score_review(&pipeline, review, &config);
        assert!(matches!(result, Err(ScoringError::ValidationError(_))));
    }
    for stars in 1..=5 {
        let review = Review::new("love the tuner").with_star_rating(stars);
        assert_eq!(score_review(&pipeline, review, &config)?.predicted_sentiment, "positive");
    }
    Ok(())
}
