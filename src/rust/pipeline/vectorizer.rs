use std::collections::{BTreeMap, HashMap, HashSet};

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::Deserialize;

use super::capabilities::{FeatureRow, Vectorize};
use super::error::ScoringError;
use super::utils::{normalize_values, Norm};

/// Token pattern used when the artifact does not carry its own.
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

lazy_static! {
    static ref DEFAULT_TOKEN_REGEX: Regex =
        Regex::new(DEFAULT_TOKEN_PATTERN).expect("default token pattern is a valid regex");
}

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

fn default_analyzer() -> String {
    "word".to_string()
}

/// On-disk shape of a fitted TF-IDF vectorizer.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorizerArtifact {
    pub vocabulary: HashMap<String, usize>,
    #[serde(default)]
    pub idf: Vec<f32>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
    /// `null` disables normalization; a missing field means `l2`.
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
    #[serde(default = "default_true")]
    pub use_idf: bool,
    #[serde(default)]
    pub stop_words: Option<Vec<String>>,
    #[serde(default = "default_analyzer")]
    pub analyzer: String,
    #[serde(default)]
    pub strip_accents: Option<String>,
}

/// A frozen term-frequency / inverse-document-frequency vectorizer.
///
/// The vocabulary and IDF weights are fixed at construction; unseen tokens
/// are ignored, so a text with no known tokens vectorizes to an empty row.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f32>>,
    n_features: usize,
    lowercase: bool,
    token_regex: Regex,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Norm,
    stop_words: HashSet<String>,
}

impl TfidfVectorizer {
    /// Builds a vectorizer from its artifact, rejecting anything this crate
    /// cannot reproduce faithfully.
    pub fn from_artifact(artifact: VectorizerArtifact) -> Result<Self, ScoringError> {
        let invalid = |msg: String| ScoringError::ArtifactLoadError(msg);

        if artifact.analyzer != "word" {
            return Err(invalid(format!(
                "Unsupported analyzer '{}', only 'word' is supported",
                artifact.analyzer
            )));
        }
        if let Some(strip) = &artifact.strip_accents {
            return Err(invalid(format!("Unsupported strip_accents setting '{}'", strip)));
        }
        if artifact.vocabulary.is_empty() {
            return Err(invalid("Vectorizer vocabulary is empty".into()));
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(invalid(format!("Invalid ngram_range ({}, {})", min_n, max_n)));
        }

        let n_features = artifact.vocabulary.len();
        let mut seen = vec![false; n_features];
        for (term, &index) in &artifact.vocabulary {
            if index >= n_features {
                return Err(invalid(format!(
                    "Vocabulary index {} for term '{}' is out of range (size {})",
                    index, term, n_features
                )));
            }
            if seen[index] {
                return Err(invalid(format!("Vocabulary index {} is assigned twice", index)));
            }
            seen[index] = true;
        }

        let idf = if artifact.use_idf {
            if artifact.idf.len() != n_features {
                return Err(invalid(format!(
                    "IDF length mismatch: expected {}, got {}",
                    n_features,
                    artifact.idf.len()
                )));
            }
            if artifact.idf.iter().any(|w| !w.is_finite()) {
                return Err(invalid("IDF weights must be finite".into()));
            }
            Some(artifact.idf)
        } else {
            None
        };

        let token_regex = if artifact.token_pattern == DEFAULT_TOKEN_PATTERN {
            DEFAULT_TOKEN_REGEX.clone()
        } else {
            Regex::new(&artifact.token_pattern)
                .map_err(|e| invalid(format!("Invalid token_pattern: {}", e)))?
        };
        // captures_len counts the implicit whole-match group
        if token_regex.captures_len() > 2 {
            return Err(invalid(
                "token_pattern may contain at most one capturing group".into(),
            ));
        }

        let stop_words = artifact
            .stop_words
            .unwrap_or_default()
            .into_iter()
            .collect();

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf,
            n_features,
            lowercase: artifact.lowercase,
            token_regex,
            ngram_range: artifact.ngram_range,
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm.unwrap_or(Norm::None),
            stop_words,
        })
    }

    /// Parses and validates a vectorizer from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self, ScoringError> {
        let artifact: VectorizerArtifact = serde_json::from_str(json)
            .map_err(|e| ScoringError::ArtifactLoadError(format!("Invalid vectorizer JSON: {}", e)))?;
        Self::from_artifact(artifact)
    }

    /// Looks up the column of a vocabulary term.
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Splits a text into the terms the vocabulary is keyed by: tokens with
    /// stop words removed, expanded into the configured n-grams.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let tokens: Vec<String> = if self.token_regex.captures_len() > 1 {
            self.token_regex
                .captures_iter(&text)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
                .collect()
        } else {
            self.token_regex
                .find_iter(&text)
                .map(|m| m.as_str().to_string())
                .collect()
        };

        let tokens: Vec<String> = tokens
            .into_iter()
            .filter(|t| !self.stop_words.contains(t))
            .collect();

        self.word_ngrams(tokens)
    }

    fn word_ngrams(&self, tokens: Vec<String>) -> Vec<String> {
        let (mut min_n, max_n) = self.ngram_range;
        if max_n == 1 {
            return tokens;
        }

        let original = tokens;
        let mut terms = if min_n == 1 {
            min_n += 1;
            original.clone()
        } else {
            Vec::new()
        };

        for n in min_n..=max_n.min(original.len()) {
            for window in original.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    fn transform_one(&self, text: &str) -> FeatureRow {
        let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
        for term in self.analyze(text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let (indices, mut values): (Vec<usize>, Vec<f32>) = counts
            .into_iter()
            .map(|(index, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                let weight = match &self.idf {
                    Some(idf) => tf * idf[index],
                    None => tf,
                };
                (index, weight)
            })
            .unzip();

        normalize_values(&mut values, self.norm);
        FeatureRow::new(indices, values)
    }

    /// Vectorizes a batch of texts, one row per text.
    pub fn transform<S: AsRef<str>>(&self, texts: &[S]) -> Vec<FeatureRow> {
        texts.iter().map(|t| self.transform_one(t.as_ref())).collect()
    }
}

impl Vectorize for TfidfVectorizer {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn vectorize(&self, texts: &[&str]) -> Result<Vec<FeatureRow>, ScoringError> {
        let rows = self.transform(texts);
        debug!(
            "Vectorized {} texts ({} without known terms)",
            rows.len(),
            rows.iter().filter(|r| r.is_empty()).count()
        );
        Ok(rows)
    }
}
