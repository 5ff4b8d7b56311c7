use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::pipeline::{
    ClassifierArtifact, Classify, LabelEncoder, LabelEncoderArtifact, LinearClassifier,
    ScoringArtifacts, ScoringError, TfidfVectorizer, VectorizerArtifact,
};

/// Name of the optional checksum file next to the artifacts
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("{kind} artifact not found at {}", .path.display())]
    Missing { kind: ArtifactKind, path: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse {kind} artifact: {source}")]
    Parse {
        kind: ArtifactKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to parse manifest: {0}")]
    Manifest(#[source] serde_json::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {kind} file")]
    ChecksumMismatch {
        kind: ArtifactKind,
        expected: String,
        actual: String,
    },
    #[error("Invalid {kind} artifact: {reason}")]
    Invalid { kind: ArtifactKind, reason: String },
}

impl From<ArtifactError> for ScoringError {
    fn from(err: ArtifactError) -> Self {
        ScoringError::ArtifactLoadError(err.to_string())
    }
}

/// The three artifact files a scoring pipeline is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Classifier,
    Vectorizer,
    LabelEncoder,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Classifier,
        ArtifactKind::Vectorizer,
        ArtifactKind::LabelEncoder,
    ];

    /// File name inside an artifact directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Classifier => "classifier.json",
            Self::Vectorizer => "vectorizer.json",
            Self::LabelEncoder => "label_encoder.json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classifier => write!(f, "classifier"),
            Self::Vectorizer => write!(f, "vectorizer"),
            Self::LabelEncoder => write!(f, "label encoder"),
        }
    }
}

/// Locations of the three artifact files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub classifier: PathBuf,
    pub vectorizer: PathBuf,
    pub label_encoder: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            classifier: dir.join(ArtifactKind::Classifier.file_name()),
            vectorizer: dir.join(ArtifactKind::Vectorizer.file_name()),
            label_encoder: dir.join(ArtifactKind::LabelEncoder.file_name()),
        }
    }

    pub fn get(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Classifier => &self.classifier,
            ArtifactKind::Vectorizer => &self.vectorizer,
            ArtifactKind::LabelEncoder => &self.label_encoder,
        }
    }
}

/// Expected SHA-256 digests, keyed like the artifact files.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    pub classifier: Option<String>,
    pub vectorizer: Option<String>,
    pub label_encoder: Option<String>,
}

impl Manifest {
    pub fn expected(&self, kind: ArtifactKind) -> Option<&str> {
        match kind {
            ArtifactKind::Classifier => self.classifier.as_deref(),
            ArtifactKind::Vectorizer => self.vectorizer.as_deref(),
            ArtifactKind::LabelEncoder => self.label_encoder.as_deref(),
        }
    }
}

/// Read-only access to a set of artifact files on disk.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    paths: ArtifactPaths,
    manifest_path: Option<PathBuf>,
}

impl ArtifactStore {
    /// Uses the conventional file names inside `dir`, plus its manifest if any.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            paths: ArtifactPaths::in_dir(dir),
            manifest_path: Some(dir.join(MANIFEST_FILE)),
        }
    }

    /// Uses explicit file locations. No manifest is consulted.
    pub fn from_paths(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            manifest_path: None,
        }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    pub fn path(&self, kind: ArtifactKind) -> &Path {
        self.paths.get(kind)
    }

    pub fn is_complete(&self) -> bool {
        log::info!("Checking artifact files:");
        ArtifactKind::ALL.iter().all(|&kind| {
            let path = self.path(kind);
            log::info!("  {} path: {:?} (exists: {})", kind, path, path.exists());
            path.exists()
        })
    }

    fn hash_file(path: &Path) -> Result<String, ArtifactError> {
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Reads the manifest, if this store has one and it exists.
    pub fn manifest(&self) -> Result<Option<Manifest>, ArtifactError> {
        let path = match &self.manifest_path {
            Some(path) if path.exists() => path,
            _ => return Ok(None),
        };
        let raw = fs::read_to_string(path)?;
        let manifest = serde_json::from_str(&raw).map_err(ArtifactError::Manifest)?;
        Ok(Some(manifest))
    }

    /// Checks every artifact listed in the manifest against its digest.
    ///
    /// Returns `Ok(false)` when a file is missing or a digest differs, and
    /// `Ok(true)` when there is nothing to contradict the files.
    pub fn verify(&self) -> Result<bool, ArtifactError> {
        match self.verify_strict() {
            Ok(()) => Ok(true),
            Err(ArtifactError::Missing { .. }) | Err(ArtifactError::ChecksumMismatch { .. }) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn verify_strict(&self) -> Result<(), ArtifactError> {
        let manifest = match self.manifest()? {
            Some(manifest) => manifest,
            None => {
                log::debug!("No manifest found, skipping checksum verification");
                return Ok(());
            }
        };

        for kind in ArtifactKind::ALL {
            let expected = match manifest.expected(kind) {
                Some(expected) => expected.to_lowercase(),
                None => continue,
            };
            let path = self.path(kind);
            if !path.exists() {
                return Err(ArtifactError::Missing {
                    kind,
                    path: path.to_path_buf(),
                });
            }
            let actual = Self::hash_file(path)?;
            log::debug!("{} hash: {} (expected {})", kind, actual, expected);
            if actual != expected {
                log::error!("{} hash mismatch: expected {}, got {}", kind, expected, actual);
                return Err(ArtifactError::ChecksumMismatch {
                    kind,
                    expected,
                    actual,
                });
            }
        }
        log::info!("Artifact checksums verified");
        Ok(())
    }

    fn read_artifact<T: DeserializeOwned>(&self, kind: ArtifactKind) -> Result<T, ArtifactError> {
        let path = self.path(kind);
        if !path.exists() {
            return Err(ArtifactError::Missing {
                kind,
                path: path.to_path_buf(),
            });
        }
        log::info!("Loading {} from {:?}", kind, path);
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse { kind, source })
    }

    /// Loads, validates and cross-checks all three artifacts.
    ///
    /// Any failure here is fatal: nothing can be scored without every artifact.
    pub fn load(&self, verify_checksums: bool) -> Result<ScoringArtifacts, ArtifactError> {
        if verify_checksums {
            self.verify_strict()?;
        }

        let invalid = |kind: ArtifactKind| {
            move |e: ScoringError| ArtifactError::Invalid {
                kind,
                reason: e.message().to_string(),
            }
        };

        let vectorizer: VectorizerArtifact = self.read_artifact(ArtifactKind::Vectorizer)?;
        let vectorizer = TfidfVectorizer::from_artifact(vectorizer)
            .map_err(invalid(ArtifactKind::Vectorizer))?;

        let classifier: ClassifierArtifact = self.read_artifact(ArtifactKind::Classifier)?;
        let classifier = LinearClassifier::from_artifact(classifier)
            .map_err(invalid(ArtifactKind::Classifier))?;

        let label_encoder: LabelEncoderArtifact =
            self.read_artifact(ArtifactKind::LabelEncoder)?;
        let label_encoder = LabelEncoder::from_artifact(label_encoder)
            .map_err(invalid(ArtifactKind::LabelEncoder))?;

        let artifacts = ScoringArtifacts::new(vectorizer, classifier, label_encoder);
        artifacts
            .validate()
            .map_err(invalid(ArtifactKind::Classifier))?;

        log::info!(
            "Artifacts loaded: {} labels, {} features",
            artifacts.label_encoder.len(),
            artifacts.classifier.n_features()
        );
        Ok(artifacts)
    }
}
