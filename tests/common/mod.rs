#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use reviewsent::{ScoringConfig, ScoringError, ScoringPipeline, ScoringPipelineBuilder};

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(true)
        .try_init();
}

/// Artifacts shipped with the repository, including a manifest.
pub fn demo_artifact_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("artifacts")
}

pub fn demo_file(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

/// Copies the demo artifacts into `dir` so a test can tamper with them.
pub fn copy_artifacts(dir: &Path, with_manifest: bool) -> std::io::Result<()> {
    let mut names = vec!["classifier.json", "vectorizer.json", "label_encoder.json"];
    if with_manifest {
        names.push("manifest.json");
    }
    for name in names {
        fs::copy(demo_artifact_dir().join(name), dir.join(name))?;
    }
    Ok(())
}

pub fn demo_pipeline() -> Result<ScoringPipeline, ScoringError> {
    init_logging();
    ScoringPipelineBuilder::new()
        .with_config(ScoringConfig::default())
        .with_artifact_dir(demo_artifact_dir())?
        .build()
}
