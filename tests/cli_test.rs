mod common;

use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn reviewsent(args: &[&str], cwd: &Path) -> std::io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_reviewsent"))
        .args(args)
        .current_dir(cwd)
        .env_remove("REVIEWSENT_ARTIFACTS")
        .env("RUST_LOG", "off")
        .output()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn demo_artifacts() -> String {
    path_arg(&common::demo_artifact_dir())
}

#[test]
fn test_missing_artifact_dir_exits_with_1() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let missing = path_arg(&dir.path().join("no-such-artifacts"));
    let output = reviewsent(
        &["--artifacts", missing.as_str(), "review", "--text", "great app"],
        dir.path(),
    )?;
    assert_eq!(output.status.code(), Some(1));
    Ok(())
}

#[test]
fn test_csv_without_review_column_exits_with_2() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("input.csv");
    let out = dir.path().join("predicted_reviews.csv");
    fs::write(&input, "comment,stars\ngreat,5\n")?;

    let (artifacts, input, out_arg) = (demo_artifacts(), path_arg(&input), path_arg(&out));
    let output = reviewsent(
        &[
            "--artifacts",
            artifacts.as_str(),
            "batch",
            input.as_str(),
            "--output",
            out_arg.as_str(),
        ],
        dir.path(),
    )?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("review"));
    assert!(!out.exists());
    Ok(())
}

#[test]
fn test_blank_review_text_exits_with_2() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let artifacts = demo_artifacts();
    let output = reviewsent(
        &["--artifacts", artifacts.as_str(), "review", "--text", "   ", "--output"],
        dir.path(),
    )?;
    assert_eq!(output.status.code(), Some(2));
    assert!(!dir.path().join("manual_review_prediction.csv").exists());
    Ok(())
}

#[test]
fn test_review_with_display_labels() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let artifacts = demo_artifacts();
    let labels = path_arg(&common::demo_file("display_labels.json"));
    let output = reviewsent(
        &[
            "--artifacts",
            artifacts.as_str(),
            "--display-labels",
            labels.as_str(),
            "--display-column",
            "sentimen",
            "review",
            "--text",
            "great app, love the tuner",
            "--output",
        ],
        dir.path(),
    )?;
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sentimen"));
    assert!(stdout.contains("Positif"));

    let written = fs::read_to_string(dir.path().join("manual_review_prediction.csv"))?;
    let header = written.lines().next().unwrap_or_default();
    assert_eq!(header, "name,star_rating,date,review,predicted_sentiment,sentimen");
    Ok(())
}
