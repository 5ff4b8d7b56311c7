use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};

use reviewsent::batch::{self, BATCH_OUTPUT_FILE};
use reviewsent::config::DEFAULT_DISPLAY_COLUMN;
use reviewsent::review::MANUAL_OUTPUT_FILE;
use reviewsent::{
    timestamp, DateWindow, PredictionResult, Review, ScoringConfig, ScoringError,
    ScoringPipeline, ScoringPipelineBuilder,
};

const MAX_CELL_WIDTH: usize = 48;

#[derive(Parser)]
#[command(author, version, about = "Score app reviews as positive or negative", long_about = None)]
struct Args {
    /// Directory holding classifier.json, vectorizer.json and label_encoder.json
    #[arg(long, global = true)]
    artifacts: Option<PathBuf>,

    /// Classifier artifact, overriding the directory layout
    #[arg(long, global = true, requires_all = ["vectorizer", "label_encoder"])]
    classifier: Option<PathBuf>,

    #[arg(long, global = true, requires_all = ["classifier", "label_encoder"])]
    vectorizer: Option<PathBuf>,

    #[arg(long, global = true, requires_all = ["classifier", "vectorizer"])]
    label_encoder: Option<PathBuf>,

    /// Skip checking artifacts against manifest.json
    #[arg(long, global = true)]
    no_verify: bool,

    /// JSON object mapping each label to a display string
    #[arg(long, global = true)]
    display_labels: Option<PathBuf>,

    /// Column name for display labels in CSV output
    #[arg(long, global = true, default_value = DEFAULT_DISPLAY_COLUMN)]
    display_column: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a single review typed on the command line
    Review {
        #[arg(long)]
        text: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=5))]
        stars: u8,

        /// Review time, e.g. "2024-05-31 14:30". Defaults to now.
        #[arg(long)]
        date: Option<String>,

        /// Offset for a date without one, e.g. "+07:00". Defaults to local time.
        #[arg(long, allow_hyphen_values = true)]
        utc_offset: Option<String>,

        /// Also write the result as CSV
        #[arg(long, num_args = 0..=1, default_missing_value = MANUAL_OUTPUT_FILE)]
        output: Option<PathBuf>,
    },
    /// Score every row of a CSV file with a 'review' column
    Batch {
        input: PathBuf,

        #[arg(long, default_value = BATCH_OUTPUT_FILE)]
        output: PathBuf,

        /// Number of scored rows to print
        #[arg(long, default_value_t = 5)]
        preview: usize,

        /// Keep only rows dated on or after this day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Keep only rows dated on or before this day (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Show which artifacts are loaded
    Info,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = exit_code(&e);
            match recoverable_error(&e) {
                Some(err) => eprintln!("{}", err),
                None => {
                    error!("{:#}", e);
                    eprintln!("Error: {:#}", e);
                }
            }
            ExitCode::from(code)
        }
    }
}

/// The scoring error behind `err`, when the user can fix it by changing input.
fn recoverable_error(err: &anyhow::Error) -> Option<&ScoringError> {
    err.chain()
        .find_map(|c| c.downcast_ref::<ScoringError>())
        .filter(|e| !e.is_fatal())
}

/// 2 for recoverable scoring errors, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    if recoverable_error(err).is_some() {
        2
    } else {
        1
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = ScoringConfig::new()
        .with_verify_checksums(!args.no_verify)
        .with_display_column(args.display_column.clone());
    if let Some(path) = &args.display_labels {
        config = config.with_display_labels_file(path)?;
    }

    let start = Instant::now();
    let pipeline = build_pipeline(&args, config.clone()).context("Failed to load artifacts")?;
    info!("Artifacts loaded in {:.2?}", start.elapsed());

    match args.command {
        Command::Review {
            text,
            name,
            stars,
            date,
            utc_offset,
            output,
        } => {
            let offset = match utc_offset {
                Some(value) => timestamp::parse_utc_offset(&value)?,
                None => timestamp::local_offset(),
            };
            let mut review = Review::new(text).with_star_rating(stars);
            if let Some(name) = name {
                review = review.with_name(name);
            }
            if let Some(value) = date {
                let ts = timestamp::parse_timestamp(&value, offset).ok_or_else(|| {
                    ScoringError::ValidationError(format!("Invalid date '{}'", value))
                })?;
                review = review.with_timestamp(ts);
            }

            let result = reviewsent::score_review(&pipeline, review, &config)?;
            print_result(&result, &config);

            if let Some(path) = output {
                let file = File::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                reviewsent::write_results(std::slice::from_ref(&result), file, &config)?;
                println!("Saved to {}", path.display());
            }
        }
        Command::Batch {
            input,
            output,
            preview,
            from,
            to,
        } => {
            let from = from.as_deref().map(timestamp::parse_date).transpose()?;
            let to = to.as_deref().map(timestamp::parse_date).transpose()?;
            let window = DateWindow::new(from, to)?;

            let scored = batch::score_csv_file(&pipeline, &input, &output, &window, &config)?;
            print_table(scored.headers(), scored.preview(preview));

            let summary = scored.summary();
            println!();
            println!("Rows scored: {} of {}", summary.scored_rows, summary.input_rows);
            if summary.invalid_dates > 0 {
                println!("Invalid dates: {}", summary.invalid_dates);
            }
            if summary.filtered_out > 0 {
                println!("Outside date window: {}", summary.filtered_out);
            }
            for (label, count) in &summary.label_counts {
                println!(
                    "  {:<12} {:>6}  {:>5.1}%",
                    label,
                    count,
                    summary.share(label) * 100.0
                );
            }
            println!("Saved to {}", output.display());
        }
        Command::Info => {
            let info = pipeline.info();
            if let Some(paths) = &info.paths {
                println!("Classifier:    {}", paths.classifier.display());
                println!("Vectorizer:    {}", paths.vectorizer.display());
                println!("Label encoder: {}", paths.label_encoder.display());
            }
            println!("Model kind:    {}", info.classifier_kind);
            println!("Features:      {}", info.n_features);
            println!("Labels:        {}", info.labels.join(", "));
        }
    }

    Ok(())
}

fn build_pipeline(args: &Args, config: ScoringConfig) -> Result<ScoringPipeline, ScoringError> {
    let mut builder = ScoringPipelineBuilder::new().with_config(config);
    if let (Some(c), Some(v), Some(l)) = (&args.classifier, &args.vectorizer, &args.label_encoder)
    {
        builder = builder.with_custom_artifacts(c, v, l)?;
    } else if let Some(dir) = &args.artifacts {
        builder = builder.with_artifact_dir(dir)?;
    }
    builder.build()
}

fn print_result(result: &PredictionResult, config: &ScoringConfig) {
    let review = &result.review;
    let mut headers = vec!["name", "star_rating", "date", "review", "predicted_sentiment"];
    let mut row = vec![
        review.name.clone().unwrap_or_default(),
        review.star_rating.map(|s| s.to_string()).unwrap_or_default(),
        review
            .timestamp
            .as_ref()
            .map(timestamp::format_timestamp)
            .unwrap_or_default(),
        review.text.clone(),
        result.predicted_sentiment.clone(),
    ];
    if let Some(display) = &result.display_label {
        headers.push(&config.display_column);
        row.push(display.clone());
    }
    let headers: Vec<String> = headers.into_iter().map(String::from).collect();
    print_table(&headers, &[row]);
}

fn truncate(cell: &str) -> String {
    let cell = cell.replace(['\n', '\r'], " ");
    if cell.chars().count() <= MAX_CELL_WIDTH {
        return cell;
    }
    let mut out: String = cell.chars().take(MAX_CELL_WIDTH - 3).collect();
    out.push_str("...");
    out
}

fn print_table(headers: &[String], rows: &[Vec<String>]) {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| truncate(c)).collect())
        .collect();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    println!("{}", line(headers));
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in &rows {
        println!("{}", line(row.as_slice()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let fatal = anyhow::Error::new(ScoringError::ArtifactLoadError("gone".into()))
            .context("Failed to load artifacts");
        assert_eq!(exit_code(&fatal), 1);

        for err in [
            ScoringError::EmptyInputError("blank".into()),
            ScoringError::ValidationError("no review column".into()),
            ScoringError::CsvError("row 3".into()),
        ] {
            assert_eq!(exit_code(&anyhow::Error::new(err).context("Scoring failed")), 2);
        }

        let io = anyhow::Error::new(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(exit_code(&io), 1);
    }
}
