//! Bulk scoring of reviews uploaded as CSV.
//!
//! The input must have a header row with a `review` column. Every other
//! column is carried through untouched, and the predicted label is appended
//! as `predicted_sentiment`. Blank reviews are scored like any other row.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{NaiveDate, Offset, Utc};
use log::{debug, info, warn};

use crate::config::ScoringConfig;
use crate::pipeline::{Classify, DecodeLabel, ScoringError, ScoringPipeline, Vectorize};
use crate::review::PREDICTION_COLUMN;
use crate::timestamp;

/// Default file name for scored batch output
pub const BATCH_OUTPUT_FILE: &str = "predicted_reviews.csv";
/// Required input column
pub const REVIEW_COLUMN: &str = "review";
/// Optional input column parsed as a timestamp
pub const DATE_COLUMN: &str = "date";

/// Review cells read as missing text, matching the NA markers common CSV
/// exporters write for empty values
pub const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

/// An uploaded CSV held fully in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ReviewTable {
    /// Builds a table directly from headers and rows. Short rows are padded
    /// with empty cells.
    ///
    /// # Errors
    /// - `CsvError` if a row has more cells than the header
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, ScoringError> {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, mut row)| {
                if row.len() > width {
                    return Err(ScoringError::CsvError(format!(
                        "Row {} has {} cells but the header has {}",
                        i + 1,
                        row.len(),
                        width
                    )));
                }
                row.resize(width, String::new());
                Ok(row)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    /// Reads a comma separated table with a header row.
    ///
    /// # Errors
    /// - `CsvError` if the input is not valid UTF-8 CSV or a row is wider
    ///   than the header
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ScoringError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv
            .headers()
            .map_err(|e| ScoringError::CsvError(format!("Failed to read header row: {}", e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (i, record) in csv.records().enumerate() {
            let record = record
                .map_err(|e| ScoringError::CsvError(format!("Failed to read row {}: {}", i + 1, e)))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!("Read CSV with {} columns and {} rows", headers.len(), rows.len());
        Self::new(headers, rows)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScoringError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ScoringError::CsvError(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Position of the required `review` column.
    ///
    /// # Errors
    /// - `ValidationError` if the column is missing
    pub fn review_column(&self) -> Result<usize, ScoringError> {
        self.column_index(REVIEW_COLUMN).ok_or_else(|| {
            ScoringError::ValidationError(format!(
                "File must contain a '{}' column",
                REVIEW_COLUMN
            ))
        })
    }
}

/// Inclusive calendar-date window applied to the `date` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, ScoringError> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(ScoringError::ValidationError(format!(
                    "Start date {} is after end date {}",
                    from, to
                )));
            }
        }
        Ok(Self { from, to })
    }

    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Counts gathered while scoring a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Rows in the uploaded file
    pub input_rows: usize,
    /// Rows that were scored and written
    pub scored_rows: usize,
    /// Rows whose `date` value could not be parsed
    pub invalid_dates: usize,
    /// Rows left out by the date window
    pub filtered_out: usize,
    /// Scored rows per predicted label
    pub label_counts: BTreeMap<String, usize>,
}

impl BatchSummary {
    /// Share of scored rows carrying `label`, between 0 and 1.
    pub fn share(&self, label: &str) -> f32 {
        if self.scored_rows == 0 {
            return 0.0;
        }
        *self.label_counts.get(label).unwrap_or(&0) as f32 / self.scored_rows as f32
    }
}

/// A scored batch, ready to preview or download.
#[derive(Debug, Clone)]
pub struct ScoredBatch {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    summary: BatchSummary,
}

impl ScoredBatch {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn summary(&self) -> &BatchSummary {
        &self.summary
    }

    /// The first `n` rows, for display.
    pub fn preview(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Writes the batch as UTF-8 CSV with a header row and no index column.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ScoringError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.headers)?;
        for row in &self.rows {
            csv.write_record(row)?;
        }
        csv.flush()
            .map_err(|e| ScoringError::CsvError(format!("Failed to write CSV: {}", e)))?;
        Ok(())
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, ScoringError> {
        let mut out = Vec::new();
        self.write_csv(&mut out)?;
        Ok(out)
    }
}

/// Finds the position of `name`, appending the column when it is absent.
fn output_column(headers: &mut Vec<String>, name: &str) -> usize {
    match headers.iter().position(|h| h == name) {
        Some(index) => index,
        None => {
            headers.push(name.to_string());
            headers.len() - 1
        }
    }
}

/// Scores every review in `table` with a single pipeline call.
///
/// Rows keep their input order. Unparseable `date` values are counted and
/// logged but never reject a row, unless a date window is active, in which
/// case only rows with a valid date inside the window are kept.
///
/// # Errors
/// - `ValidationError` if the table has no `review` column; nothing is scored
/// - `PredictionError` if the pipeline fails
pub fn score_table<V, C, D>(
    pipeline: &ScoringPipeline<V, C, D>,
    table: &ReviewTable,
    window: &DateWindow,
    config: &ScoringConfig,
) -> Result<ScoredBatch, ScoringError>
where
    V: Vectorize,
    C: Classify,
    D: DecodeLabel,
{
    let review_col = table.review_column()?;
    let date_col = table.column_index(DATE_COLUMN);
    let utc = Utc.fix();

    let mut summary = BatchSummary {
        input_rows: table.len(),
        ..BatchSummary::default()
    };

    let mut kept: Vec<&Vec<String>> = Vec::with_capacity(table.len());
    for row in table.rows() {
        let date = date_col.and_then(|col| timestamp::parse_timestamp(&row[col], utc));
        if date_col.is_some() && date.is_none() {
            summary.invalid_dates += 1;
        }
        if window.is_active() && !date.map_or(false, |d| window.contains(d.date_naive())) {
            summary.filtered_out += 1;
            continue;
        }
        kept.push(row);
    }

    if summary.invalid_dates > 0 {
        warn!(
            "{} of {} rows have an invalid '{}' value",
            summary.invalid_dates,
            table.len(),
            DATE_COLUMN
        );
    }
    if summary.filtered_out > 0 {
        info!("{} rows fall outside the date window", summary.filtered_out);
    }

    let labels = if kept.is_empty() {
        Vec::new()
    } else {
        let texts: Vec<&str> = kept
            .iter()
            .map(|row| row[review_col].as_str())
            .map(|text| if is_missing(text) { "" } else { text })
            .collect();
        pipeline.score(&texts)?
    };

    let mut headers = table.headers().to_vec();
    let prediction_col = output_column(&mut headers, PREDICTION_COLUMN);
    let display_col = config
        .display_labels
        .as_ref()
        .map(|_| output_column(&mut headers, &config.display_column));

    let rows = kept
        .into_iter()
        .zip(labels)
        .map(|(row, label)| {
            let mut out = row.clone();
            out.resize(headers.len(), String::new());
            if is_missing(&out[review_col]) {
                out[review_col].clear();
            }
            if let Some(col) = display_col {
                out[col] = config.display_label(&label).unwrap_or_default();
            }
            *summary.label_counts.entry(label.clone()).or_insert(0) += 1;
            out[prediction_col] = label;
            out
        })
        .collect::<Vec<_>>();

    summary.scored_rows = rows.len();
    info!(
        "Scored {} rows: {:?}",
        summary.scored_rows, summary.label_counts
    );

    Ok(ScoredBatch {
        headers,
        rows,
        summary,
    })
}

/// Reads, scores and writes a CSV file in one go.
///
/// The output is written only after scoring succeeds, so a validation error
/// leaves no file behind.
pub fn score_csv_file<V, C, D>(
    pipeline: &ScoringPipeline<V, C, D>,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    window: &DateWindow,
    config: &ScoringConfig,
) -> Result<ScoredBatch, ScoringError>
where
    V: Vectorize,
    C: Classify,
    D: DecodeLabel,
{
    let table = ReviewTable::from_path(input)?;
    let batch = score_table(pipeline, &table, window, config)?;

    let output = output.as_ref();
    let file = File::create(output).map_err(|e| {
        ScoringError::CsvError(format!("Failed to create {}: {}", output.display(), e))
    })?;
    batch.write_csv(file)?;
    info!("Wrote {} rows to {:?}", batch.rows().len(), output);
    Ok(batch)
}
