//! CSV ingestion into typed [`SurveyRecord`]s.
//!
//! Column names are resolved once per file. A missing required column fails
//! the load; a malformed cell only makes that one value missing.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use crate::analyzers::classify::parse_score;
use crate::config::ColumnMapping;
use crate::dataset::{Dataset, SurveyRecord};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Positions of each mapped column in the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndex {
    pub brand_score: usize,
    pub dealer_score: usize,
    pub branch: usize,
    pub dealership: usize,
    pub brand: usize,
    pub date: Option<usize>,
    pub comment: Option<usize>,
}

impl ColumnIndex {
    /// Resolves `mapping` against `headers`.
    ///
    /// # Errors
    ///
    /// Returns an error naming every required column that is absent.
    pub fn resolve(headers: &StringRecord, mapping: &ColumnMapping) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
        };

        let mut missing: Vec<String> = Vec::new();
        let mut require = |name: &str| {
            find(name).unwrap_or_else(|| {
                missing.push(name.to_string());
                usize::MAX
            })
        };

        let brand_score = require(&mapping.brand_score);
        let dealer_score = require(&mapping.dealer_score);
        let branch = require(&mapping.branch);
        let dealership = require(&mapping.dealership);
        let brand = require(&mapping.brand);

        if !missing.is_empty() {
            bail!("missing required column(s): {}", missing.join(", "));
        }

        Ok(Self {
            brand_score,
            dealer_score,
            branch,
            dealership,
            brand,
            date: find_by_hint(headers, &mapping.date_hints),
            comment: find_by_hint(headers, &mapping.comment_hints),
        })
    }
}

/// First header containing any of `hints`, case-insensitive.
pub fn find_by_hint(headers: &StringRecord, hints: &[String]) -> Option<usize> {
    headers.iter().position(|h| {
        let header = h.to_lowercase();
        hints.iter().any(|hint| header.contains(&hint.to_lowercase()))
    })
}

/// Parses a date or timestamp cell. Unrecognised values are missing.
///
/// Slash and dash dates are always read day-first, so `03/02/2024` is
/// 3 February. Month-first exports are not recognised as such.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    // month periods such as "2024-03"
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok()
}

fn text(row: &StringRecord, index: usize) -> Option<String> {
    row.get(index)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn to_record(row: &StringRecord, columns: &ColumnIndex) -> SurveyRecord {
    SurveyRecord {
        brand_score: row.get(columns.brand_score).and_then(parse_score),
        dealer_score: row.get(columns.dealer_score).and_then(parse_score),
        brand: text(row, columns.brand),
        branch: text(row, columns.branch),
        dealership: text(row, columns.dealership),
        date: columns.date.and_then(|i| row.get(i)).and_then(parse_date),
        comment: columns.comment.and_then(|i| text(row, i)),
    }
}

/// Reads a survey export from any reader.
///
/// # Errors
///
/// Returns an error if the header row cannot be read, a required column is
/// missing, or a row is not valid CSV.
pub fn parse_survey_csv<R: Read>(reader: R, mapping: &ColumnMapping) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(mapping.delimiter as u8)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers().context("failed to read header row")?.clone();
    let columns = ColumnIndex::resolve(&headers, mapping)?;
    debug!(?columns, "Columns resolved");

    if columns.date.is_none() {
        warn!("No date/period column found, trend will be skipped");
    }
    if columns.comment.is_none() {
        debug!("No comment column found");
    }

    let mut records = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let row = result.with_context(|| format!("invalid CSV at data row {}", line + 1))?;
        records.push(to_record(&row, &columns));
    }

    let dataset = Dataset::new(records, columns.date.is_some(), columns.comment.is_some());
    info!(records = dataset.len(), "Survey export loaded");
    Ok(dataset)
}

/// Reads a survey export from a file path.
pub fn load_dataset(path: impl AsRef<Path>, mapping: &ColumnMapping) -> Result<Dataset> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open '{}'", path.display()))?;
    parse_survey_csv(file, mapping).with_context(|| format!("failed to load '{}'", path.display()))
}
