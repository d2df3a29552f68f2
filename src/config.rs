//! Analysis policy and column mapping.
//!
//! Every field has a default, so a config file only needs the keys it changes:
//! ```json
//! {
//!   "thresholds": { "gap_threshold_points": 20.0 },
//!   "columns": { "branch": "Branch", "dealership": "Dealer" }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dataset::ScoreField;

/// Policy parameters of the alert rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Minimum share of the view a segment must hold to be considered.
    pub volume_threshold_fraction: f64,
    /// How far below the reference a branch NPS may fall before alerting.
    pub deviation_threshold_points: f64,
    /// Largest tolerated brand/dealer NPS difference within a dealership.
    pub gap_threshold_points: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            volume_threshold_fraction: 0.05,
            deviation_threshold_points: 10.0,
            gap_threshold_points: 15.0,
        }
    }
}

/// Header names of the survey export.
///
/// Required columns are matched exactly (ignoring case and surrounding
/// whitespace); optional ones by case-insensitive substring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub brand_score: String,
    pub dealer_score: String,
    pub branch: String,
    pub dealership: String,
    pub brand: String,
    pub date_hints: Vec<String>,
    pub comment_hints: Vec<String>,
    /// Field separator of the CSV file.
    pub delimiter: char,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            brand_score: "Nota NPS Marca".to_string(),
            dealer_score: "Nota NPS CCS".to_string(),
            branch: "Sucursal".to_string(),
            dealership: "Concesionario".to_string(),
            brand: "Marca".to_string(),
            date_hints: vec![
                "fecha".to_string(),
                "periodo".to_string(),
                "date".to_string(),
                "period".to_string(),
            ],
            comment_hints: vec!["comentario".to_string(), "comment".to_string()],
            delimiter: ',',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub thresholds: AlertThresholds,
    pub columns: ColumnMapping,
    /// Score column the monthly trend is computed on.
    pub trend_field: ScoreField,
    /// Maximum number of comments sent to the insight provider.
    pub comment_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            thresholds: AlertThresholds::default(),
            columns: ColumnMapping::default(),
            trend_field: ScoreField::Brand,
            comment_limit: 200,
        }
    }
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("invalid config '{path}'"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
