//! Data types produced by an analysis pass.

use chrono::NaiveDate;
use serde::Serialize;

use crate::dataset::ScoreField;

/// Net Promoter Score of a set of records.
///
/// `promoters + passives + detractors == total`; missing scores are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NpsSummary {
    pub score: f64,
    pub promoters: usize,
    pub passives: usize,
    pub detractors: usize,
    pub total: usize,
}

/// NPS of one score column inside a segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: ScoreField,
    pub nps: NpsSummary,
}

/// Per-segment KPIs for a single grouping pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub segment: String,
    pub scores: Vec<FieldSummary>,
    pub record_count: usize,
    /// `record_count / view size`, in `[0, 1]`.
    pub weight: f64,
}

impl SegmentSummary {
    pub fn nps(&self, field: ScoreField) -> Option<&NpsSummary> {
        self.scores.iter().find(|s| s.field == field).map(|s| &s.nps)
    }

    pub fn weight_pct(&self) -> f64 {
        self.weight * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertCategory {
    SegmentDeviation,
    BrandGap,
}

/// Values measured for an alert, by rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum AlertMeasure {
    SegmentDeviation {
        nps: f64,
        reference_nps: f64,
    },
    BrandGap {
        brand_nps: f64,
        dealer_nps: f64,
        gap: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub segment: String,
    pub measure: AlertMeasure,
    /// Share of the view held by the segment, as a percentage.
    pub weight_pct: f64,
    pub message: String,
}

impl Alert {
    pub fn category(&self) -> AlertCategory {
        match self.measure {
            AlertMeasure::SegmentDeviation { .. } => AlertCategory::SegmentDeviation,
            AlertMeasure::BrandGap { .. } => AlertCategory::BrandGap,
        }
    }
}

/// Output of both alert rules, each in group discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertSet {
    pub deviations: Vec<Alert>,
    pub gaps: Vec<Alert>,
}

impl AlertSet {
    pub fn is_empty(&self) -> bool {
        self.deviations.is_empty() && self.gaps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deviations.len() + self.gaps.len()
    }
}

/// NPS for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// First day of the month.
    pub period: NaiveDate,
    pub score: f64,
    pub nps: NpsSummary,
}

/// Business line the pass is labelled with. Does not change any number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    #[default]
    Sales,
    AfterSales,
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sales => write!(f, "Sales"),
            Self::AfterSales => write!(f, "After-sales"),
        }
    }
}

/// Complete result of one analysis pass over a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub module: Module,
    pub brand_filter: Option<String>,
    pub record_count: usize,
    pub brand_nps: NpsSummary,
    pub dealer_nps: NpsSummary,
    pub alerts: AlertSet,
    pub dealerships: Vec<SegmentSummary>,
    pub branches: Vec<SegmentSummary>,
    /// `None` when the source has no date/period column.
    pub trend: Option<Vec<TrendPoint>>,
}
