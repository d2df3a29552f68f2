//! Rendering and export of analysis results.
//!
//! Supports a plain-text dashboard, JSON, and a CSV export of segment tables.

use std::fmt;
use std::path::Path;

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::types::{Alert, AnalysisReport, SegmentSummary};
use crate::dataset::ScoreField;
use crate::insight::TopicSummary;

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &AnalysisReport) {
    debug!("{:#?}", report);
}

/// Serializes a report as pretty-printed JSON.
pub fn to_json(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Alerts ordered by impact weight, heaviest first. Ties keep discovery order.
pub fn by_weight(alerts: &[Alert]) -> Vec<&Alert> {
    let mut sorted: Vec<&Alert> = alerts.iter().collect();
    sorted.sort_by(|a, b| b.weight_pct.total_cmp(&a.weight_pct));
    sorted
}

/// Plain-text dashboard for one report.
pub struct Dashboard<'a> {
    pub report: &'a AnalysisReport,
    pub volume_threshold_fraction: f64,
}

impl Dashboard<'_> {
    fn write_trend(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Monthly trend")?;
        match &self.report.trend {
            None => writeln!(f, "No date/period column in this export."),
            Some(points) if points.is_empty() => {
                writeln!(f, "No dated surveys with a valid score.")
            }
            Some(points) => {
                for point in points {
                    writeln!(
                        f,
                        "- {}: NPS {:.0} ({} surveys)",
                        point.period.format("%Y-%m"),
                        point.score,
                        point.nps.total
                    )?;
                }
                Ok(())
            }
        }
    }

    fn write_alerts(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alerts = &self.report.alerts;
        let gate = self.volume_threshold_fraction * 100.0;

        writeln!(f, "## Critical alerts")?;
        if alerts.is_empty() {
            return writeln!(
                f,
                "No high-impact alerts (>{gate:.0}% of volume) in {}.",
                self.report.module
            );
        }
        if !alerts.deviations.is_empty() {
            writeln!(f, "Branch deviation (impact >{gate:.0}%):")?;
            for alert in by_weight(&alerts.deviations) {
                writeln!(f, "- {}", alert.message)?;
            }
        }
        if !alerts.gaps.is_empty() {
            writeln!(f, "Brand vs dealer gaps (impact >{gate:.0}%):")?;
            for alert in by_weight(&alerts.gaps) {
                writeln!(f, "- {}", alert.message)?;
            }
        }
        Ok(())
    }

    fn write_dealerships(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Dealership detail")?;
        if self.report.dealerships.is_empty() {
            writeln!(f, "No dealerships in this selection.")?;
        }
        for row in self.report.dealerships.iter().map(SegmentRow::from) {
            writeln!(
                f,
                "- {}: brand NPS {:.0}, dealer NPS {:.0}, {} surveys",
                row.segment, row.brand_nps, row.dealer_nps, row.surveys
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Dashboard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let scope = report.brand_filter.as_deref().unwrap_or("all brands");

        writeln!(f, "# CX dashboard: {} ({scope})", report.module)?;
        writeln!(
            f,
            "Brand NPS {:.0} (based on {} surveys) | Dealer NPS {:.0} (based on {} surveys)",
            report.brand_nps.score,
            report.brand_nps.total,
            report.dealer_nps.score,
            report.dealer_nps.total
        )?;
        writeln!(f)?;
        self.write_trend(f)?;
        writeln!(f)?;
        self.write_alerts(f)?;
        writeln!(f)?;
        self.write_dealerships(f)
    }
}

/// Renders the dashboard as plain text.
pub fn render_text(report: &AnalysisReport, volume_threshold_fraction: f64) -> String {
    Dashboard {
        report,
        volume_threshold_fraction,
    }
    .to_string()
}

/// A qualitative insight, or the informational fallback when there is none.
pub struct InsightText<'a>(pub Option<&'a TopicSummary>);

impl fmt::Display for InsightText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(insight) = self.0 else {
            return writeln!(f, "No qualitative insight available.");
        };

        writeln!(f, "Executive summary: {}", insight.summary)?;
        writeln!(f, "Strengths:")?;
        for t in &insight.satisfaction_topics {
            writeln!(f, "- {} ({} mentions)", t.topic, t.count)?;
        }
        writeln!(f, "Opportunities:")?;
        for t in &insight.dissatisfaction_topics {
            writeln!(f, "- {} ({} mentions)", t.topic, t.count)?;
        }
        Ok(())
    }
}

/// Renders a qualitative insight, or the informational fallback.
pub fn render_insight(insight: Option<&TopicSummary>) -> String {
    InsightText(insight).to_string()
}

/// One line of the segment CSV export.
#[derive(Debug, Serialize)]
pub struct SegmentRow<'a> {
    pub segment: &'a str,
    pub brand_nps: f64,
    pub dealer_nps: f64,
    pub surveys: usize,
    pub weight_pct: f64,
}

impl<'a> From<&'a SegmentSummary> for SegmentRow<'a> {
    fn from(s: &'a SegmentSummary) -> Self {
        let score = |field| s.nps(field).map_or(0.0, |n| n.score);
        Self {
            segment: &s.segment,
            brand_nps: score(ScoreField::Brand),
            dealer_nps: score(ScoreField::Dealer),
            surveys: s.record_count,
            weight_pct: s.weight_pct(),
        }
    }
}

/// Writes segment summaries to a CSV file, replacing any existing file.
pub fn write_segments_csv(path: impl AsRef<Path>, segments: &[SegmentSummary]) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), rows = segments.len(), "Writing segment CSV");

    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for segment in segments {
        writer.serialize(SegmentRow::from(segment))?;
    }
    writer.flush()?;

    Ok(())
}
