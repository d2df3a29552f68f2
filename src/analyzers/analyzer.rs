use tracing::{info, warn};

use crate::analyzers::anomaly::detect_alerts;
use crate::analyzers::nps::nps_summary;
use crate::analyzers::segment::aggregate_segments;
use crate::analyzers::trend::monthly_trend;
use crate::analyzers::types::{AnalysisReport, Module};
use crate::config::AnalysisConfig;
use crate::dataset::{DatasetView, ScoreField, SegmentKey};

const BOTH_SCORES: &[ScoreField] = &[ScoreField::Brand, ScoreField::Dealer];

/// Runs one full analysis pass over `view`.
///
/// Nothing is cached between passes; calling this twice on the same view
/// gives identical reports.
#[tracing::instrument(skip_all, fields(records = view.len(), module = %module))]
pub fn analyze(
    view: &DatasetView<'_>,
    module: Module,
    brand_filter: Option<&str>,
    config: &AnalysisConfig,
) -> AnalysisReport {
    let records = view.records().iter().copied();
    let brand_nps = nps_summary(records.clone(), ScoreField::Brand);
    let dealer_nps = nps_summary(records, ScoreField::Dealer);

    let alerts = detect_alerts(view, dealer_nps.score, &config.thresholds);
    let dealerships = aggregate_segments(view, SegmentKey::Dealership, BOTH_SCORES);
    let branches = aggregate_segments(view, SegmentKey::Branch, BOTH_SCORES);

    let trend = monthly_trend(view, config.trend_field);
    if trend.is_none() {
        warn!("Trend section skipped: no date/period column");
    }

    info!(
        brand_nps = brand_nps.score,
        dealer_nps = dealer_nps.score,
        alerts = alerts.len(),
        "Analysis pass complete"
    );

    AnalysisReport {
        module,
        brand_filter: brand_filter.map(str::to_string),
        record_count: view.len(),
        brand_nps,
        dealer_nps,
        alerts,
        dealerships,
        branches,
        trend,
    }
}
