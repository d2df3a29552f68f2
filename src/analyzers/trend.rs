use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::analyzers::nps::nps_summary;
use crate::analyzers::types::TrendPoint;
use crate::dataset::{DatasetView, ScoreField, SurveyRecord};

/// Truncates a date to the first day of its month.
pub fn month_start(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

/// Monthly NPS of `field` over `view`, in chronological order.
///
/// Returns `None` when the source has no date column. Records without a parsed
/// date are skipped, and months without a single valid score produce no point.
pub fn monthly_trend(view: &DatasetView<'_>, field: ScoreField) -> Option<Vec<TrendPoint>> {
    if !view.has_date_column() {
        debug!("No date column, trend omitted");
        return None;
    }

    let mut buckets: BTreeMap<NaiveDate, Vec<&SurveyRecord>> = BTreeMap::new();
    for &record in view.records() {
        if let Some(month) = record.date.and_then(month_start) {
            buckets.entry(month).or_default().push(record);
        }
    }

    let points: Vec<TrendPoint> = buckets
        .into_iter()
        .filter_map(|(period, records)| {
            let nps = nps_summary(records, field);
            (nps.total > 0).then_some(TrendPoint {
                period,
                score: nps.score,
                nps,
            })
        })
        .collect();

    debug!(field = field.label(), points = points.len(), "Trend aggregated");
    Some(points)
}
