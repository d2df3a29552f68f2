//! Partitioning a view by a categorical attribute and reducing each partition.

use std::collections::BTreeMap;

use tracing::debug;

use crate::analyzers::nps::nps_summary;
use crate::analyzers::types::{FieldSummary, SegmentSummary};
use crate::analyzers::utility::share;
use crate::dataset::{DatasetView, ScoreField, SegmentKey, SurveyRecord};

/// Records of a view sharing one segment value.
#[derive(Debug, Clone)]
pub struct Partition<'a> {
    pub key: &'a str,
    pub records: Vec<&'a SurveyRecord>,
}

/// Groups `view` by `key`, ordered by segment value.
///
/// Records with a missing or blank segment value are left out of every group.
pub fn partition<'a>(view: &DatasetView<'a>, key: SegmentKey) -> Vec<Partition<'a>> {
    let mut groups: BTreeMap<&'a str, Vec<&'a SurveyRecord>> = BTreeMap::new();

    for &record in view.records() {
        if let Some(value) = record.segment(key) {
            groups.entry(value).or_default().push(record);
        }
    }

    groups
        .into_iter()
        .map(|(key, records)| Partition { key, records })
        .collect()
}

/// Computes one [`SegmentSummary`] per distinct segment value in `view`.
///
/// Weights are relative to the size of `view`, not of the unfiltered dataset.
pub fn aggregate_segments(
    view: &DatasetView<'_>,
    key: SegmentKey,
    fields: &[ScoreField],
) -> Vec<SegmentSummary> {
    let view_total = view.len();

    let summaries: Vec<SegmentSummary> = partition(view, key)
        .into_iter()
        .map(|group| summarize(&group, fields, view_total))
        .collect();

    debug!(?key, segments = summaries.len(), view_total, "Segments aggregated");
    summaries
}

fn summarize(group: &Partition<'_>, fields: &[ScoreField], view_total: usize) -> SegmentSummary {
    let scores = fields
        .iter()
        .map(|&field| FieldSummary {
            field,
            nps: nps_summary(group.records.iter().copied(), field),
        })
        .collect();

    SegmentSummary {
        segment: group.key.to_string(),
        scores,
        record_count: group.records.len(),
        weight: share(group.records.len(), view_total),
    }
}
