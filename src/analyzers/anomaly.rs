//! Volume-gated alert rules over branch and dealership segments.

use tracing::debug;

use crate::analyzers::nps::nps_summary;
use crate::analyzers::segment::{Partition, partition};
use crate::analyzers::types::{Alert, AlertMeasure, AlertSet};
use crate::analyzers::utility::pct;
use crate::config::AlertThresholds;
use crate::dataset::{DatasetView, ScoreField, SegmentKey};

/// Runs both alert rules over `view`.
///
/// `reference_nps` is normally the dealer-score NPS of the same view.
pub fn detect_alerts(
    view: &DatasetView<'_>,
    reference_nps: f64,
    thresholds: &AlertThresholds,
) -> AlertSet {
    let alerts = AlertSet {
        deviations: branch_deviations(view, reference_nps, thresholds),
        gaps: brand_gaps(view, thresholds),
    };

    debug!(
        deviations = alerts.deviations.len(),
        gaps = alerts.gaps.len(),
        reference_nps,
        "Alert rules evaluated"
    );
    alerts
}

/// Branches whose dealer NPS sits more than the deviation threshold below the reference.
pub fn branch_deviations(
    view: &DatasetView<'_>,
    reference_nps: f64,
    thresholds: &AlertThresholds,
) -> Vec<Alert> {
    let total = view.len();
    let floor = reference_nps - thresholds.deviation_threshold_points;

    qualifying(view, SegmentKey::Branch, thresholds)
        .filter_map(|group| {
            let nps = nps_summary(group.records.iter().copied(), ScoreField::Dealer).score;
            if nps >= floor {
                return None;
            }

            let weight_pct = pct(group.records.len(), total);
            Some(Alert {
                segment: group.key.to_string(),
                message: format!(
                    "{}: NPS {:.0} | impact {:.1}% of volume",
                    group.key, nps, weight_pct
                ),
                measure: AlertMeasure::SegmentDeviation { nps, reference_nps },
                weight_pct,
            })
        })
        .collect()
}

/// Dealerships whose brand and dealer NPS differ by more than the gap threshold.
pub fn brand_gaps(view: &DatasetView<'_>, thresholds: &AlertThresholds) -> Vec<Alert> {
    let total = view.len();

    qualifying(view, SegmentKey::Dealership, thresholds)
        .filter_map(|group| {
            let brand_nps = nps_summary(group.records.iter().copied(), ScoreField::Brand).score;
            let dealer_nps = nps_summary(group.records.iter().copied(), ScoreField::Dealer).score;
            let gap = (brand_nps - dealer_nps).abs();
            if gap <= thresholds.gap_threshold_points {
                return None;
            }

            let weight_pct = pct(group.records.len(), total);
            Some(Alert {
                segment: group.key.to_string(),
                message: format!(
                    "{}: gap of {:.0} pts (brand {:.0} vs dealer {:.0}) | weight {:.1}%",
                    group.key, gap, brand_nps, dealer_nps, weight_pct
                ),
                measure: AlertMeasure::BrandGap {
                    brand_nps,
                    dealer_nps,
                    gap,
                },
                weight_pct,
            })
        })
        .collect()
}

/// Partitions of `view` holding at least the volume-threshold share of its records.
fn qualifying<'a>(
    view: &DatasetView<'a>,
    key: SegmentKey,
    thresholds: &AlertThresholds,
) -> impl Iterator<Item = Partition<'a>> {
    let min_volume = thresholds.volume_threshold_fraction * view.len() as f64;
    partition(view, key)
        .into_iter()
        .filter(move |group| group.records.len() as f64 >= min_volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::AlertCategory;
    use crate::dataset::{Dataset, SurveyRecord, ViewFilter};

    fn branch_records(
        branch: &str,
        promoters: usize,
        passives: usize,
        detractors: usize,
    ) -> Vec<SurveyRecord> {
        let make = |score: f64| SurveyRecord {
            branch: Some(branch.to_string()),
            dealership: Some(format!("{branch} Motors")),
            brand_score: Some(score),
            dealer_score: Some(score),
            ..Default::default()
        };
        let mut out = Vec::new();
        out.extend((0..promoters).map(|_| make(10.0)));
        out.extend((0..passives).map(|_| make(8.0)));
        out.extend((0..detractors).map(|_| make(2.0)));
        out
    }

    fn two_branch_dataset() -> Dataset {
        // A: 70 records, NPS 50. B: 30 records, NPS 10.
        let mut records = branch_records("A", 42, 21, 7);
        records.extend(branch_records("B", 9, 15, 6));
        Dataset::new(records, false, false)
    }

    #[test]
    fn test_low_branch_triggers_deviation() {
        let dataset = two_branch_dataset();
        let view = dataset.view(&ViewFilter::all());

        let alerts = detect_alerts(&view, 36.8, &AlertThresholds::default());

        assert_eq!(alerts.deviations.len(), 1);
        let alert = &alerts.deviations[0];
        assert_eq!(alert.segment, "B");
        assert_eq!(alert.category(), AlertCategory::SegmentDeviation);
        assert!((alert.weight_pct - 30.0).abs() < 1e-9);
        match alert.measure {
            AlertMeasure::SegmentDeviation { nps, reference_nps } => {
                assert!((nps - 10.0).abs() < 1e-9);
                assert_eq!(reference_nps, 36.8);
            }
            AlertMeasure::BrandGap { .. } => panic!("wrong alert category"),
        }
        assert_eq!(alert.message, "B: NPS 10 | impact 30.0% of volume");
    }

    #[test]
    fn test_no_alerts_when_everything_is_close() {
        let dataset = two_branch_dataset();
        let view = dataset.view(&ViewFilter::all());

        // identical brand and dealer scores, and B stays within 10 points of 15
        let alerts = detect_alerts(&view, 15.0, &AlertThresholds::default());

        assert!(alerts.is_empty());
        assert_eq!(alerts.len(), 0);
    }

    #[test]
    fn test_brand_gap_uses_strict_threshold() {
        let make = |brand: f64, dealer: f64| SurveyRecord {
            dealership: Some("Gap Motors".to_string()),
            brand_score: Some(brand),
            dealer_score: Some(dealer),
            ..Default::default()
        };
        // brand NPS 100, dealer NPS 80 -> gap 20
        let mut records: Vec<SurveyRecord> = (0..4).map(|_| make(10.0, 10.0)).collect();
        records.push(make(10.0, 8.0));
        let dataset = Dataset::new(records, false, false);
        let view = dataset.view(&ViewFilter::all());

        let gaps = brand_gaps(&view, &AlertThresholds::default());
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].category(), AlertCategory::BrandGap);
        assert_eq!(
            gaps[0].message,
            "Gap Motors: gap of 20 pts (brand 100 vs dealer 80) | weight 100.0%"
        );

        let lenient = AlertThresholds {
            gap_threshold_points: 20.0,
            ..AlertThresholds::default()
        };
        assert!(brand_gaps(&view, &lenient).is_empty());
    }

    #[test]
    fn test_small_segments_are_ignored() {
        // 1 detractor-only branch in 40 records holds 2.5% < 5%.
        let mut records = branch_records("Big", 39, 0, 0);
        records.extend(branch_records("Tiny", 0, 0, 1));
        let dataset = Dataset::new(records, false, false);
        let view = dataset.view(&ViewFilter::all());

        let alerts = detect_alerts(&view, 90.0, &AlertThresholds::default());
        assert!(alerts.deviations.is_empty());
    }

    #[test]
    fn test_segment_can_appear_in_both_rules() {
        let make = |brand: f64, dealer: f64| SurveyRecord {
            branch: Some("East".to_string()),
            dealership: Some("East Cars".to_string()),
            brand_score: Some(brand),
            dealer_score: Some(dealer),
            ..Default::default()
        };
        let records: Vec<SurveyRecord> = (0..10).map(|_| make(10.0, 1.0)).collect();
        let dataset = Dataset::new(records, false, false);
        let view = dataset.view(&ViewFilter::all());

        let alerts = detect_alerts(&view, 0.0, &AlertThresholds::default());
        assert_eq!(alerts.deviations.len(), 1);
        assert_eq!(alerts.gaps.len(), 1);
    }

    #[test]
    fn test_alerts_follow_segment_value_order() {
        let make = |name: &str, score: f64| SurveyRecord {
            branch: Some(name.to_string()),
            dealership: Some(name.to_string()),
            brand_score: Some(score),
            dealer_score: Some(score),
            ..Default::default()
        };
        let mut records = Vec::new();
        for (name, score) in [("Zeta", 2.0), ("Alpha", 2.0), ("Mid", 10.0)] {
            records.extend((0..3).map(|_| make(name, score)));
        }
        let dataset = Dataset::new(records, false, false);
        let view = dataset.view(&ViewFilter::all());

        let alerts = detect_alerts(&view, 100.0, &AlertThresholds::default());

        let order: Vec<&str> = alerts.deviations.iter().map(|a| a.segment.as_str()).collect();
        assert_eq!(order, vec!["Alpha", "Zeta"]);
        assert!(alerts.gaps.is_empty());
    }

    #[test]
    fn test_empty_view_has_no_alerts() {
        let dataset = Dataset::default();
        let view = dataset.view(&ViewFilter::all());
        assert!(detect_alerts(&view, 0.0, &AlertThresholds::default()).is_empty());
    }
}
