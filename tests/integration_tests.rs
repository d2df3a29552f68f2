use std::sync::Mutex;

use chrono::NaiveDate;
use nps_pulse::analyzers::types::{AlertCategory, Module};
use nps_pulse::config::AnalysisConfig;
use nps_pulse::dataset::Dataset;
use nps_pulse::insight::{InsightError, InsightProvider, TopicSummary};
use nps_pulse::output::render_text;
use nps_pulse::parser::parse_survey_csv;
use nps_pulse::session::Session;

const SAMPLE: &str = include_str!("fixtures/survey_sample.csv");

fn load_sample(config: &AnalysisConfig) -> Dataset {
    parse_survey_csv(SAMPLE.as_bytes(), &config.columns).expect("Failed to parse sample export")
}

fn month(m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, 1).unwrap()
}

#[test]
fn test_full_pipeline() {
    let config = AnalysisConfig::default();
    let mut session = Session::new();
    session.load(load_sample(&config));

    let report = session.run(&config).expect("dataset is loaded");

    assert_eq!(report.record_count, 22);
    assert!((report.brand_nps.score - 80.0).abs() < 1e-9);
    assert_eq!(report.brand_nps.total, 20);
    assert!((report.dealer_nps.score - 20.0).abs() < 1e-9);

    let deviations: Vec<_> = report
        .alerts
        .deviations
        .iter()
        .map(|a| a.segment.as_str())
        .collect();
    assert_eq!(deviations, vec!["Centro", "Sur"]);
    let gaps: Vec<_> = report.alerts.gaps.iter().map(|a| a.segment.as_str()).collect();
    assert_eq!(gaps, vec!["Kia Sur"]);
    assert_eq!(report.alerts.gaps[0].category(), AlertCategory::BrandGap);
    assert!((report.alerts.gaps[0].weight_pct - 600.0 / 22.0).abs() < 1e-9);

    let dealerships: Vec<_> = report.dealerships.iter().map(|d| d.segment.as_str()).collect();
    assert_eq!(dealerships, vec!["Chery Centro", "Kia Norte", "Kia Sur"]);
    let weight: f64 = report.dealerships.iter().map(|d| d.weight).sum();
    assert!((weight - 1.0).abs() < 1e-9);
}

#[test]
fn test_trend_skips_months_without_valid_scores() {
    let config = AnalysisConfig::default();
    let dataset = load_sample(&config);
    let mut session = Session::new();
    session.load(dataset);

    let trend = session.run(&config).unwrap().trend.expect("export has a date column");

    let periods: Vec<_> = trend.iter().map(|p| p.period).collect();
    assert_eq!(periods, vec![month(1), month(2), month(3)]);
    assert_eq!(trend[0].nps.total, 7);
    assert_eq!(trend[1].nps.total, 7);
    assert!((trend[2].score - 100.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_brand_filter() {
    let config = AnalysisConfig::default();
    let mut session = Session::new();
    session.load(load_sample(&config));
    session.select_brand(Some("Kia"));
    session.select_module(Module::AfterSales);

    let report = session.run(&config).unwrap();

    assert_eq!(report.record_count, 16);
    assert!((report.dealer_nps.score - 25.0).abs() < 1e-9);
    assert_eq!(report.alerts.deviations.len(), 1);
    assert_eq!(report.alerts.deviations[0].segment, "Sur");
    assert!(report.dealerships.iter().all(|d| d.segment.starts_with("Kia")));
    assert_eq!(report.trend.map(|t| t.len()), Some(3));

    let gate = config.thresholds.volume_threshold_fraction;
    let text = render_text(&session.run(&config).unwrap(), gate);
    assert!(text.contains("# CX dashboard: After-sales (Kia)"));
    assert!(text.contains("- Sur: NPS -100 | impact 37.5% of volume"));
}

#[test]
fn test_brands_listing() {
    let dataset = load_sample(&AnalysisConfig::default());
    assert_eq!(dataset.brands(), vec!["Chery".to_string(), "Kia".to_string()]);
    assert!(dataset.has_comment_column());
}

#[test]
fn test_stricter_volume_gate_silences_small_segments() {
    let mut config = AnalysisConfig::default();
    config.thresholds.volume_threshold_fraction = 0.3;
    let mut session = Session::new();
    session.load(load_sample(&config));

    let report = session.run(&config).unwrap();

    // only "Norte" (10 of 22) clears 30% and it is above the reference
    assert!(report.alerts.is_empty());
}

struct CountingProvider {
    batches: Mutex<Vec<usize>>,
}

#[async_trait::async_trait]
impl InsightProvider for CountingProvider {
    async fn summarize(&self, comments: &[String]) -> Result<TopicSummary, InsightError> {
        self.batches.lock().unwrap().push(comments.len());
        Ok(TopicSummary {
            summary: format!("{} comments", comments.len()),
            ..Default::default()
        })
    }
}

#[tokio::test]
async fn test_insights_use_comments_of_the_selection() {
    let config = AnalysisConfig::default();
    let provider = CountingProvider {
        batches: Mutex::new(Vec::new()),
    };
    let mut session = Session::new();
    session.load(load_sample(&config));
    session.set_api_key(Some("test-key".to_string()));

    let all = session.insights(&provider, &config).await.unwrap();
    assert_eq!(all.summary, "7 comments");

    session.select_brand(Some("Kia"));
    let kia = session.insights(&provider, &config).await.unwrap();
    assert_eq!(kia.summary, "5 comments");

    assert_eq!(*provider.batches.lock().unwrap(), vec![7, 5]);
}
