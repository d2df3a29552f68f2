//! Typed survey records and filtered read-only views over them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single survey row. Identity is its position in the [`Dataset`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub brand_score: Option<f64>,
    pub dealer_score: Option<f64>,
    pub brand: Option<String>,
    pub branch: Option<String>,
    pub dealership: Option<String>,
    pub date: Option<NaiveDate>,
    pub comment: Option<String>,
}

/// Which score column an aggregation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreField {
    /// Brand-level recommendation score.
    Brand,
    /// Dealer-level (CCS) recommendation score.
    Dealer,
}

impl ScoreField {
    pub fn label(self) -> &'static str {
        match self {
            ScoreField::Brand => "brand",
            ScoreField::Dealer => "dealer",
        }
    }
}

/// Categorical attribute a view can be partitioned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKey {
    Brand,
    Branch,
    Dealership,
}

impl SurveyRecord {
    pub fn score(&self, field: ScoreField) -> Option<f64> {
        match field {
            ScoreField::Brand => self.brand_score,
            ScoreField::Dealer => self.dealer_score,
        }
    }

    pub fn segment(&self, key: SegmentKey) -> Option<&str> {
        let value = match key {
            SegmentKey::Brand => self.brand.as_deref(),
            SegmentKey::Branch => self.branch.as_deref(),
            SegmentKey::Dealership => self.dealership.as_deref(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

/// Selection applied to a [`Dataset`] before an analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilter {
    /// `None` keeps every brand.
    pub brand: Option<String>,
}

impl ViewFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn brand(brand: impl Into<String>) -> Self {
        Self {
            brand: Some(brand.into()),
        }
    }

    fn accepts(&self, record: &SurveyRecord) -> bool {
        match &self.brand {
            Some(brand) => record.brand.as_deref() == Some(brand.as_str()),
            None => true,
        }
    }
}

/// The loaded survey export. Records never change after load.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SurveyRecord>,
    has_date_column: bool,
    has_comment_column: bool,
}

impl Dataset {
    pub fn new(
        records: Vec<SurveyRecord>,
        has_date_column: bool,
        has_comment_column: bool,
    ) -> Self {
        Self {
            records,
            has_date_column,
            has_comment_column,
        }
    }

    pub fn records(&self) -> &[SurveyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the source carried a date/period column at all.
    pub fn has_date_column(&self) -> bool {
        self.has_date_column
    }

    pub fn has_comment_column(&self) -> bool {
        self.has_comment_column
    }

    /// Distinct non-missing brands, sorted. These are the filter choices.
    pub fn brands(&self) -> Vec<String> {
        let mut brands: Vec<String> = self
            .records
            .iter()
            .filter_map(|r| r.segment(SegmentKey::Brand))
            .map(str::to_string)
            .collect();
        brands.sort();
        brands.dedup();
        brands
    }

    /// Builds a read-only projection borrowing the records that pass `filter`.
    pub fn view(&self, filter: &ViewFilter) -> DatasetView<'_> {
        DatasetView {
            records: self.records.iter().filter(|r| filter.accepts(r)).collect(),
            has_date_column: self.has_date_column,
        }
    }
}

/// A filtered projection of a [`Dataset`]. All aggregations run over a view.
#[derive(Debug, Clone)]
pub struct DatasetView<'a> {
    records: Vec<&'a SurveyRecord>,
    has_date_column: bool,
}

impl<'a> DatasetView<'a> {
    pub fn records(&self) -> &[&'a SurveyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_date_column(&self) -> bool {
        self.has_date_column
    }

    /// Non-empty comments in record order.
    pub fn comments(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| r.comment.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(brand: &str, comment: Option<&str>) -> SurveyRecord {
        SurveyRecord {
            brand: Some(brand.to_string()),
            comment: comment.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_view_filters_by_brand_without_touching_source() {
        let dataset = Dataset::new(
            vec![record("Kia", None), record("Hyundai", None), record("Kia", None)],
            false,
            false,
        );

        let view = dataset.view(&ViewFilter::brand("Kia"));

        assert_eq!(view.len(), 2);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.view(&ViewFilter::all()).len(), 3);
    }

    #[test]
    fn test_brands_are_sorted_and_distinct() {
        let mut blank = record("  ", None);
        blank.brand = Some("  ".to_string());
        let dataset = Dataset::new(
            vec![record("Kia", None), record("Chery", None), record("Kia", None), blank],
            false,
            false,
        );

        assert_eq!(dataset.brands(), vec!["Chery".to_string(), "Kia".to_string()]);
    }

    #[test]
    fn test_blank_segment_value_counts_as_missing() {
        let mut r = SurveyRecord::default();
        r.branch = Some("   ".to_string());
        assert_eq!(r.segment(SegmentKey::Branch), None);
    }

    #[test]
    fn test_comments_skip_blank_entries() {
        let dataset = Dataset::new(
            vec![
                record("Kia", Some(" great service ")),
                record("Kia", Some("")),
                record("Kia", None),
            ],
            false,
            true,
        );

        let comments = dataset.view(&ViewFilter::all()).comments();
        assert_eq!(comments, vec!["great service".to_string()]);
    }
}
