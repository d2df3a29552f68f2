use crate::analyzers::classify::{ScoreClass, classify};
use crate::analyzers::types::NpsSummary;
use crate::dataset::{ScoreField, SurveyRecord};

impl NpsSummary {
    /// Counts each tier over raw scores and derives the score.
    ///
    /// An empty or all-missing input yields a score of exactly 0.
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut s = NpsSummary::default();

        for score in scores {
            match classify(score) {
                ScoreClass::Promoter => s.promoters += 1,
                ScoreClass::Passive => s.passives += 1,
                ScoreClass::Detractor => s.detractors += 1,
                ScoreClass::Invalid => continue,
            }
            s.total += 1;
        }

        s.score = if s.total == 0 {
            0.0
        } else {
            (s.promoters as f64 - s.detractors as f64) / s.total as f64 * 100.0
        };

        s
    }
}

/// NPS of `field` over any subset of records.
pub fn nps_summary<'a, I>(records: I, field: ScoreField) -> NpsSummary
where
    I: IntoIterator<Item = &'a SurveyRecord>,
{
    NpsSummary::from_scores(records.into_iter().map(|r| r.score(field)))
}
