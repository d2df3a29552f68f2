use serde::Serialize;

/// Tier of a single recommendation score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreClass {
    Promoter,
    Passive,
    Detractor,
    /// Missing, non-numeric or non-finite. Excluded from every total.
    Invalid,
}

/// Classifies a score into its NPS tier.
///
/// | Range        | Class     |
/// |--------------|-----------|
/// | >= 9         | Promoter  |
/// | >= 7, < 9    | Passive   |
/// | < 7          | Detractor |
/// | missing/NaN  | Invalid   |
///
/// No range check is made: `-3` is a detractor and `12` a promoter.
pub fn classify(score: Option<f64>) -> ScoreClass {
    match score {
        Some(s) if !s.is_finite() => ScoreClass::Invalid,
        Some(s) if s >= 9.0 => ScoreClass::Promoter,
        Some(s) if s >= 7.0 => ScoreClass::Passive,
        Some(_) => ScoreClass::Detractor,
        None => ScoreClass::Invalid,
    }
}

/// Parses a raw cell into a score. Anything that is not a finite number is missing.
pub fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|s| s.is_finite())
}
