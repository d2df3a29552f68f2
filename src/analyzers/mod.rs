//! The analytics core: score classification, NPS, segments, alerts and trend.
//!
//! Every function here is pure and synchronous. A pass takes a
//! [`DatasetView`](crate::dataset::DatasetView) and explicit policy, and
//! [`analyzer::analyze`] assembles the results into an
//! [`AnalysisReport`](types::AnalysisReport).

pub mod analyzer;
pub mod anomaly;
pub mod classify;
pub mod nps;
pub mod segment;
pub mod trend;
pub mod types;
pub mod utility;
