//! Qualitative analysis of free-text comments by a language model.
//!
//! [`InsightProvider`] is the seam to the model; [`GeminiClient`] is the
//! production implementation. [`qualitative_insight`] is the only entry point
//! the rest of the crate uses: it caps the request size, makes a single
//! attempt and turns every failure into `None`.

mod gemini;

pub use gemini::GeminiClient;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// A recurring theme in the comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub topic: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Structured result of a comment analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSummary {
    #[serde(default)]
    pub satisfaction_topics: Vec<Topic>,
    #[serde(default)]
    pub dissatisfaction_topics: Vec<Topic>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("no API key configured")]
    MissingCredentials,

    #[error("invalid client configuration: {0}")]
    Config(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl InsightError {
    /// Whether a later user-triggered attempt could succeed unchanged.
    pub fn is_transient(&self) -> bool {
        match self {
            InsightError::RateLimited | InsightError::Transport(_) => true,
            InsightError::Status { status, .. } => *status >= 500,
            InsightError::MissingCredentials
            | InsightError::Config(_)
            | InsightError::Malformed(_) => false,
        }
    }
}

/// A service that extracts topics from comments.
#[async_trait::async_trait]
pub trait InsightProvider: Send + Sync {
    /// Summarizes `comments` into satisfaction and dissatisfaction topics.
    ///
    /// # Errors
    ///
    /// Returns [`InsightError`] on any transport, status or decoding failure.
    async fn summarize(&self, comments: &[String]) -> Result<TopicSummary, InsightError>;
}

/// Prompt sent along with the comments.
pub fn build_prompt(comments: &[String]) -> String {
    format!(
        "Act as an automotive customer-experience expert. Analyze these customer comments:\n\
         {}\n\n\
         Return JSON with:\n\
         - satisfaction_topics: list of {{topic, count, keywords}}\n\
         - dissatisfaction_topics: list of {{topic, count, keywords}}\n\
         - summary: 2 sentences max.",
        comments.join("\n")
    )
}

/// Runs one analysis of at most `limit` comments.
///
/// Returns `None` without calling the provider when there is nothing to
/// analyze, and `None` after logging when the provider fails.
#[tracing::instrument(skip_all, fields(comments = comments.len(), limit = limit))]
pub async fn qualitative_insight(
    provider: &dyn InsightProvider,
    comments: &[String],
    limit: usize,
) -> Option<TopicSummary> {
    let batch = &comments[..comments.len().min(limit)];
    if batch.is_empty() {
        info!("No comments to analyze");
        return None;
    }

    match provider.summarize(batch).await {
        Ok(summary) => {
            info!(
                satisfaction = summary.satisfaction_topics.len(),
                dissatisfaction = summary.dissatisfaction_topics.len(),
                "Qualitative insight received"
            );
            Some(summary)
        }
        Err(e) => {
            warn!(error = %e, transient = e.is_transient(), "Qualitative insight unavailable");
            None
        }
    }
}
