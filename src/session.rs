//! Interactive session state: the loaded survey export and the current selection.
//!
//! The analytics core never reads this; each pass receives the view and
//! policy it needs as arguments.

use tracing::{info, warn};

use crate::analyzers::analyzer::analyze;
use crate::analyzers::types::{AnalysisReport, Module};
use crate::config::AnalysisConfig;
use crate::dataset::{Dataset, DatasetView, ViewFilter};
use crate::insight::{GeminiClient, InsightProvider, TopicSummary, qualitative_insight};

#[derive(Debug, Default)]
pub struct Session {
    dataset: Option<Dataset>,
    api_key: Option<String>,
    filter: ViewFilter,
    module: Module,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previously loaded dataset and clears the brand filter.
    pub fn load(&mut self, dataset: Dataset) {
        info!(records = dataset.len(), "Dataset loaded into session");
        self.dataset = Some(dataset);
        self.filter = ViewFilter::all();
    }

    /// Drops the dataset, key and selection.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn set_api_key(&mut self, key: Option<String>) {
        self.api_key = key.filter(|k| !k.trim().is_empty());
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Selects a brand; `None` or `"all"` (any case) selects every brand.
    pub fn select_brand(&mut self, brand: Option<&str>) {
        self.filter = match brand {
            Some(b) if !b.eq_ignore_ascii_case("all") => ViewFilter::brand(b),
            _ => ViewFilter::all(),
        };
    }

    pub fn select_module(&mut self, module: Module) {
        self.module = module;
    }

    pub fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    pub fn view(&self) -> Option<DatasetView<'_>> {
        self.dataset.as_ref().map(|d| d.view(&self.filter))
    }

    /// Recomputes the whole report for the current selection.
    pub fn run(&self, config: &AnalysisConfig) -> Option<AnalysisReport> {
        let view = self.view()?;
        Some(analyze(&view, self.module, self.filter.brand.as_deref(), config))
    }

    /// Asks `provider` about the comments of the current selection.
    ///
    /// Without an API key in the session the provider is never called.
    pub async fn insights(
        &self,
        provider: &dyn InsightProvider,
        config: &AnalysisConfig,
    ) -> Option<TopicSummary> {
        if self.api_key.is_none() {
            info!("No API key in session, qualitative insight skipped");
            return None;
        }
        let comments = self.view()?.comments();
        qualitative_insight(provider, &comments, config.comment_limit).await
    }

    /// Runs [`Session::insights`] against Gemini with the session's API key.
    pub async fn gemini_insights(&self, config: &AnalysisConfig) -> Option<TopicSummary> {
        let key = self.api_key()?;
        let client = match GeminiClient::with_env_model(key) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Gemini client unavailable");
                return None;
            }
        };
        self.insights(&client, config).await
    }
}
