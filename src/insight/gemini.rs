use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{InsightError, InsightProvider, TopicSummary, build_prompt};
use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient, json_post};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini `generateContent` client.
pub struct GeminiClient<C = ApiKey<BasicClient>> {
    http: C,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Authenticated client for `model` using the public endpoint.
    pub fn new(api_key: &str, model: &str) -> Result<Self, InsightError> {
        if api_key.trim().is_empty() {
            return Err(InsightError::MissingCredentials);
        }
        let basic = BasicClient::new().map_err(|e| InsightError::Config(e.to_string()))?;
        let http = ApiKey::header(basic, "x-goog-api-key", api_key.trim())
            .map_err(|e| InsightError::Config(e.to_string()))?;
        Ok(Self::with_client(http, DEFAULT_BASE_URL, model))
    }

    /// Client for `api_key` using the model named by `GEMINI_MODEL`.
    pub fn with_env_model(api_key: &str) -> Result<Self, InsightError> {
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(api_key, &model)
    }

    /// Reads `GEMINI_API_KEY`, falling back to `API_KEY`.
    pub fn api_key_from_env() -> Option<String> {
        std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
    }
}

impl<C: HttpClient> GeminiClient<C> {
    pub fn with_client(http: C, base_url: &str, model: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateRequest {
    fn for_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        }
    }
}

/// Removes a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Decodes the model output into a [`TopicSummary`].
pub(crate) fn parse_topic_summary(text: &str) -> Result<TopicSummary, InsightError> {
    serde_json::from_str(strip_code_fence(text)).map_err(|e| InsightError::Malformed(e.to_string()))
}

/// Decodes a raw `generateContent` response body.
fn parse_response(body: &str) -> Result<TopicSummary, InsightError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| InsightError::Malformed(e.to_string()))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .ok_or_else(|| InsightError::Malformed("response has no candidates".to_string()))?;

    parse_topic_summary(&text)
}

#[async_trait::async_trait]
impl<C: HttpClient> InsightProvider for GeminiClient<C> {
    async fn summarize(&self, comments: &[String]) -> Result<TopicSummary, InsightError> {
        let body = GenerateRequest::for_prompt(build_prompt(comments));
        let req = json_post(&self.endpoint(), &body)
            .map_err(|e| InsightError::Config(e.to_string()))?;

        debug!(model = %self.model, comments = comments.len(), "Sending generateContent request");
        let response = self.http.execute(req).await?;

        let status = response.status();
        let text = response.text().await?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(InsightError::RateLimited);
        }
        if !status.is_success() {
            return Err(InsightError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY_JSON: &str = r#"{
        "satisfaction_topics": [{"topic": "Delivery", "count": 12, "keywords": ["fast"]}],
        "dissatisfaction_topics": [{"topic": "Waiting time", "count": 5}],
        "summary": "Fast delivery. Long waits in the workshop."
    }"#;

    #[test]
    fn test_parse_plain_json() {
        let summary = parse_topic_summary(SUMMARY_JSON).unwrap();
        assert_eq!(summary.satisfaction_topics[0].topic, "Delivery");
        assert_eq!(summary.satisfaction_topics[0].count, 12);
        assert!(summary.dissatisfaction_topics[0].keywords.is_empty());
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("```json\n{SUMMARY_JSON}\n```");
        let summary = parse_topic_summary(&fenced).unwrap();
        assert_eq!(summary.dissatisfaction_topics[0].count, 5);
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let err = parse_topic_summary("Sorry, I cannot help").unwrap_err();
        assert!(matches!(err, InsightError::Malformed(_)));
    }

    #[test]
    fn test_parse_response_envelope() {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": SUMMARY_JSON }] } }]
        })
        .to_string();

        let summary = parse_response(&body).unwrap();
        assert_eq!(summary.summary, "Fast delivery. Long waits in the workshop.");
    }

    #[test]
    fn test_parse_response_without_candidates() {
        let err = parse_response(r#"{"candidates": []}"#).unwrap_err();
        assert!(matches!(err, InsightError::Malformed(_)));
    }

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(GenerateRequest::for_prompt("hi".to_string())).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_missing_key_is_rejected() {
        assert!(matches!(
            GeminiClient::new("  ", "gemini-1.5-flash"),
            Err(InsightError::MissingCredentials)
        ));
    }

    #[test]
    fn test_endpoint_includes_model() {
        let http = BasicClient::new().unwrap();
        let client = GeminiClient::with_client(http, "https://example.com/", "m-1");
        assert_eq!(client.endpoint(), "https://example.com/v1beta/models/m-1:generateContent");
    }
}
