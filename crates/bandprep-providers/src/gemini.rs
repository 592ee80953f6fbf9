//! Gemini API provider for explanation generation.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bandprep_core::error::ProviderError;
use bandprep_core::explain::build_prompt;
use bandprep_core::traits::{ExplainRequest, ExplainResponse, ExplanationProvider};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
// Explanations are fetched one at a time; a hung request would stall every
// question behind it, so the timeout is short.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Gemini `generateContent` client.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    model: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: &str, base_url: Option<String>, model: Option<String>) -> Self {
        Self::with_timeout(api_key, base_url, model, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(
        api_key: &str,
        base_url: Option<String>,
        model: Option<String>,
        timeout_secs: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_secs,
            client,
        }
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[async_trait]
impl ExplanationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(question = request.question_id))]
    async fn explain(&self, request: &ExplainRequest) -> anyhow::Result<ExplainResponse> {
        let start = Instant::now();

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: build_prompt(request) }],
            }],
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout_secs)
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited { retry_after_ms: retry_after }.into());
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(self.model.clone()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::ApiError { status, message }.into());
        }

        let api_response: GeminiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        let raw_text = api_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| ProviderError::ApiError {
                status: 0,
                message: "response carried no candidate text".into(),
            })?;

        Ok(ExplainResponse {
            raw_text,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_request() -> ExplainRequest {
        ExplainRequest {
            question_id: 1,
            question: "Some physical evidence of Uruk still exists in Iraq.".into(),
            passage_excerpt: "enough remains to show that this first experiment".into(),
            correct_answer: "TRUE".into(),
            user_answer: "TRUE".into(),
            is_correct: true,
            target_language: "Vietnamese".into(),
        }
    }

    #[tokio::test]
    async fn successful_generation() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "{\"keywords\": [], \"explanation\": \"ok\", \"keysentence\": \"k\", \"reasoning\": []}"}]
                }
            }]
        });

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("test-key", Some(server.uri()), None);
        let response = provider.explain(&make_request()).await.unwrap();
        assert!(response.raw_text.contains("keysentence"));
    }

    #[tokio::test]
    async fn authentication_failure_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("bad-key", Some(server.uri()), None);
        let err = provider.explain(&make_request()).await.unwrap_err();
        assert!(err.to_string().contains("authentication"));
        let pe = err.downcast_ref::<ProviderError>().unwrap();
        assert!(pe.is_permanent());
    }

    #[tokio::test]
    async fn rate_limiting_carries_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("test-key", Some(server.uri()), None);
        let err = provider.explain(&make_request()).await.unwrap_err();
        let pe = err.downcast_ref::<ProviderError>().unwrap();
        assert_eq!(pe.retry_after_ms(), Some(7000));
    }

    #[tokio::test]
    async fn empty_candidates_is_an_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("test-key", Some(server.uri()), None);
        let err = provider.explain(&make_request()).await.unwrap_err();
        assert!(err.to_string().contains("no candidate text"));
    }

    #[tokio::test]
    async fn server_error_message_is_extracted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": {"message": "backend unavailable"}
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("test-key", Some(server.uri()), None);
        let err = provider.explain(&make_request()).await.unwrap_err();
        assert!(err.to_string().contains("backend unavailable"));
    }
}
