//! Text-completion backends used to classify document excerpts.
//!
//! Classification is optional; when no provider is configured the pipeline still chunks and
//! template-matches documents but leaves their metadata untouched. The Ollama client talks to the
//! runtime's `/api/generate` endpoint directly over HTTP.

use crate::config::{Config, LlmProvider};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by completion providers.
#[derive(Debug, Error)]
pub enum CompletionClientError {
    /// Provider was explicitly disabled or unreachable.
    #[error("Completion provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate completion: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Request payload passed to a completion provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier understood by the provider.
    pub model: String,
    /// System instructions, sent separately when the provider supports it.
    pub system: Option<String>,
    /// User prompt.
    pub prompt: String,
}

/// Interface implemented by completion providers.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Return the model's answer to `request`, trimmed of surrounding whitespace.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionClientError>;
}

/// Build a completion client based on configuration.
///
/// Returns `Ok(None)` when classification is disabled.
pub fn get_completion_client(
    config: &Config,
) -> Result<Option<Box<dyn CompletionClient + Send + Sync>>, CompletionClientError> {
    match config.llm_provider {
        LlmProvider::None => Ok(None),
        LlmProvider::Ollama => {
            let client = OllamaCompletionClient::new(config.ollama_url.clone())?;
            Ok(Some(Box::new(client)))
        }
    }
}

/// Completion client backed by a local Ollama runtime.
pub struct OllamaCompletionClient {
    http: Client,
    base_url: String,
}

impl OllamaCompletionClient {
    /// Create a client for the Ollama instance at `base_url`.
    pub fn new(base_url: String) -> Result<Self, CompletionClientError> {
        let http = Client::builder()
            .user_agent("doctriage/classify")
            .build()
            .map_err(|error| {
                CompletionClientError::ProviderUnavailable(format!(
                    "failed to construct HTTP client: {error}"
                ))
            })?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl CompletionClient for OllamaCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionClientError> {
        let mut payload = json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
            "format": "json",
            "options": {
                "temperature": 0.0,
            }
        });
        if let Some(system) = request.system {
            payload["system"] = json!(system);
        }

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                CompletionClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CompletionClientError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            CompletionClientError::InvalidResponse(format!(
                "failed to decode Ollama response: {error}"
            ))
        })?;

        if !body.done {
            return Err(CompletionClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "llama3".into(),
            system: Some("Answer in JSON".into()),
            prompt: "Classify this".into(),
        }
    }

    #[tokio::test]
    async fn ollama_client_returns_trimmed_response() {
        let server = MockServer::start_async().await;
        let client = OllamaCompletionClient::new(server.base_url()).expect("client");

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate").json_body_partial(
                    r#"{"model": "llama3", "stream": false, "system": "Answer in JSON"}"#,
                );
                then.status(200).json_body(json!({
                    "response": "  {\"category\": \"SOW\"}\n",
                    "done": true
                }));
            })
            .await;

        let answer = client.complete(request()).await.expect("completion");

        mock.assert_async().await;
        assert_eq!(answer, "{\"category\": \"SOW\"}");
    }

    #[tokio::test]
    async fn ollama_client_reports_error_status() {
        let server = MockServer::start_async().await;
        let client = OllamaCompletionClient::new(server.base_url()).expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = client.complete(request()).await.expect_err("error response");
        assert!(matches!(
            error,
            CompletionClientError::GenerationFailed(ref message) if message.contains("500")
        ));
    }

    #[tokio::test]
    async fn ollama_client_treats_missing_endpoint_as_unavailable() {
        let server = MockServer::start_async().await;
        let client =
            OllamaCompletionClient::new(format!("{}/", server.base_url())).expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(404);
            })
            .await;

        let error = client.complete(request()).await.expect_err("404");
        assert!(matches!(error, CompletionClientError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn ollama_client_rejects_incomplete_response() {
        let server = MockServer::start_async().await;
        let client = OllamaCompletionClient::new(server.base_url()).expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200)
                    .json_body(json!({ "response": "{", "done": false }));
            })
            .await;

        let error = client.complete(request()).await.expect_err("incomplete");
        assert!(matches!(error, CompletionClientError::InvalidResponse(_)));
    }

    #[test]
    fn disabled_provider_builds_no_client() {
        let config = Config::default();
        assert!(get_completion_client(&config).expect("build").is_none());
    }

    #[test]
    fn ollama_provider_builds_client() {
        let config = Config {
            llm_provider: LlmProvider::Ollama,
            ..Config::default()
        };
        assert!(get_completion_client(&config).expect("build").is_some());
    }
}
