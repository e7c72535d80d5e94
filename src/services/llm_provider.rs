use std::time::Duration;

use futures::future::BoxFuture;
use serde::Deserialize;
use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

use crate::services::recommendation::{AdviceClient, AdviceError, AdviceRequest};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const MAX_RETRIES: usize = 2;
const BASE_BACKOFF_MS: u64 = 200;

const ADVICE_SYSTEM_PROMPT: &str = "You are a study coach for a tutoring app. \
Given a learner's aggregate quiz statistics for one subject, reply with exactly \
three short, actionable recommendations as a numbered list (1. 2. 3.). \
No preamble, no closing remarks.";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("empty response")]
    EmptyChoices,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Debug, Deserialize)]
struct ChatMessageBody {
    content: String,
}

/// OpenAI-compatible chat client for the recommendation collaborator.
#[derive(Clone)]
pub struct LlmClient {
    api_key: Option<String>,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl LlmClient {
    pub fn from_env() -> Self {
        let api_key = env_string("LLM_API_KEY");
        let model = env_string("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let endpoint = env_string("LLM_API_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();
        let timeout_ms = env_string("LLM_TIMEOUT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key,
            model,
            endpoint,
            client,
        }
    }

    pub fn is_available(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }

    pub async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(LlmError::NotConfigured("LLM_API_KEY"))?;

        let url = format!("{}/chat/completions", self.endpoint);
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "stream": false
        });

        let mut last_error = LlmError::EmptyChoices;

        for retry in 0..=MAX_RETRIES {
            let result = self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .json(&payload)
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    let parsed: ChatResponse = resp.json().await?;
                    return parsed
                        .choices
                        .into_iter()
                        .next()
                        .map(|c| c.message.content)
                        .ok_or(LlmError::EmptyChoices);
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    last_error = LlmError::HttpStatus { status, body };
                    if retry == MAX_RETRIES || !is_retryable(status) {
                        return Err(last_error);
                    }
                }
                Err(err) => {
                    last_error = LlmError::Request(err);
                    if retry == MAX_RETRIES {
                        return Err(last_error);
                    }
                }
            }

            let backoff = Duration::from_millis(BASE_BACKOFF_MS * (1 << retry));
            warn!(retry, "LLM request failed, retrying");
            sleep(backoff).await;
        }

        Err(last_error)
    }
}

impl AdviceClient for LlmClient {
    fn generate<'a>(
        &'a self,
        request: &'a AdviceRequest,
    ) -> BoxFuture<'a, Result<String, AdviceError>> {
        Box::pin(async move {
            if !self.is_available() {
                return Err(AdviceError::NotConfigured);
            }

            let user_prompt = format!(
                "Subject: {}\nAverage score: {:.1}\nQuizzes taken: {}\nTotal study time: {} minutes",
                request.subject_name,
                request.average_score,
                request.total_quizzes,
                request.total_minutes
            );

            self.complete(ADVICE_SYSTEM_PROMPT, &user_prompt)
                .await
                .map_err(|e| AdviceError::Provider(e.to_string()))
        })
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}
