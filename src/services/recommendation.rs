use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::services::llm_provider::LlmClient;

const DEFAULT_ADVICE_TIMEOUT_MS: u64 = 10_000;
const MAX_RECOMMENDATIONS: usize = 3;

/// Structured stats sent to the text-generation collaborator. The engine
/// never interprets the collaborator's prose beyond line extraction.
#[derive(Debug, Clone)]
pub struct AdviceRequest {
    pub subject_name: String,
    pub average_score: f64,
    pub total_quizzes: i64,
    pub total_minutes: i64,
}

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("advice provider not configured")]
    NotConfigured,
    #[error("advice provider failed: {0}")]
    Provider(String),
}

/// Injected capability for generating free-text study advice, so tests can
/// substitute a deterministic mock for the hosted LLM.
pub trait AdviceClient: Send + Sync {
    fn generate<'a>(
        &'a self,
        request: &'a AdviceRequest,
    ) -> BoxFuture<'a, Result<String, AdviceError>>;
}

#[derive(Clone)]
pub struct RecommendationAssembler {
    client: Arc<dyn AdviceClient>,
    timeout: Duration,
}

impl RecommendationAssembler {
    pub fn new(client: Arc<dyn AdviceClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn from_env() -> Self {
        let timeout_ms = std::env::var("ADVICE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_ADVICE_TIMEOUT_MS);

        Self::new(
            Arc::new(LlmClient::from_env()),
            Duration::from_millis(timeout_ms),
        )
    }

    /// Produces at most three recommendation strings. Collaborator errors,
    /// timeouts, and unparseable replies all degrade to the fixed fallback
    /// list; this path never fails.
    pub async fn assemble(&self, request: &AdviceRequest) -> Vec<String> {
        let reply = tokio::time::timeout(self.timeout, self.client.generate(request)).await;

        match reply {
            Ok(Ok(text)) => {
                let lines = parse_advice_lines(&text);
                if lines.is_empty() {
                    tracing::warn!(
                        subject = %request.subject_name,
                        "advice reply had no usable lines, using fallback"
                    );
                    fallback_recommendations()
                } else {
                    lines
                }
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "advice provider failed, using fallback");
                fallback_recommendations()
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "advice provider timed out, using fallback"
                );
                fallback_recommendations()
            }
        }
    }
}

/// Extracts enumerated ("1. ...") or dashed ("- ...") lines from free text,
/// stripping the marker, first three kept.
pub fn parse_advice_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .take(MAX_RECOMMENDATIONS)
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim();

    if let Some(rest) = trimmed.strip_prefix('-') {
        return Some(rest.trim());
    }

    let (head, rest) = trimmed.split_once('.')?;
    if !head.is_empty() && head.chars().all(|c| c.is_ascii_digit()) {
        Some(rest.trim())
    } else {
        None
    }
}

pub fn fallback_recommendations() -> Vec<String> {
    vec![
        "Review the quizzes you scored lowest on and retry them after a short break.".to_string(),
        "Study in short daily sessions to keep your streak going.".to_string(),
        "Mix easier and harder quizzes to reinforce fundamentals while stretching yourself."
            .to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedClient(Result<String, ()>);

    impl AdviceClient for CannedClient {
        fn generate<'a>(
            &'a self,
            _request: &'a AdviceRequest,
        ) -> BoxFuture<'a, Result<String, AdviceError>> {
            Box::pin(async move {
                match &self.0 {
                    Ok(text) => Ok(text.clone()),
                    Err(()) => Err(AdviceError::Provider("boom".into())),
                }
            })
        }
    }

    struct HangingClient;

    impl AdviceClient for HangingClient {
        fn generate<'a>(
            &'a self,
            _request: &'a AdviceRequest,
        ) -> BoxFuture<'a, Result<String, AdviceError>> {
            Box::pin(async {
                std::future::pending::<()>().await;
                unreachable!()
            })
        }
    }

    fn request() -> AdviceRequest {
        AdviceRequest {
            subject_name: "Math".into(),
            average_score: 73.5,
            total_quizzes: 12,
            total_minutes: 90,
        }
    }

    #[test]
    fn parses_numbered_lines() {
        let lines = parse_advice_lines("1. Do flashcards\n2. Sleep well\n3. Practice daily");
        assert_eq!(lines, vec!["Do flashcards", "Sleep well", "Practice daily"]);
    }

    #[test]
    fn parses_dashed_lines_and_ignores_prose() {
        let text = "Here is some advice:\n- Review mistakes\nkeep going\n- Take breaks";
        assert_eq!(
            parse_advice_lines(text),
            vec!["Review mistakes", "Take breaks"]
        );
    }

    #[test]
    fn truncates_to_three_lines() {
        let text = "1. a\n2. b\n3. c\n4. d\n5. e";
        assert_eq!(parse_advice_lines(text).len(), 3);
    }

    #[test]
    fn prose_with_no_markers_yields_nothing() {
        assert!(parse_advice_lines("Just study harder in general.").is_empty());
    }

    #[tokio::test]
    async fn provider_error_yields_fallback() {
        let assembler = RecommendationAssembler::new(
            Arc::new(CannedClient(Err(()))),
            Duration::from_millis(100),
        );
        let result = assembler.assemble(&request()).await;
        assert_eq!(result, fallback_recommendations());
    }

    #[tokio::test]
    async fn unusable_reply_yields_fallback() {
        let assembler = RecommendationAssembler::new(
            Arc::new(CannedClient(Ok("no list here".into()))),
            Duration::from_millis(100),
        );
        let result = assembler.assemble(&request()).await;
        assert_eq!(result, fallback_recommendations());
    }

    #[tokio::test]
    async fn timeout_yields_fallback() {
        let assembler =
            RecommendationAssembler::new(Arc::new(HangingClient), Duration::from_millis(20));
        let result = assembler.assemble(&request()).await;
        assert_eq!(result, fallback_recommendations());
    }

    #[tokio::test]
    async fn good_reply_is_parsed() {
        let assembler = RecommendationAssembler::new(
            Arc::new(CannedClient(Ok("1. First tip\n2. Second tip".into()))),
            Duration::from_millis(100),
        );
        let result = assembler.assemble(&request()).await;
        assert_eq!(result, vec!["First tip", "Second tip"]);
    }
}
