//! Advisory Requests
//!
//! Sends the analysis prompt to the configured provider and turns whatever
//! comes back into a well-formed `AnalysisResult`. Nothing here fails
//! outward: service errors, timeouts, cancellation and unreadable replies
//! all become a single synthetic error finding.

use std::sync::Arc;
use std::time::Duration;

use code_insight_core::CodeSubmission;
use code_insight_llm::{LlmError, LlmProvider, LlmResult, Message};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::parser::parse_advisory_text;
use super::prompt::{advisory_request_options, build_analysis_prompt};
use crate::models::analysis::{AnalysisResult, KIND_ANALYSIS_ERROR, KIND_PARSING};

/// Message used when the service produced no usable text
pub const NO_ANALYSIS_GENERATED: &str = "No analysis generated";

/// Advisory client, constructed once and shared by all analyses
#[derive(Clone)]
pub struct Advisor {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl Advisor {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Ask for advice on one submission
    pub async fn request_advice(
        &self,
        submission: &CodeSubmission,
        cancel: &CancellationToken,
    ) -> AnalysisResult {
        let filename = submission.filename();

        let text = match self.fetch_reply(submission, cancel).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                warn!(file = %filename, "advisory service returned no text");
                return AnalysisResult::single_error(KIND_ANALYSIS_ERROR, NO_ANALYSIS_GENERATED, filename);
            }
            Err(e @ (LlmError::Timeout { .. } | LlmError::Cancelled)) => {
                warn!(file = %filename, reason = %e, "advisory request abandoned");
                return AnalysisResult::single_error(KIND_ANALYSIS_ERROR, NO_ANALYSIS_GENERATED, filename);
            }
            Err(LlmError::ParseError { message }) => {
                warn!(file = %filename, error = %message, "advisory reply could not be decoded");
                return AnalysisResult::single_error(
                    KIND_PARSING,
                    format!("Failed to parse analysis response: {}", message),
                    filename,
                );
            }
            Err(e) => {
                warn!(file = %filename, error = %e, "advisory request failed");
                return AnalysisResult::single_error(KIND_ANALYSIS_ERROR, e.to_string(), filename);
            }
        };

        match parse_advisory_text(&text, filename) {
            Ok(parsed) => {
                debug!(
                    file = %filename,
                    errors = parsed.errors.len(),
                    suggestions = parsed.suggestions.len(),
                    "parsed advisory reply"
                );
                parsed.into()
            }
            Err(e) => {
                warn!(file = %filename, error = %e, "advisory reply parsing failed");
                AnalysisResult::single_error(KIND_PARSING, e.to_string(), filename)
            }
        }
    }

    /// Reply text, or None when the service generated nothing
    async fn fetch_reply(
        &self,
        submission: &CodeSubmission,
        cancel: &CancellationToken,
    ) -> LlmResult<Option<String>> {
        let prompt = build_analysis_prompt(submission);
        debug!(
            file = %submission.filename(),
            provider = self.provider.name(),
            prompt_len = prompt.len(),
            "sending advisory request"
        );

        let request = self.provider.send_message(
            vec![Message::user(prompt)],
            None,
            advisory_request_options(),
        );

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
            outcome = timeout(self.timeout, request) => match outcome {
                Ok(response) => response?,
                Err(_) => {
                    return Err(LlmError::Timeout {
                        seconds: self.timeout.as_secs(),
                    })
                }
            },
        };

        debug!(
            file = %submission.filename(),
            output_tokens = response.usage.output_tokens,
            "received advisory reply"
        );
        Ok(response.text().map(str::to_string))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use code_insight_core::Language;
    use code_insight_llm::{
        LlmRequestOptions, LlmResponse, ProviderConfig, StopReason, UsageStats,
    };

    use crate::models::analysis::Severity;

    /// What the mock provider does on `send_message`
    #[derive(Clone)]
    pub(crate) enum MockReply {
        Text(String),
        Empty,
        Fail(LlmError),
        Hang,
    }

    pub(crate) struct MockProvider {
        reply: MockReply,
        config: ProviderConfig,
    }

    impl MockProvider {
        pub(crate) fn new(reply: MockReply) -> Self {
            Self {
                reply,
                config: ProviderConfig::default(),
            }
        }

        pub(crate) fn text(text: &str) -> Arc<dyn LlmProvider> {
            Arc::new(Self::new(MockReply::Text(text.to_string())))
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }

        async fn send_message(
            &self,
            _messages: Vec<Message>,
            _system: Option<String>,
            options: LlmRequestOptions,
        ) -> LlmResult<LlmResponse> {
            assert_eq!(options.stop_sequences, vec!["END".to_string()]);
            let content = match &self.reply {
                MockReply::Text(text) => Some(text.clone()),
                MockReply::Empty => Some(String::new()),
                MockReply::Fail(e) => return Err(e.clone()),
                MockReply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    None
                }
            };
            Ok(LlmResponse {
                content,
                stop_reason: StopReason::StopSequence,
                usage: UsageStats::default(),
                model: "mock-model".to_string(),
            })
        }

        async fn health_check(&self) -> LlmResult<()> {
            match &self.reply {
                MockReply::Fail(e) => Err(e.clone()),
                _ => Ok(()),
            }
        }

        fn config(&self) -> &ProviderConfig {
            &self.config
        }
    }

    fn submission() -> CodeSubmission {
        CodeSubmission::new("print('hi')", Language::Python, "a.py")
    }

    fn advisor(reply: MockReply) -> Advisor {
        Advisor::new(Arc::new(MockProvider::new(reply)), Duration::from_secs(5))
    }

    fn assert_single_error(result: &AnalysisResult, kind: &str) {
        assert_eq!(result.errors.len(), 1, "errors: {:?}", result.errors);
        assert_eq!(result.errors[0].kind, kind);
        assert_eq!(result.errors[0].file, "a.py");
        assert_eq!(result.errors[0].severity, Some(Severity::Error));
        assert!(result.suggestions.is_empty());
        assert_eq!(result.metrics, Default::default());
    }

    #[tokio::test]
    async fn test_reply_is_parsed() {
        let advisor = advisor(MockReply::Text(
            "ERRORS:\n- SYNTAX: Missing colon [ERROR] (line 5)\nMETRICS:\nCOMPLEXITY: 3".into(),
        ));
        let result = advisor
            .request_advice(&submission(), &CancellationToken::new())
            .await;
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, "syntax");
        assert_eq!(result.metrics.complexity, 3);
    }

    #[tokio::test]
    async fn test_empty_generation() {
        let result = advisor(MockReply::Empty)
            .request_advice(&submission(), &CancellationToken::new())
            .await;
        assert_single_error(&result, "analysis_error");
        assert_eq!(result.errors[0].message, "No analysis generated");
    }

    #[tokio::test]
    async fn test_service_error() {
        let result = advisor(MockReply::Fail(LlmError::ServerError {
            message: "overloaded".into(),
            status: Some(503),
        }))
        .request_advice(&submission(), &CancellationToken::new())
        .await;
        assert_single_error(&result, "analysis_error");
        assert!(result.errors[0].message.contains("overloaded"));
    }

    #[tokio::test]
    async fn test_undecodable_reply() {
        let result = advisor(MockReply::Fail(LlmError::ParseError {
            message: "expected value".into(),
        }))
        .request_advice(&submission(), &CancellationToken::new())
        .await;
        assert_single_error(&result, "parsing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_no_analysis() {
        let result = advisor(MockReply::Hang)
            .request_advice(&submission(), &CancellationToken::new())
            .await;
        assert_single_error(&result, "analysis_error");
        assert_eq!(result.errors[0].message, "No analysis generated");
    }

    #[tokio::test]
    async fn test_cancellation_abandons_request() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = advisor(MockReply::Hang)
            .request_advice(&submission(), &cancel)
            .await;
        assert_single_error(&result, "analysis_error");
    }
}
