//! LLM-backed frame cleaner: prompt → completion → parse.

use async_trait::async_trait;
use tracing::debug;

use stackscan_core::{CleanedFrame, FrameCleaner, FrameObservation, ServiceError};

use crate::client::CompletionClient;
use crate::parse::parse_completion;
use crate::prompt::{build_request, LlmSettings};

/// Sends each frame's OCR fragments to a completion service and validates
/// the structured reply.
///
/// Frames with an empty fragment list are still sent: the parser's
/// zero-valid-pairs rule classifies them, rather than this backend
/// guessing at a skip threshold.
pub struct LlmCleaner {
    client: CompletionClient,
    settings: LlmSettings,
}

impl LlmCleaner {
    pub fn new(client: CompletionClient, settings: LlmSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl FrameCleaner for LlmCleaner {
    fn name(&self) -> &str {
        "llm"
    }

    async fn clean(&self, frame: &FrameObservation) -> Result<CleanedFrame, ServiceError> {
        let request = build_request(frame, &self.settings);
        let response = self.client.send(&request).await?;
        debug!(
            filepath = %frame.filepath,
            provider = %response.provider,
            tokens = response.tokens_used,
            "Parsing completion"
        );
        Ok(parse_completion(&frame.filepath, &response.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use stackscan_core::FrameStatus;

    use crate::providers::MockProvider;
    use crate::retry::RetryPolicy;

    fn frame(filepath: &str) -> FrameObservation {
        FrameObservation {
            filepath: filepath.into(),
            raw_text: vec![],
            success: true,
        }
    }

    fn cleaner(provider: Arc<MockProvider>) -> LlmCleaner {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
            backoff_factor: 2.0,
            max_delay_ms: 5,
            jitter: false,
        };
        LlmCleaner::new(
            CompletionClient::new(provider, policy),
            LlmSettings::default(),
        )
    }

    #[tokio::test]
    async fn valid_completion_becomes_ok_record() {
        let provider = Arc::new(MockProvider::new("mock"));
        provider.push_ok(r#"[{"name":"Alice","chips":15000}]"#);

        let record = cleaner(provider).clean(&frame("a.png")).await.unwrap();
        assert_eq!(record.status, FrameStatus::Ok);
        assert_eq!(record.players[0].chips, 15000);
    }

    #[tokio::test]
    async fn garbage_completion_becomes_parse_failed_record() {
        let provider = Arc::new(MockProvider::new("mock").with_response("no payload here"));

        let record = cleaner(provider).clean(&frame("a.png")).await.unwrap();
        assert_eq!(record.status, FrameStatus::ParseFailed);
        assert!(record.players.is_empty());
    }

    #[tokio::test]
    async fn retried_frame_matches_a_first_try_success() {
        let flaky = Arc::new(MockProvider::new("mock"));
        flaky.push_err(ServiceError::RateLimited("429".into()));
        flaky.push_err(ServiceError::RateLimited("429".into()));
        flaky.push_ok(r#"[{"name":"Bob","chips":"8,200"}]"#);

        let healthy = Arc::new(MockProvider::new("mock"));
        healthy.push_ok(r#"[{"name":"Bob","chips":"8,200"}]"#);

        let retried = cleaner(flaky).clean(&frame("a.png")).await.unwrap();
        let direct = cleaner(healthy).clean(&frame("a.png")).await.unwrap();
        assert_eq!(retried, direct);
    }

    #[tokio::test]
    async fn permanent_failure_escapes() {
        let provider = Arc::new(MockProvider::new("mock"));
        provider.push_err(ServiceError::Permanent("bad key".into()));

        let err = cleaner(provider).clean(&frame("a.png")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Permanent(_)));
    }
}
