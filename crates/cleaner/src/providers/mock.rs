use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;

use stackscan_core::{CompletionProvider, CompletionRequest, CompletionResponse, ServiceError};

/// A scriptable completion provider for tests.
///
/// Outcomes pushed with `push_ok`/`push_err` are consumed in order; once
/// the script is empty every call returns the default response. Call start
/// times are recorded so pacing can be asserted.
pub struct MockProvider {
    name: String,
    default_response: String,
    script: Mutex<VecDeque<Result<String, ServiceError>>>,
    calls: Mutex<Vec<(Instant, CompletionRequest)>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_response: "[]".to_string(),
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    pub fn push_ok(&self, content: impl Into<String>) {
        self.script.lock().unwrap().push_back(Ok(content.into()));
    }

    pub fn push_err(&self, err: ServiceError) {
        self.script.lock().unwrap().push_back(Err(err));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Start instants of every call, in order.
    pub fn call_starts(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    /// Requests received, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().iter().map(|(_, r)| r.clone()).collect()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));

        let scripted = self.script.lock().unwrap().pop_front();
        let content = match scripted {
            Some(Ok(content)) => content,
            Some(Err(err)) => return Err(err),
            None => self.default_response.clone(),
        };

        Ok(CompletionResponse {
            content,
            provider: self.name.clone(),
            model: request.model.clone(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}
