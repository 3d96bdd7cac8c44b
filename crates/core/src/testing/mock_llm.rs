//! Mock LLM client for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::llm::{GenerationRequest, GenerationResponse, LlmClient, LlmError, TokenUsage};

/// Mock implementation of the LlmClient trait.
///
/// Requests are attributed to a key taken from the first prompt line that
/// starts with `# `. For each key the first call answers
/// `summary of <key>` and every later call answers
/// `verified: summary of <key>`.
///
/// Clones share state, so a test can keep one handle and give another to the
/// code under test.
///
/// # Example
///
/// ```rust,ignore
/// let llm = MockLlmClient::new();
/// llm.fail_call("Maps", 2); // verification of "Maps" fails
///
/// // ... run the pipeline ...
///
/// assert_eq!(llm.recorded_requests().len(), 4);
/// assert!(llm.peak_in_flight() <= 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    calls_per_key: Arc<Mutex<HashMap<String, usize>>>,
    /// (key, 1-based call number) pairs that fail
    failures: Arc<Mutex<Vec<(String, usize)>>>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each call sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes the `call`-th request (1-based) for `key` fail.
    pub fn fail_call(&self, key: impl Into<String>, call: usize) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((key.into(), call));
        }
    }

    /// Every request received, in arrival order.
    pub fn recorded_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of requests received for `key`.
    pub fn call_count(&self, key: &str) -> usize {
        self.calls_per_key
            .lock()
            .map(|c| c.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Most requests that were being answered at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn key_of(request: &GenerationRequest) -> String {
        request
            .prompt_text()
            .lines()
            .find_map(|line| line.strip_prefix("# "))
            .map(|title| title.trim().to_string())
            .unwrap_or_default()
    }

    fn should_fail(&self, key: &str, call: usize) -> bool {
        self.failures
            .lock()
            .map(|f| f.iter().any(|(k, n)| k == key && *n == call))
            .unwrap_or(false)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let key = Self::key_of(&request);
        let call = {
            let mut calls = self
                .calls_per_key
                .lock()
                .map_err(|e| LlmError::Http(e.to_string()))?;
            let count = calls.entry(key.clone()).or_insert(0);
            *count += 1;
            *count
        };
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail(&key, call) {
            return Err(LlmError::Api {
                status: 429,
                message: format!("quota exceeded for {}", key),
            });
        }

        let text = if call == 1 {
            format!("summary of {}", key)
        } else {
            format!("verified: summary of {}", key)
        };

        Ok(GenerationResponse {
            text,
            usage: TokenUsage {
                prompt_tokens: 100,
                output_tokens: 20,
                thoughts_tokens: 0,
            },
            model: "mock-model".to_string(),
        })
    }
}
