//! Stub item processor for exercising the pipeline.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::digest::{ItemProcessor, ProcessError, WorkItem};
use crate::references::ReferenceSet;

/// Processor that answers `<key>-out` for any work item.
///
/// Configurable per key to fail or panic, with an optional delay and a gauge
/// of how many calls were running at once.
#[derive(Debug, Clone, Default)]
pub struct StubProcessor {
    failing: Arc<HashSet<String>>,
    panicking: Arc<HashSet<String>>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

struct Gauge<'a>(&'a AtomicUsize);

impl Drop for Gauge<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StubProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, key: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.failing).insert(key.into());
        self
    }

    pub fn panicking_on(mut self, key: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.panicking).insert(key.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<I: WorkItem> ItemProcessor<I> for StubProcessor {
    async fn process(&self, item: &I, _references: &ReferenceSet) -> Result<String, ProcessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        let _gauge = Gauge(&self.in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let key = item.key();
        if self.panicking.contains(&key) {
            panic!("stub processor panicked on {}", key);
        }
        if self.failing.contains(&key) {
            return Err(ProcessError::Other(format!("stub failure for {}", key)));
        }

        Ok(format!("{}-out", key))
    }
}
