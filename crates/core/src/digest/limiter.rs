//! Counting-semaphore limiter for outbound LLM calls.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Tracks slot usage for status reporting.
#[derive(Default)]
struct SlotStats {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    total_acquired: AtomicU64,
}

/// Snapshot of the limiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterStatus {
    pub capacity: usize,
    pub available: usize,
    pub in_flight: usize,
    pub peak_in_flight: usize,
    pub total_acquired: u64,
}

/// Admits at most `capacity` concurrent slot holders.
///
/// Cloning shares the same slots.
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    stats: Arc<SlotStats>,
}

/// One held slot. Dropping it returns the slot.
pub struct Slot {
    _permit: OwnedSemaphorePermit,
    stats: Arc<SlotStats>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyLimiter {
    /// Creates a limiter with `capacity` slots. Zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            stats: Arc::new(SlotStats::default()),
        }
    }

    /// Waits for a free slot.
    ///
    /// The semaphore is never closed, so this only waits; the error arm
    /// exists because tokio's API reports closure.
    pub async fn acquire(&self) -> Result<Slot, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;

        let current = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(current, Ordering::SeqCst);
        self.stats.total_acquired.fetch_add(1, Ordering::Relaxed);

        Ok(Slot {
            _permit: permit,
            stats: Arc::clone(&self.stats),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots free right now.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn in_flight(&self) -> usize {
        self.stats.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.stats.peak.load(Ordering::SeqCst)
    }

    /// Starts a fresh measurement window: the peak drops to the slots held
    /// right now and the acquisition count goes back to zero.
    pub fn reset_stats(&self) {
        self.stats
            .peak
            .store(self.stats.in_flight.load(Ordering::SeqCst), Ordering::SeqCst);
        self.stats.total_acquired.store(0, Ordering::Relaxed);
    }

    pub fn status(&self) -> LimiterStatus {
        LimiterStatus {
            capacity: self.capacity,
            available: self.available(),
            in_flight: self.in_flight(),
            peak_in_flight: self.peak_in_flight(),
            total_acquired: self.stats.total_acquired.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for ConcurrencyLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrencyLimiter")
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
