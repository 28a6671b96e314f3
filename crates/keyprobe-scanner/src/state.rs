//! Progress counters and the discovery queue handle shared by scan workers.

use crate::prober::ProbeResult;
use keyprobe_core::{DiscoveryQueue, Message};
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Counters {
    checked: AtomicU64,
    discoveries: AtomicU64,
    failures: AtomicU64,
}

/// State injected into the scan driver and shared by all of its workers.
///
/// Cloning yields another handle to the same counters and queue.
#[derive(Debug, Clone)]
pub struct ScanState {
    counters: Arc<Counters>,
    queue: DiscoveryQueue,
    progress_interval: u64,
}

impl ScanState {
    /// Create state that reports into `queue`, adding a progress note every
    /// `progress_interval` checked codes.
    #[must_use]
    pub fn new(queue: DiscoveryQueue, progress_interval: NonZeroU64) -> Self {
        Self {
            counters: Arc::new(Counters {
                checked: AtomicU64::new(0),
                discoveries: AtomicU64::new(0),
                failures: AtomicU64::new(0),
            }),
            queue,
            progress_interval: progress_interval.get(),
        }
    }

    /// Account for one finished probe.
    ///
    /// A valid result queues one discovery. Crossing a multiple of the
    /// progress interval queues one progress note.
    pub fn record(&self, result: &ProbeResult) {
        match result {
            ProbeResult::Valid { code, join_link } => {
                self.counters.discoveries.fetch_add(1, Ordering::Relaxed);
                tracing::info!(code = %code, join_link = %join_link, "discovered valid code");
                self.queue
                    .push(Message::discovery(code.clone(), join_link.clone()));
            }
            ProbeResult::Invalid { .. } => {}
            ProbeResult::Failed { .. } => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
            }
        }

        let checked = self.counters.checked.fetch_add(1, Ordering::AcqRel) + 1;
        if checked % self.progress_interval == 0 {
            tracing::debug!(checked, "progress");
            self.queue.push(Message::progress(checked));
        }
    }

    /// Codes checked since the state was created.
    #[must_use]
    pub fn checked(&self) -> u64 {
        self.counters.checked.load(Ordering::Acquire)
    }

    /// Valid codes found since the state was created.
    #[must_use]
    pub fn discoveries(&self) -> u64 {
        self.counters.discoveries.load(Ordering::Relaxed)
    }

    /// Probes that failed at the transport level.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.counters.failures.load(Ordering::Relaxed)
    }

    /// Queue this state reports into.
    #[must_use]
    pub fn queue(&self) -> &DiscoveryQueue {
        &self.queue
    }
}
