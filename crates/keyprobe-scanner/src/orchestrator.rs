//! Scan driver coordinating the worker pool across keyspace batches.
//!
//! The driver owns a fixed pool of workers spawned once per run. Codes are
//! handed to the pool through a bounded job channel; the driver then waits
//! for every dispatched code of the batch to report back before building the
//! next batch, so batches never interleave.
//!
//! Coverage is best-effort: a code whose probe fails at the transport level
//! is counted and logged but not retried within the pass. Progress is not
//! persisted; a restarted process begins again at the first batch.

use crate::error::{Result, ScanError};
use crate::partition::Partitioner;
use crate::prober::Prober;
use crate::state::ScanState;
use keyprobe_core::{Code, Keyspace, ScanningConfig};
use std::num::{NonZeroU64, NonZeroUsize};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Validated parameters of a scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanSettings {
    /// Codes to scan
    pub keyspace: Keyspace,
    /// Codes per batch
    pub batch_size: NonZeroU64,
    /// Maximum probes in flight
    pub workers: NonZeroUsize,
    /// Restart from the first batch when the keyspace is exhausted
    pub continuous: bool,
}

impl ScanSettings {
    /// Build settings from configuration.
    ///
    /// # Errors
    /// Returns error if the bounds are invalid or a size is zero.
    pub fn from_config(config: &ScanningConfig) -> Result<Self> {
        let keyspace = config
            .keyspace()
            .map_err(|e| ScanError::InvalidSettings(e.to_string()))?;
        let batch_size = NonZeroU64::new(config.batch_size).ok_or_else(|| {
            ScanError::InvalidSettings("batch size must be non-zero".to_string())
        })?;
        let workers = NonZeroUsize::new(config.workers).ok_or_else(|| {
            ScanError::InvalidSettings("worker count must be non-zero".to_string())
        })?;

        Ok(Self {
            keyspace,
            batch_size,
            workers,
            continuous: config.continuous,
        })
    }
}

/// Totals reported when a scan run ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Codes checked (all outcomes)
    pub checked: u64,
    /// Valid codes found
    pub discoveries: u64,
    /// Probes that failed at the transport level
    pub failures: u64,
    /// Batches fully completed
    pub batches: u64,
    /// Passes started over the keyspace
    pub passes: u64,
    /// Whether the run stopped because of cancellation
    pub cancelled: bool,
}

/// Drives a bounded worker pool over the keyspace, batch by batch.
pub struct ScanDriver {
    prober: Arc<dyn Prober>,
    state: ScanState,
    settings: ScanSettings,
    seed: Option<u64>,
}

impl ScanDriver {
    /// Create a scan driver.
    #[must_use]
    pub fn new(prober: Arc<dyn Prober>, state: ScanState, settings: ScanSettings) -> Self {
        Self {
            prober,
            state,
            settings,
            seed: None,
        }
    }

    /// Shuffle batches reproducibly from `seed` instead of OS entropy.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Shared state the workers report into.
    #[must_use]
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    fn partitioner(&self, pass: u64) -> Partitioner {
        match self.seed {
            Some(seed) => Partitioner::seeded(
                self.settings.keyspace,
                self.settings.batch_size,
                seed.wrapping_add(pass),
            ),
            None => Partitioner::new(self.settings.keyspace, self.settings.batch_size),
        }
    }

    /// Run the scan until the keyspace is exhausted (or forever in continuous
    /// mode) or `cancel` fires.
    ///
    /// On cancellation no further codes are dispatched; probes already handed
    /// to a worker finish (or time out) before this returns.
    ///
    /// # Errors
    /// Returns [`ScanError::WorkerFailed`] if a worker panics or exits early.
    pub async fn run(&self, cancel: CancellationToken) -> Result<ScanSummary> {
        let workers = self.settings.workers.get();
        let (job_tx, job_rx) = mpsc::channel::<Code>(workers);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();

        let mut pool = JoinSet::new();
        for id in 0..workers {
            pool.spawn(worker_loop(
                id,
                self.prober.clone(),
                self.state.clone(),
                job_rx.clone(),
                done_tx.clone(),
            ));
        }
        drop(job_rx);
        drop(done_tx);

        tracing::info!(
            lower = self.settings.keyspace.lower(),
            upper = self.settings.keyspace.upper(),
            batch_size = self.settings.batch_size.get(),
            workers,
            "scan started"
        );

        let mut summary = ScanSummary::default();
        'passes: loop {
            let partitioner = self.partitioner(summary.passes);
            let batch_count = partitioner.batch_count();
            summary.passes += 1;

            for batch in partitioner {
                if cancel.is_cancelled() {
                    summary.cancelled = true;
                    break 'passes;
                }

                tracing::debug!(
                    pass = summary.passes,
                    batch = batch.index() + 1,
                    of = batch_count,
                    start = batch.start(),
                    end = batch.end(),
                    "dispatching batch"
                );

                let mut dispatched = 0usize;
                for code in batch.into_codes() {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            summary.cancelled = true;
                            break;
                        }
                        sent = job_tx.send(code) => {
                            if sent.is_err() {
                                return Err(drain_pool_error(&mut pool).await);
                            }
                            dispatched += 1;
                        }
                    }
                }

                // Barrier: every dispatched code reports back before the next batch.
                let mut completed = 0usize;
                while completed < dispatched {
                    tokio::select! {
                        Some(()) = done_rx.recv() => completed += 1,
                        Some(joined) = pool.join_next() => {
                            return Err(worker_exit_error(joined));
                        }
                        else => {
                            return Err(ScanError::WorkerFailed(
                                "worker pool closed during batch".to_string(),
                            ));
                        }
                    }
                }

                if summary.cancelled {
                    break 'passes;
                }
                summary.batches += 1;
                tracing::debug!(checked = self.state.checked(), "batch complete");
            }

            if !self.settings.continuous {
                break;
            }
            tracing::info!(pass = summary.passes, "keyspace exhausted, starting next pass");
        }

        drop(job_tx);
        while let Some(joined) = pool.join_next().await {
            joined.map_err(|e| ScanError::WorkerFailed(e.to_string()))?;
        }

        summary.checked = self.state.checked();
        summary.discoveries = self.state.discoveries();
        summary.failures = self.state.failures();

        tracing::info!(
            checked = summary.checked,
            discoveries = summary.discoveries,
            failures = summary.failures,
            cancelled = summary.cancelled,
            "scan finished"
        );
        Ok(summary)
    }
}

async fn worker_loop(
    id: usize,
    prober: Arc<dyn Prober>,
    state: ScanState,
    jobs: Arc<Mutex<mpsc::Receiver<Code>>>,
    done: mpsc::UnboundedSender<()>,
) {
    loop {
        let next = jobs.lock().await.recv().await;
        let Some(code) = next else { break };

        let result = prober.probe(&code).await;
        tracing::trace!(worker = id, code = %code, ?result, "probe complete");
        state.record(&result);

        if done.send(()).is_err() {
            break;
        }
    }
    tracing::trace!(worker = id, "worker exiting");
}

fn worker_exit_error(joined: std::result::Result<(), JoinError>) -> ScanError {
    match joined {
        Ok(()) => ScanError::WorkerFailed("worker exited during batch".to_string()),
        Err(e) => ScanError::WorkerFailed(e.to_string()),
    }
}

async fn drain_pool_error(pool: &mut JoinSet<()>) -> ScanError {
    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            return ScanError::WorkerFailed(e.to_string());
        }
    }
    ScanError::WorkerFailed("all workers exited".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prober::ProbeResult;
    use async_trait::async_trait;
    use keyprobe_core::DiscoveryQueue;

    struct PanickingProber;

    #[async_trait]
    impl Prober for PanickingProber {
        async fn probe(&self, code: &Code) -> ProbeResult {
            if code.value() == 3 {
                panic!("probe bug");
            }
            ProbeResult::Invalid { code: code.clone() }
        }
    }

    fn settings(lower: u64, upper: u64, batch: u64, workers: usize) -> ScanSettings {
        ScanSettings {
            keyspace: Keyspace::new(lower, upper, 6).expect("valid keyspace"),
            batch_size: NonZeroU64::new(batch).expect("non-zero"),
            workers: NonZeroUsize::new(workers).expect("non-zero"),
            continuous: false,
        }
    }

    #[test]
    fn test_settings_from_config() {
        let config = ScanningConfig::default();
        let settings = ScanSettings::from_config(&config).expect("valid settings");
        assert_eq!(settings.keyspace.len(), 900_000);
        assert_eq!(settings.batch_size.get(), 10_000);
        assert_eq!(settings.workers.get(), 5);

        let mut config = ScanningConfig::default();
        config.workers = 0;
        assert!(ScanSettings::from_config(&config).is_err());

        let mut config = ScanningConfig::default();
        config.lower_bound = config.upper_bound + 1;
        assert!(ScanSettings::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_worker_panic_is_fatal() {
        let state = ScanState::new(DiscoveryQueue::new(), NonZeroU64::MIN);
        let driver = ScanDriver::new(Arc::new(PanickingProber), state, settings(0, 10, 10, 2));

        let err = driver.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ScanError::WorkerFailed(_)));
    }
}
