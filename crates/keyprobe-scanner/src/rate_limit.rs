//! Per-worker request pacing.

use crate::prober::{ProbeResult, Prober};
use async_trait::async_trait;
use keyprobe_core::Code;
use std::time::Duration;

/// Wraps a prober so that every probe is followed by a fixed pause.
///
/// Workers await the whole probe, pause included, before taking the next
/// code, so each worker sends at most one request per `min_delay` plus the
/// remote latency, whatever the outcome of the request.
#[derive(Debug)]
pub struct RateLimitedProber<P> {
    inner: P,
    min_delay: Duration,
}

impl<P> RateLimitedProber<P> {
    /// Wrap `inner`, pausing `min_delay` after each probe.
    pub fn new(inner: P, min_delay: Duration) -> Self {
        Self { inner, min_delay }
    }

    /// Configured pause.
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }
}

#[async_trait]
impl<P: Prober> Prober for RateLimitedProber<P> {
    async fn probe(&self, code: &Code) -> ProbeResult {
        let result = self.inner.probe(code).await;
        if !self.min_delay.is_zero() {
            tokio::time::sleep(self.min_delay).await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    struct CountingProber {
        calls: AtomicU32,
        latency: Duration,
        fail: bool,
    }

    #[async_trait]
    impl Prober for CountingProber {
        async fn probe(&self, code: &Code) -> ProbeResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.fail {
                ProbeResult::Failed {
                    code: code.clone(),
                    reason: "connection refused".to_string(),
                }
            } else {
                ProbeResult::Invalid { code: code.clone() }
            }
        }
    }

    fn counting(latency_ms: u64, fail: bool) -> CountingProber {
        CountingProber {
            calls: AtomicU32::new(0),
            latency: Duration::from_millis(latency_ms),
            fail,
        }
    }

    fn assert_elapsed(start: Instant, expected_ms: u64) {
        let elapsed = start.elapsed();
        let expected = Duration::from_millis(expected_ms);
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(10),
            "elapsed {elapsed:?}, expected about {expected:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_follows_every_probe() {
        let prober = RateLimitedProber::new(counting(0, false), Duration::from_millis(50));
        let code = Code::from_number(1, 6);

        let start = Instant::now();
        for _ in 0..4 {
            prober.probe(&code).await;
        }

        assert_elapsed(start, 200);
        assert_eq!(prober.inner.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_added_to_remote_latency() {
        let prober = RateLimitedProber::new(counting(30, false), Duration::from_millis(50));
        let start = Instant::now();
        prober.probe(&Code::from_number(1, 6)).await;
        assert_elapsed(start, 80);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_applies_after_failure() {
        let prober = RateLimitedProber::new(counting(0, true), Duration::from_millis(50));
        let start = Instant::now();
        let result = prober.probe(&Code::from_number(1, 6)).await;
        assert!(matches!(result, ProbeResult::Failed { .. }));
        assert_elapsed(start, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_does_not_sleep() {
        let prober = RateLimitedProber::new(counting(0, false), Duration::ZERO);
        let start = Instant::now();
        prober.probe(&Code::from_number(1, 6)).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
