//! Periodic drain-and-deliver loop.
//!
//! Each cycle takes everything queued so far and hands every message to
//! every destination in the registry snapshot. Destinations are served
//! concurrently, each receiving the messages in drain order, and each gets at
//! most one period per cycle so a stalled destination cannot hold up the next
//! cycle. Delivery is at-most-once per cycle: failed deliveries are logged,
//! never re-queued, and messages drained while no destination is registered
//! are discarded after being logged.

use crate::error::DeliveryError;
use crate::registry::DestinationSource;
use crate::target::DeliveryTarget;
use futures::future::join_all;
use futures::FutureExt;
use keyprobe_core::{DestinationId, DiscoveryQueue, Message};
use std::any::Any;
use std::ops::AddAssign;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Counts from one or more dispatch cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Messages taken from the queue
    pub drained: usize,
    /// Successful (message, destination) deliveries
    pub delivered: usize,
    /// Failed (message, destination) deliveries
    pub failed: usize,
    /// Messages dropped because no destination was registered
    pub discarded: usize,
}

impl AddAssign for DispatchReport {
    fn add_assign(&mut self, rhs: Self) {
        self.drained += rhs.drained;
        self.delivered += rhs.delivered;
        self.failed += rhs.failed;
        self.discarded += rhs.discarded;
    }
}

/// Drains the discovery queue on a fixed period and fans messages out.
pub struct Dispatcher {
    queue: DiscoveryQueue,
    destinations: Arc<dyn DestinationSource>,
    period: Duration,
}

impl Dispatcher {
    /// Create a dispatcher reading `queue` and delivering to `destinations`
    /// every `period`.
    #[must_use]
    pub fn new(
        queue: DiscoveryQueue,
        destinations: Arc<dyn DestinationSource>,
        period: Duration,
    ) -> Self {
        Self {
            queue,
            destinations,
            period,
        }
    }

    /// Dispatch period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run one cycle: drain the queue and deliver everything drained.
    pub async fn dispatch_once(&self) -> DispatchReport {
        let messages = self.queue.drain_all();
        let mut report = DispatchReport {
            drained: messages.len(),
            ..DispatchReport::default()
        };
        if messages.is_empty() {
            return report;
        }

        let destinations = self.destinations.snapshot();
        if destinations.is_empty() {
            for message in &messages {
                tracing::info!("no delivery targets registered, discarding: {message}");
            }
            report.discarded = messages.len();
            return report;
        }

        for message in &messages {
            tracing::debug!("dispatching: {message}");
        }
        let outcomes = join_all(
            destinations
                .iter()
                .map(|(id, target)| deliver_in_order(id, target.as_ref(), &messages, self.period)),
        )
        .await;
        for (delivered, failed) in outcomes {
            report.delivered += delivered;
            report.failed += failed;
        }

        tracing::debug!(
            drained = report.drained,
            delivered = report.delivered,
            failed = report.failed,
            "dispatch cycle complete"
        );
        report
    }

    /// Run cycles every period until `cancel` fires, then run one final
    /// cycle so queued messages are not left behind.
    ///
    /// Returns the totals over all cycles.
    pub async fn run(&self, cancel: CancellationToken) -> DispatchReport {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut total = DispatchReport::default();
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => total += self.dispatch_once().await,
            }
        }

        total += self.dispatch_once().await;
        tracing::info!(
            drained = total.drained,
            delivered = total.delivered,
            failed = total.failed,
            "dispatcher stopped"
        );
        total
    }
}

/// Deliver `messages` to one destination, in drain order.
///
/// The whole walk is bounded by `budget`; whatever is left when it runs out
/// counts as failed. A panicking target fails that one message only.
/// Returns `(delivered, failed)`.
async fn deliver_in_order(
    id: &DestinationId,
    target: &dyn DeliveryTarget,
    messages: &[Message],
    budget: Duration,
) -> (usize, usize) {
    let mut delivered = 0;
    let mut attempted = 0;

    let walk = async {
        for message in messages {
            attempted += 1;
            match AssertUnwindSafe(target.deliver(message)).catch_unwind().await {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => log_failure(id, target, &e),
                Err(panic) => log_failure(
                    id,
                    target,
                    &DeliveryError::Unavailable(format!(
                        "target panicked: {}",
                        panic_message(panic.as_ref())
                    )),
                ),
            }
        }
    };

    if tokio::time::timeout(budget, walk).await.is_err() {
        let skipped = messages.len() - attempted;
        log_failure(
            id,
            target,
            &DeliveryError::Unavailable(format!(
                "timed out after {budget:?}, {skipped} more message(s) not attempted"
            )),
        );
    }

    (delivered, messages.len() - delivered)
}

fn log_failure(id: &DestinationId, target: &dyn DeliveryTarget, error: &DeliveryError) {
    tracing::warn!(
        destination = %id,
        kind = target.kind(),
        error = %error,
        "delivery failed"
    );
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
