//! Discovery queue shared between the scanner and the dispatcher.
//!
//! Producers push from any worker without awaiting; the dispatcher takes
//! everything queued so far in one atomic step. Pushes from a single producer
//! keep their order; interleaving across producers is unspecified.

use crate::types::Message;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Unbounded, thread-safe FIFO of [`Message`]s.
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryQueue {
    inner: Arc<Mutex<VecDeque<Message>>>,
}

impl DiscoveryQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the back of the queue.
    pub fn push(&self, message: Message) {
        self.inner
            .lock()
            .expect("acquire discovery queue lock")
            .push_back(message);
    }

    /// Remove and return every queued message, oldest first.
    ///
    /// Returns an empty vector when nothing is queued.
    #[must_use]
    pub fn drain_all(&self) -> Vec<Message> {
        let drained = {
            let mut queue = self.inner.lock().expect("acquire discovery queue lock");
            std::mem::take(&mut *queue)
        };
        drained.into()
    }

    /// Number of messages currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("acquire discovery queue lock").len()
    }

    /// Whether the queue is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Code;
    use std::thread;

    #[test]
    fn test_drain_twice() {
        let queue = DiscoveryQueue::new();
        queue.push(Message::progress(1000));
        queue.push(Message::discovery(Code::from_number(7, 6), "link"));

        let first = queue.drain_all();
        assert_eq!(first.len(), 2);
        assert!(matches!(first[0], Message::ProgressNote { checked: 1000, .. }));
        assert!(first[1].is_discovery());

        assert!(queue.drain_all().is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_empty_queue() {
        let queue = DiscoveryQueue::new();
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn test_clones_share_storage() {
        let queue = DiscoveryQueue::new();
        let handle = queue.clone();
        handle.push(Message::progress(1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_concurrent_push_and_drain_loses_nothing() {
        const PRODUCERS: u64 = 4;
        const PER_PRODUCER: u64 = 2_000;

        let queue = DiscoveryQueue::new();
        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.push(Message::progress(p * PER_PRODUCER + i));
                    }
                })
            })
            .collect();

        let mut seen = Vec::new();
        while producers.iter().any(|h| !h.is_finished()) {
            seen.extend(queue.drain_all());
        }
        for handle in producers {
            handle.join().expect("producer thread");
        }
        seen.extend(queue.drain_all());

        let mut values: Vec<u64> = seen
            .iter()
            .map(|m| match m {
                Message::ProgressNote { checked, .. } => *checked,
                Message::Discovery { .. } => unreachable!("only progress notes pushed"),
            })
            .collect();

        // Per-producer order is preserved.
        for p in 0..PRODUCERS {
            let own: Vec<u64> = values
                .iter()
                .copied()
                .filter(|v| v / PER_PRODUCER == p)
                .collect();
            assert!(own.windows(2).all(|w| w[0] < w[1]));
        }

        values.sort_unstable();
        let expected: Vec<u64> = (0..PRODUCERS * PER_PRODUCER).collect();
        assert_eq!(values, expected);
    }
}
