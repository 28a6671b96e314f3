//! Keyspace partitioning into shuffled batches.

use keyprobe_core::{Code, Keyspace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::iter::FusedIterator;
use std::num::NonZeroU64;

/// A contiguous sub-range `[start, end)` of the keyspace, in shuffled order.
#[derive(Debug, Clone)]
pub struct Batch {
    index: u64,
    start: u64,
    end: u64,
    codes: Vec<Code>,
}

impl Batch {
    /// Zero-based position of the batch within its pass.
    #[must_use]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// First value covered (inclusive).
    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Last value covered (exclusive).
    #[must_use]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Codes in probe order.
    #[must_use]
    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    /// Number of codes in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Always false; the partitioner never emits an empty batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Consume the batch, yielding its codes in probe order.
    #[must_use]
    pub fn into_codes(self) -> Vec<Code> {
        self.codes
    }
}

/// Lazily splits a keyspace into fixed-size batches.
///
/// Every batch holds `batch_size` codes except possibly the last, which
/// holds whatever remains. Within a batch the codes are uniformly shuffled.
/// The sequence is finite and cannot be restarted; build a new partitioner
/// for another pass.
#[derive(Debug)]
pub struct Partitioner<R = StdRng> {
    keyspace: Keyspace,
    batch_size: u64,
    next_start: u64,
    next_index: u64,
    rng: R,
}

impl Partitioner<StdRng> {
    /// Create a partitioner shuffling with an entropy-seeded RNG.
    #[must_use]
    pub fn new(keyspace: Keyspace, batch_size: NonZeroU64) -> Self {
        Self::with_rng(keyspace, batch_size, StdRng::from_entropy())
    }

    /// Create a partitioner with a reproducible shuffle.
    #[must_use]
    pub fn seeded(keyspace: Keyspace, batch_size: NonZeroU64, seed: u64) -> Self {
        Self::with_rng(keyspace, batch_size, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Partitioner<R> {
    /// Create a partitioner shuffling with the given RNG.
    pub fn with_rng(keyspace: Keyspace, batch_size: NonZeroU64, rng: R) -> Self {
        Self {
            keyspace,
            batch_size: batch_size.get(),
            next_start: keyspace.lower(),
            next_index: 0,
            rng,
        }
    }

    /// Total number of batches in a full pass, including a trailing partial batch.
    #[must_use]
    pub fn batch_count(&self) -> u64 {
        self.keyspace.len().div_ceil(self.batch_size)
    }
}

impl<R: Rng> Iterator for Partitioner<R> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let upper = self.keyspace.upper();
        if self.next_start >= upper {
            return None;
        }

        let start = self.next_start;
        let end = start.saturating_add(self.batch_size).min(upper);
        let mut codes: Vec<Code> = (start..end).map(|n| self.keyspace.code(n)).collect();
        codes.shuffle(&mut self.rng);

        let batch = Batch {
            index: self.next_index,
            start,
            end,
            codes,
        };
        self.next_start = end;
        self.next_index += 1;
        Some(batch)
    }
}

impl<R: Rng> FusedIterator for Partitioner<R> {}
