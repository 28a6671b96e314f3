//! Keyprobe Scanner - keyspace scanning engine.
//!
//! This crate walks a numeric keyspace in shuffled batches, probes every code
//! against a remote service through a fixed-size worker pool, paces each
//! worker with a post-request delay, and reports discoveries and progress
//! into the shared [`keyprobe_core::DiscoveryQueue`].
//!
//! # Features
//!
//! - Lazy partitioning with an explicit trailing partial batch
//! - Uniform shuffling of probe order within each batch
//! - Hard concurrency ceiling with a barrier between batches
//! - Transport failures logged and counted, never fatal
//! - Cooperative shutdown through a `CancellationToken`
//!
//! # Example
//!
//! ```rust,ignore
//! use keyprobe_scanner::{HttpProber, RateLimitedProber, ScanDriver, ScanSettings, ScanState};
//! use std::sync::Arc;
//!
//! let http = HttpProber::new(&config.probe)?;
//! let prober = RateLimitedProber::new(http, config.scanning.request_delay());
//! let state = ScanState::new(queue.clone(), interval);
//! let settings = ScanSettings::from_config(&config.scanning)?;
//! let driver = ScanDriver::new(Arc::new(prober), state, settings);
//!
//! let summary = driver.run(cancel_token).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod error;
pub mod orchestrator;
pub mod partition;
pub mod prober;
pub mod rate_limit;
pub mod state;

// Re-export commonly used types
pub use error::{Result, ScanError};
pub use orchestrator::{ScanDriver, ScanSettings, ScanSummary};
pub use partition::{Batch, Partitioner};
pub use prober::{build_http_client, HttpProber, ProbeResult, Prober};
pub use rate_limit::RateLimitedProber;
pub use state::ScanState;
