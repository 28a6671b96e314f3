//! Keyprobe Core - Foundation crate for the keyprobe scanner.
//!
//! This crate provides shared types, the discovery queue, error handling and
//! configuration management that the scanner, the notifier and the
//! application shell depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared newtypes and enums (`Code`, `Keyspace`, `DestinationId`, `Message`)
//! - [`queue`] - Unbounded FIFO decoupling discovery from delivery
//!
//! # Example
//!
//! ```rust
//! use keyprobe_core::{Code, DiscoveryQueue, Message};
//!
//! let queue = DiscoveryQueue::new();
//! queue.push(Message::discovery(Code::from_number(42, 6), "https://example.com/join?gc=000042"));
//!
//! let drained = queue.drain_all();
//! assert_eq!(drained.len(), 1);
//! assert!(queue.drain_all().is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod queue;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, LivenessConfig, NotifyConfig, ProbeConfig, ScanningConfig, WebhookConfig,
};
pub use error::{ConfigError, ConfigResult, CoreError, Result};
pub use queue::DiscoveryQueue;
pub use types::{Code, DestinationId, Keyspace, Message};
