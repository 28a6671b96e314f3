//! Keyprobe Notify - delivery of discoveries to registered destinations.
//!
//! The scanner and the notifier never talk directly: the scanner pushes onto
//! the [`keyprobe_core::DiscoveryQueue`] and the [`Dispatcher`] drains it on a
//! fixed period, fanning each message out to every destination currently in
//! the [`DeliveryRegistry`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod render;
pub mod target;
pub mod webhook;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use error::{DeliveryError, Result};
pub use registry::{DeliveryRegistry, Destination, DestinationSource};
pub use render::{render_embed, EmbedStyle, WebhookPayload};
pub use target::{DeliveryTarget, LogTarget};
pub use webhook::WebhookTarget;
