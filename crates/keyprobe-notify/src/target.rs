//! Delivery target trait and the log target.

use crate::error::Result;
use async_trait::async_trait;
use keyprobe_core::Message;

/// A destination able to accept rendered messages.
///
/// Implementations render the message into whatever representation the
/// destination expects. Implementations should be thread-safe (Send + Sync)
/// for use from the dispatcher task.
#[async_trait]
pub trait DeliveryTarget: Send + Sync {
    /// Deliver one message.
    ///
    /// # Errors
    /// Returns error if the destination could not accept the message.
    async fn deliver(&self, message: &Message) -> Result<()>;

    /// Short name of the target kind, used in logs.
    fn kind(&self) -> &'static str;
}

/// Target that writes every message to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTarget;

#[async_trait]
impl DeliveryTarget for LogTarget {
    async fn deliver(&self, message: &Message) -> Result<()> {
        match message {
            Message::Discovery {
                code, join_link, ..
            } => tracing::info!(code = %code, join_link = %join_link, "{message}"),
            Message::ProgressNote { checked, .. } => tracing::info!(checked, "{message}"),
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "log"
    }
}
