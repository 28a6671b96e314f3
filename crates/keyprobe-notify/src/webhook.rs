//! Webhook delivery target.

use crate::error::{DeliveryError, Result};
use crate::render::{render_embed, EmbedStyle};
use crate::target::DeliveryTarget;
use async_trait::async_trait;
use keyprobe_core::Message;
use reqwest::Client;
use std::fmt;
use std::time::Duration;

/// Posts each message as a JSON embed to a webhook URL.
///
/// Any non-2xx response counts as a failed delivery.
pub struct WebhookTarget {
    client: Client,
    url: String,
    style: EmbedStyle,
}

impl WebhookTarget {
    /// Create a webhook target with its own HTTP client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(url: impl Into<String>, style: EmbedStyle, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url, style))
    }

    /// Create a webhook target sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: Client, url: impl Into<String>, style: EmbedStyle) -> Self {
        Self {
            client,
            url: url.into(),
            style,
        }
    }
}

impl fmt::Debug for WebhookTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookTarget")
            .field("url", &"<redacted>")
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DeliveryTarget for WebhookTarget {
    async fn deliver(&self, message: &Message) -> Result<()> {
        let payload = render_embed(message, &self.style);
        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "webhook"
    }
}
