//! Rendering messages into webhook embed payloads.

use keyprobe_core::{Message, NotifyConfig};
use serde::Serialize;

/// Presentation settings shared by every embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedStyle {
    /// Name shown as the embed author
    pub author_name: String,
    /// Accent color (24-bit RGB)
    pub color: u32,
}

impl EmbedStyle {
    /// Style taken from the notification settings.
    #[must_use]
    pub fn from_config(config: &NotifyConfig) -> Self {
        Self {
            author_name: config.author_name.clone(),
            color: config.embed_color,
        }
    }
}

impl Default for EmbedStyle {
    fn default() -> Self {
        Self::from_config(&NotifyConfig::default())
    }
}

/// Body posted to a webhook.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookPayload {
    /// Embeds to show; always exactly one
    pub embeds: Vec<Embed>,
}

/// A single embed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Embed {
    /// Rendered message text
    pub description: String,
    /// Accent color
    pub color: u32,
    /// Author block
    pub author: EmbedAuthor,
    /// RFC 3339 creation time of the message
    pub timestamp: String,
}

/// Embed author block.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmbedAuthor {
    /// Author display name
    pub name: String,
}

/// Render a message as a webhook payload.
#[must_use]
pub fn render_embed(message: &Message, style: &EmbedStyle) -> WebhookPayload {
    WebhookPayload {
        embeds: vec![Embed {
            description: message.to_string(),
            color: style.color,
            author: EmbedAuthor {
                name: style.author_name.clone(),
            },
            timestamp: message.created_at().to_rfc3339(),
        }],
    }
}
