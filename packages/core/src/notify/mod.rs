//! Notification delivery.

pub mod discord;
pub mod payload;

use async_trait::async_trait;

use crate::error::WebhookError;
use discord::{Attachment, DiscordWebhook, WebhookMessage};

pub use payload::{build_messages, OutgoingMessage, PreparedEmbed};

/// Destination for finished webhook messages.
#[async_trait]
pub trait NotificationSink {
    async fn deliver(
        &self,
        message: &WebhookMessage,
        attachments: &[Attachment],
    ) -> Result<(), WebhookError>;

    /// Whether a successful delivery should advance the watermark.
    fn persists(&self) -> bool {
        true
    }
}

#[async_trait]
impl NotificationSink for DiscordWebhook {
    async fn deliver(
        &self,
        message: &WebhookMessage,
        attachments: &[Attachment],
    ) -> Result<(), WebhookError> {
        self.send(message, attachments).await
    }
}

/// Prints payloads to stdout instead of posting them.
#[derive(Debug, Default)]
pub struct DryRunSink;

#[async_trait]
impl NotificationSink for DryRunSink {
    async fn deliver(
        &self,
        message: &WebhookMessage,
        attachments: &[Attachment],
    ) -> Result<(), WebhookError> {
        println!("{}", serde_json::to_string_pretty(message)?);
        for attachment in attachments {
            tracing::info!(
                "Would upload {} ({} bytes, {})",
                attachment.filename,
                attachment.data.len(),
                attachment.mime
            );
        }
        Ok(())
    }

    fn persists(&self) -> bool {
        false
    }
}
