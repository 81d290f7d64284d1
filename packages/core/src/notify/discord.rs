//! Discord webhook delivery.
//!
//! Messages carry rich embeds. Posters are uploaded alongside the JSON as
//! `multipart/form-data` (`payload_json` + `files[n]`) and referenced from the
//! embeds as `attachment://<filename>`.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::{debug, error};

use crate::error::WebhookError;

/// Discord webhook message payload
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebhookMessage {
    /// Plain-text header line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    /// Descriptors for the uploaded `files[n]` parts
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}

/// Discord embed for rich messages
#[derive(Debug, Clone, Default, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    /// ISO 8601 timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: true,
        }
    }

    pub fn block(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentRef {
    pub id: usize,
    pub filename: String,
}

/// File uploaded with a message.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub mime: String,
    pub data: Vec<u8>,
}

impl Attachment {
    /// Value for an embed image pointing at this upload.
    pub fn reference(&self) -> String {
        format!("attachment://{}", self.filename)
    }
}

/// Discord color constants (decimal)
pub mod colors {
    /// Movies - amber
    pub const MOVIE: u32 = 15105570; // #E67E22
    /// TV - blue
    pub const TV: u32 = 3447003; // #3498DB
}

/// Embed and message limits enforced by Discord.
pub mod limits {
    pub const EMBEDS_PER_MESSAGE: usize = 10;
    pub const DESCRIPTION_CHARS: usize = 4096;
    pub const FIELD_VALUE_CHARS: usize = 1024;
    pub const TITLE_CHARS: usize = 256;
}

#[derive(Debug, Clone)]
pub struct DiscordWebhook {
    webhook_url: String,
    client: Client,
}

impl DiscordWebhook {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client: Client::new(),
        }
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Post one message. Uses multipart when there are files to upload.
    pub async fn send(
        &self,
        message: &WebhookMessage,
        attachments: &[Attachment],
    ) -> Result<(), WebhookError> {
        let mut url = Url::parse(&self.webhook_url).map_err(|err| WebhookError::InvalidUrl {
            message: err.to_string(),
        })?;
        url.query_pairs_mut().append_pair("wait", "true");

        let request = if attachments.is_empty() {
            self.client.post(url).json(message)
        } else {
            let payload = serde_json::to_string(message)?;
            let mut form =
                Form::new().part("payload_json", Part::text(payload).mime_str("application/json")?);
            for (index, attachment) in attachments.iter().enumerate() {
                let part = Part::bytes(attachment.data.clone())
                    .file_name(attachment.filename.clone())
                    .mime_str(&attachment.mime)?;
                form = form.part(format!("files[{}]", index), part);
            }
            self.client.post(url).multipart(form)
        };

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Failed to send Discord webhook");
            WebhookError::Http(e)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Discord webhook returned error");
            return Err(WebhookError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            embeds = message.embeds.len(),
            files = attachments.len(),
            "Discord message delivered"
        );
        Ok(())
    }
}
