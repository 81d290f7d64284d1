//! Grouping of embeds into webhook messages.

use crate::notify::discord::{limits, Attachment, AttachmentRef, Embed, WebhookMessage};

/// An embed together with the poster it references, if any.
#[derive(Debug, Clone)]
pub struct PreparedEmbed {
    pub embed: Embed,
    pub attachment: Option<Attachment>,
}

/// A message ready for delivery with the files it uploads.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub message: WebhookMessage,
    pub attachments: Vec<Attachment>,
}

/// Split embeds into messages of at most ten embeds each.
///
/// The header goes on the first message only. Attachment ids restart at zero
/// in every message and match the order of the `files[n]` parts.
pub fn build_messages(header: &str, embeds: Vec<PreparedEmbed>) -> Vec<OutgoingMessage> {
    let mut messages = Vec::new();
    let mut current = OutgoingMessage {
        message: WebhookMessage {
            content: Some(header.to_string()),
            ..Default::default()
        },
        attachments: Vec::new(),
    };

    for prepared in embeds {
        if current.message.embeds.len() == limits::EMBEDS_PER_MESSAGE {
            messages.push(current);
            current = OutgoingMessage {
                message: WebhookMessage::default(),
                attachments: Vec::new(),
            };
        }

        if let Some(attachment) = prepared.attachment {
            current.message.attachments.push(AttachmentRef {
                id: current.attachments.len(),
                filename: attachment.filename.clone(),
            });
            current.attachments.push(attachment);
        }
        current.message.embeds.push(prepared.embed);
    }

    if !current.message.embeds.is_empty() {
        messages.push(current);
    }

    messages
}

/// Truncate to `max` characters, ending with an ellipsis when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
