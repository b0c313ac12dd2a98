//! Message list filtering.

use super::detect::{alias_payload, erasable_payload};
use crate::error::{Error, Result};
use crate::model::Message;
use prost_types::DescriptorProto;
use tracing::{debug, warn};

/// Survivors of a filtering pass, semantic and raw in lock-step
#[derive(Debug, Default)]
pub struct Filtered {
    /// Non-alias messages in original order
    pub messages: Vec<Message>,
    /// Raw messages, index-aligned with `messages`
    pub raw: Vec<DescriptorProto>,
    /// Consumed alias messages in original order
    pub aliases: Vec<Message>,
}

/// Splits a file's top-level messages into survivors and consumed aliases.
///
/// One decision per index drives both lists, so the semantic and raw
/// survivors always have the same length and order. Aliases whose payload
/// type is nested inside them are kept (see [`erasable_payload`]).
pub fn filter_messages(
    file: &str,
    messages: Vec<Message>,
    raw: Vec<DescriptorProto>,
) -> Result<Filtered> {
    if messages.len() != raw.len() {
        return Err(Error::message_mismatch(
            file,
            "<file>",
            messages.len().min(raw.len()),
            format!(
                "{} semantic messages but {} raw messages",
                messages.len(),
                raw.len()
            ),
        ));
    }

    let mut filtered = Filtered {
        messages: Vec::with_capacity(messages.len()),
        raw: Vec::with_capacity(raw.len()),
        aliases: Vec::new(),
    };

    for (message, raw_message) in messages.into_iter().zip(raw) {
        if erasable_payload(&message).is_some() {
            debug!("{}: consuming alias message {}", file, message.full_name);
            filtered.aliases.push(message);
            continue;
        }
        if let Some(payload) = alias_payload(&message) {
            warn!(
                "{}: keeping alias {}: payload type {} is declared inside it",
                file,
                message.full_name,
                payload.type_name().unwrap_or_default()
            );
        }
        filtered.messages.push(message);
        filtered.raw.push(raw_message);
    }

    Ok(filtered)
}
