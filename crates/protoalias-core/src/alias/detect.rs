//! Alias detection.

use crate::model::{Field, Message};

/// Default comment marker that flags a message as an alias
pub const DEFAULT_ALIAS_MARKER: &str = "protobuf:alias";

/// Returns true if a leading comment carries the alias marker
pub fn has_alias_marker(comment: &str, marker: &str) -> bool {
    !marker.is_empty() && comment.contains(marker)
}

/// Returns the sole field of an alias message.
///
/// A message is an alias only when it is marked AND declares exactly one
/// field. A marked message with zero or several fields is an ordinary message.
pub fn alias_payload(message: &Message) -> Option<&Field> {
    if !message.alias {
        return None;
    }
    match message.fields.as_slice() {
        [payload] => Some(payload),
        _ => None,
    }
}

/// Returns the payload of an alias that can be erased from its file.
///
/// An alias whose payload type is declared inside the alias itself (a map
/// entry, nested message or nested enum) stays an ordinary message, since
/// removing it would also remove the payload's type.
pub fn erasable_payload(message: &Message) -> Option<&Field> {
    let payload = alias_payload(message)?;
    let nested = payload.type_name().is_some_and(|name| {
        name.strip_prefix(message.full_name.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    });
    (!nested).then_some(payload)
}
