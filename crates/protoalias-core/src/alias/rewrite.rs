//! Field rewriting for fields that reference an alias message.

use crate::model::{Field, Ident};

/// Builds the rewritten form of a referencing field.
///
/// The type-defining attributes (kind, cardinality, options, proto3 optional,
/// default, features and the payload's own message/enum reference) are taken
/// from `payload` in one step. Name, number, JSON name and comments stay those
/// of `field`. The result records `alias` as its alias identifier and is never
/// part of a oneof.
pub fn rewrite_field(field: &Field, payload: &Field, alias: Ident) -> Field {
    Field {
        name: field.name.clone(),
        number: field.number,
        json_name: field.json_name.clone(),
        comments: field.comments.clone(),
        kind: payload.kind,
        cardinality: payload.cardinality,
        options: payload.options.clone(),
        proto3_optional: payload.proto3_optional,
        default: payload.default.clone(),
        features: payload.features,
        message: payload.message.clone(),
        enumeration: payload.enumeration.clone(),
        oneof: None,
        alias: Some(alias),
    }
}
