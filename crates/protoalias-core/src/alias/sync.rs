//! Raw descriptor synchronization.
//!
//! Mirrors a rewritten semantic [`Field`] onto its raw
//! `FieldDescriptorProto` so the descriptor embedded for runtime reflection
//! describes exactly what the generator emitted.

use crate::model::Field;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{FieldDescriptorProto, FieldOptions};

/// Copies the type-defining attributes of `field` onto `raw`.
///
/// The type name follows the rewritten field's own reference, so it names the
/// payload's target for message and enum payloads and is cleared for scalars.
/// Options are copied when non-empty and cleared otherwise.
///
/// Oneof membership follows the field as well. The raw proto3 optional flag
/// is only kept on fields that are still inside a (synthetic) oneof, since a
/// descriptor with a proto3 optional field outside any oneof does not build.
/// Emptied oneof declarations are pruned by the resolver afterwards.
pub fn sync_raw_field(raw: &mut FieldDescriptorProto, field: &Field) {
    raw.set_type(Type::from(field.kind));
    raw.set_label(Label::from(field.cardinality));
    raw.type_name = field.type_name().map(str::to_string);
    raw.default_value = field.default.clone();
    raw.options = field
        .options
        .as_ref()
        .filter(|options| **options != FieldOptions::default())
        .cloned();
    raw.oneof_index = field.oneof.map(|i| i as i32);
    raw.proto3_optional = (field.proto3_optional && field.oneof.is_some()).then_some(true);
}
