//! Type-alias resolution.
//!
//! A message whose leading comment carries the alias marker and which
//! declares exactly one field stands in for that field's type:
//!
//! ```proto
//! // protobuf:alias
//! message UserId {
//!   int64 value = 1;
//! }
//!
//! message User {
//!   UserId id = 1; // resolved to `int64 id = 1;`
//! }
//! ```
//!
//! Resolution runs per file in one forward pass:
//!
//! 1. [`erasable_payload`] classifies every top-level message
//! 2. fields of surviving messages that point at an alias are rebuilt by
//!    [`rewrite_field`] and mirrored onto the raw descriptor by [`sync_raw_field`]
//! 3. [`filter_messages`] drops the aliases from both message lists in lock-step
//!
//! Only one level of aliasing is resolved. A payload that itself points at an
//! alias is carried over as-is, and a field that already went through an alias
//! is never rewritten again, so resolving a resolved file changes nothing.

mod detect;
mod filter;
mod rewrite;
mod sync;

use crate::error::{Error, Result};
use crate::model::{Field, File, Kind, Message, Schema};
use prost_types::DescriptorProto;
use tracing::{debug, trace, warn};

pub use detect::{alias_payload, erasable_payload, has_alias_marker, DEFAULT_ALIAS_MARKER};
pub use filter::{filter_messages, Filtered};
pub use rewrite::rewrite_field;
pub use sync::sync_raw_field;

/// Configuration for alias resolution
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Comment substring that marks a message as an alias
    pub marker: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_ALIAS_MARKER.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the alias marker
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }
}

/// Resolves aliases in files against an immutable [`Schema`]
///
/// Alias payloads are always read from the schema, never from a file being
/// resolved, so the order in which files or fields are processed does not
/// matter.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    schema: &'a Schema,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over the given schema
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Returns a copy of `file` with aliases resolved.
    ///
    /// Fails with [`Error::MirrorMismatch`] when the semantic model and the
    /// raw descriptor do not line up; nothing of the file should be emitted
    /// in that case.
    pub fn resolve_file(&self, file: &File) -> Result<File> {
        let mut messages = file.messages.clone();
        let mut raw = file.proto.message_type.clone();

        if messages.len() != raw.len() {
            return Err(Error::message_mismatch(
                &file.name,
                "<file>",
                messages.len().min(raw.len()),
                format!(
                    "{} semantic messages but {} raw messages",
                    messages.len(),
                    raw.len()
                ),
            ));
        }

        let mut rewritten = 0;
        for (index, (message, raw_message)) in messages.iter_mut().zip(raw.iter_mut()).enumerate()
        {
            if erasable_payload(message).is_some() {
                continue;
            }
            rewritten += self.rewrite_message(&file.name, index, message, raw_message)?;
        }

        let filtered = filter_messages(&file.name, messages, raw)?;

        let mut proto = file.proto.clone();
        proto.message_type = filtered.raw;
        if !filtered.aliases.is_empty() {
            // Location paths index into message_type and would point at the wrong messages
            proto.source_code_info = None;
        }

        let mut aliases = file.aliases.clone();
        aliases.extend(filtered.aliases);

        debug!(
            "{}: rewrote {} field(s), consumed {} alias message(s)",
            file.name,
            rewritten,
            aliases.len() - file.aliases.len()
        );

        Ok(File {
            messages: filtered.messages,
            aliases,
            proto,
            ..file.clone()
        })
    }

    /// Rewrites the referencing fields of one surviving message
    fn rewrite_message(
        &self,
        file: &str,
        index: usize,
        message: &mut Message,
        raw: &mut DescriptorProto,
    ) -> Result<usize> {
        if raw.name() != message.name {
            return Err(Error::message_mismatch(
                file,
                &message.name,
                index,
                format!("raw message is named '{}'", raw.name()),
            ));
        }

        let raw_len = raw.field.len();
        let mut rewritten = 0;
        let mut left_oneof = false;

        for (field_index, field) in message.fields.iter_mut().enumerate() {
            let Some((target, payload)) = self.alias_target(field) else {
                continue;
            };

            let position = || ((message.name.as_str(), index), (field.name.as_str(), field_index));
            let raw_field = match raw.field.get_mut(field_index) {
                Some(raw_field) if raw_field.name() == field.name => raw_field,
                Some(raw_field) => {
                    let (msg, fld) = position();
                    return Err(Error::field_mismatch(
                        file,
                        msg,
                        fld,
                        format!("raw field is named '{}'", raw_field.name()),
                    ));
                }
                None => {
                    let (msg, fld) = position();
                    return Err(Error::field_mismatch(
                        file,
                        msg,
                        fld,
                        format!("raw message has {} field(s)", raw_len),
                    ));
                }
            };

            if payload.kind == Kind::Message
                && payload
                    .message
                    .as_deref()
                    .and_then(|name| self.schema.message(name))
                    .and_then(erasable_payload)
                    .is_some()
            {
                warn!(
                    "{}: {}.{} resolves to {} which is itself an alias; only one level is resolved",
                    file,
                    message.name,
                    field.name,
                    payload.message.as_deref().unwrap_or_default()
                );
            }

            trace!(
                "{}: {}.{} -> {:?} (alias {})",
                file,
                message.name,
                field.name,
                payload.kind,
                target.name
            );

            left_oneof |= field.oneof.is_some();
            *field = rewrite_field(field, payload, target.ident());
            sync_raw_field(raw_field, field);
            rewritten += 1;
        }

        if left_oneof {
            prune_oneofs(file, index, message, raw)?;
        }

        Ok(rewritten)
    }

    /// Returns the alias message a field points at, with its payload
    fn alias_target(&self, field: &Field) -> Option<(&'a Message, &'a Field)> {
        if field.kind != Kind::Message || field.alias.is_some() {
            return None;
        }
        let target = self.schema.message(field.message.as_deref()?)?;
        let payload = erasable_payload(target)?;
        Some((target, payload))
    }
}

/// Drops oneofs that no longer have members, renumbering both mirrors.
///
/// A rewritten field leaves its oneof; a synthetic oneof, or a real one whose
/// only member was rewritten, would otherwise be left empty.
fn prune_oneofs(
    file: &str,
    index: usize,
    message: &mut Message,
    raw: &mut DescriptorProto,
) -> Result<()> {
    if raw.oneof_decl.len() != message.oneofs.len() {
        return Err(Error::message_mismatch(
            file,
            &message.name,
            index,
            format!(
                "{} semantic oneofs but {} raw oneofs",
                message.oneofs.len(),
                raw.oneof_decl.len()
            ),
        ));
    }

    let used: Vec<bool> = (0..message.oneofs.len())
        .map(|i| message.fields.iter().any(|f| f.oneof == Some(i)))
        .collect();
    if used.iter().all(|&u| u) {
        return Ok(());
    }

    let mut next = 0;
    let remap: Vec<Option<usize>> = used
        .iter()
        .map(|&u| {
            u.then(|| {
                next += 1;
                next - 1
            })
        })
        .collect();
    let renumber = |oneof: usize| remap.get(oneof).copied().flatten();

    message.oneofs = std::mem::take(&mut message.oneofs)
        .into_iter()
        .zip(&used)
        .filter_map(|(oneof, &u)| u.then_some(oneof))
        .collect();
    raw.oneof_decl = std::mem::take(&mut raw.oneof_decl)
        .into_iter()
        .zip(&used)
        .filter_map(|(oneof, &u)| u.then_some(oneof))
        .collect();

    for field in &mut message.fields {
        field.oneof = field.oneof.and_then(renumber);
    }
    for field in &mut raw.field {
        field.oneof_index = field
            .oneof_index
            .and_then(|i| renumber(i as usize))
            .map(|i| i as i32);
    }

    trace!(
        "{}: {} keeps {} of {} oneof(s)",
        file,
        message.name,
        message.oneofs.len(),
        used.len()
    );
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{Cardinality, Comments, EditionFeatures, Ident};
    use pretty_assertions::assert_eq;
    use prost::Message as _;
    use prost_types::field_descriptor_proto::{Label, Type};
    use prost_types::source_code_info::Location;
    use prost_types::{
        EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto, FieldOptions,
        FileDescriptorProto, FileDescriptorSet, MessageOptions, OneofDescriptorProto,
        SourceCodeInfo,
    };

    pub(crate) fn scalar(name: &str, kind: Kind) -> Field {
        Field {
            name: name.to_string(),
            number: 1,
            kind,
            cardinality: Cardinality::Optional,
            options: None,
            proto3_optional: false,
            default: None,
            json_name: None,
            features: EditionFeatures::default(),
            message: None,
            enumeration: None,
            oneof: None,
            alias: None,
            comments: Comments::default(),
        }
    }

    pub(crate) fn message_field(name: &str, target: &str) -> Field {
        Field {
            message: Some(target.to_string()),
            ..scalar(name, Kind::Message)
        }
    }

    pub(crate) fn message(name: &str, alias: bool, fields: Vec<Field>) -> Message {
        Message {
            name: name.to_string(),
            full_name: format!(".{name}"),
            comments: Comments::default(),
            alias,
            map_entry: false,
            fields,
            oneofs: Vec::new(),
            nested: Vec::new(),
            enums: Vec::new(),
        }
    }

    pub(crate) fn raw_message(name: &str, fields: usize) -> DescriptorProto {
        DescriptorProto {
            name: Some(name.to_string()),
            field: (0..fields)
                .map(|i| FieldDescriptorProto {
                    name: Some(format!("f{i}")),
                    number: Some(i as i32 + 1),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn raw_field(name: &str, number: i32, label: Label, ty: Type) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            label: Some(label as i32),
            r#type: Some(ty as i32),
            ..Default::default()
        }
    }

    fn raw_ref(name: &str, number: i32, ty: Type, target: &str) -> FieldDescriptorProto {
        FieldDescriptorProto {
            type_name: Some(target.to_string()),
            ..raw_field(name, number, Label::Optional, ty)
        }
    }

    fn marked(index: i32) -> Location {
        Location {
            path: vec![4, index],
            leading_comments: Some(" protobuf:alias\n".to_string()),
            ..Default::default()
        }
    }

    /// Wrapper, Ids, Empty and StatusAlias are marked; Holder uses all of them.
    pub(crate) fn shop_proto() -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some("shop.proto".to_string()),
            package: Some("shop".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![
                DescriptorProto {
                    name: Some("Wrapper".to_string()),
                    field: vec![raw_field("value", 1, Label::Optional, Type::Int32)],
                    ..Default::default()
                },
                DescriptorProto {
                    name: Some("Holder".to_string()),
                    field: vec![
                        raw_ref("w", 1, Type::Message, ".shop.Wrapper"),
                        raw_field("name", 2, Label::Optional, Type::String),
                        raw_ref("ids", 3, Type::Message, ".shop.Ids"),
                        raw_ref("status", 4, Type::Message, ".shop.StatusAlias"),
                        raw_ref("empty", 5, Type::Message, ".shop.Empty"),
                    ],
                    ..Default::default()
                },
                DescriptorProto {
                    name: Some("Ids".to_string()),
                    field: vec![FieldDescriptorProto {
                        options: Some(FieldOptions {
                            packed: Some(true),
                            ..Default::default()
                        }),
                        ..raw_field("values", 1, Label::Repeated, Type::Int64)
                    }],
                    ..Default::default()
                },
                DescriptorProto {
                    name: Some("Empty".to_string()),
                    ..Default::default()
                },
                DescriptorProto {
                    name: Some("StatusAlias".to_string()),
                    field: vec![raw_ref("value", 1, Type::Enum, ".shop.Status")],
                    ..Default::default()
                },
            ],
            enum_type: vec![EnumDescriptorProto {
                name: Some("Status".to_string()),
                value: vec![EnumValueDescriptorProto {
                    name: Some("STATUS_UNKNOWN".to_string()),
                    number: Some(0),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            source_code_info: Some(SourceCodeInfo {
                location: vec![marked(0), marked(2), marked(3), marked(4)],
            }),
            ..Default::default()
        }
    }

    fn shop_schema() -> Schema {
        Schema::from_protos(
            vec![shop_proto()],
            &["shop.proto".to_string()],
            &ResolverConfig::default(),
        )
    }

    fn schema_of(proto: FileDescriptorProto) -> Schema {
        Schema::from_protos(vec![proto], &["shop.proto".to_string()], &ResolverConfig::default())
    }

    /// Adds an Outer alias whose payload is the Wrapper alias, used by Holder.outer
    fn chain_proto() -> FileDescriptorProto {
        let mut proto = shop_proto();
        proto.message_type.push(DescriptorProto {
            name: Some("Outer".to_string()),
            field: vec![raw_ref("value", 1, Type::Message, ".shop.Wrapper")],
            ..Default::default()
        });
        proto.message_type[1]
            .field
            .push(raw_ref("outer", 6, Type::Message, ".shop.Outer"));
        if let Some(info) = proto.source_code_info.as_mut() {
            info.location.push(marked(5));
        }
        proto
    }

    fn resolve(schema: &Schema, name: &str) -> File {
        let file = schema.file(name).unwrap();
        Resolver::new(schema).resolve_file(file).unwrap()
    }

    #[test]
    fn test_resolver_config_builder() {
        assert_eq!(ResolverConfig::new().marker, "protobuf:alias");
        assert_eq!(ResolverConfig::new().marker("@alias").marker, "@alias");
    }

    #[test]
    fn test_scalar_alias_scenario() {
        let schema = shop_schema();
        let file = resolve(&schema, "shop.proto");

        assert!(file.messages.iter().all(|m| m.name != "Wrapper"));
        assert!(file.aliases.iter().any(|m| m.name == "Wrapper"));

        let holder = &file.messages[0];
        assert_eq!(holder.name, "Holder");
        let w = &holder.fields[0];
        assert_eq!(w.kind, Kind::Int32);
        assert_eq!(w.cardinality, Cardinality::Optional);
        assert_eq!(w.message, None);
        assert_eq!(
            w.alias,
            Some(Ident {
                name: "Wrapper".to_string(),
                full_name: ".shop.Wrapper".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_marked_message_survives() {
        let schema = shop_schema();
        let original = schema.message(".shop.Empty").unwrap().clone();
        let file = resolve(&schema, "shop.proto");

        let empty = file.messages.iter().find(|m| m.name == "Empty").unwrap();
        assert_eq!(empty, &original);

        let holder = &file.messages[0];
        assert_eq!(holder.fields[4].kind, Kind::Message);
        assert_eq!(holder.fields[4].message.as_deref(), Some(".shop.Empty"));
        assert_eq!(holder.fields[4].alias, None);
    }

    #[test]
    fn test_survivor_lists_stay_aligned() {
        let schema = shop_schema();
        let file = resolve(&schema, "shop.proto");

        let names: Vec<_> = file.messages.iter().map(|m| m.name.as_str()).collect();
        let raw_names: Vec<_> = file.proto.message_type.iter().map(|m| m.name()).collect();
        let aliases: Vec<_> = file.aliases.iter().map(|m| m.name.as_str()).collect();

        assert_eq!(names, vec!["Holder", "Empty"]);
        assert_eq!(raw_names, names);
        assert_eq!(aliases, vec!["Wrapper", "Ids", "StatusAlias"]);
        assert!(file.proto.source_code_info.is_none());
    }

    #[test]
    fn test_raw_fields_match_semantic_fields() {
        let schema = shop_schema();
        let file = resolve(&schema, "shop.proto");

        for (message, raw) in file.messages.iter().zip(&file.proto.message_type) {
            assert_eq!(message.fields.len(), raw.field.len());
            for (field, raw_field) in message.fields.iter().zip(&raw.field) {
                assert_eq!(raw_field.r#type(), Type::from(field.kind));
                assert_eq!(raw_field.label(), Label::from(field.cardinality));
                match field.kind {
                    Kind::Message | Kind::Enum => {
                        assert!(!raw_field.type_name().is_empty());
                        assert_eq!(Some(raw_field.type_name()), field.type_name());
                    }
                    _ => assert_eq!(raw_field.type_name, None),
                }
            }
        }
    }

    #[test]
    fn test_repeated_and_enum_payloads() {
        let schema = shop_schema();
        let file = resolve(&schema, "shop.proto");
        let holder = &file.messages[0];
        let raw_holder = &file.proto.message_type[0];

        let ids = &holder.fields[2];
        assert_eq!(ids.kind, Kind::Int64);
        assert_eq!(ids.cardinality, Cardinality::Repeated);
        assert_eq!(ids.options.as_ref().and_then(|o| o.packed), Some(true));
        assert_eq!(raw_holder.field[2].options.as_ref().and_then(|o| o.packed), Some(true));
        assert_eq!(raw_holder.field[2].label(), Label::Repeated);

        let status = &holder.fields[3];
        assert_eq!(status.kind, Kind::Enum);
        assert_eq!(status.enumeration.as_deref(), Some(".shop.Status"));
        assert_eq!(raw_holder.field[3].type_name(), ".shop.Status");
        assert_eq!(status.alias.as_ref().map(|a| a.name.as_str()), Some("StatusAlias"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        for schema in [shop_schema(), schema_of(chain_proto())] {
            let once = resolve(&schema, "shop.proto");
            let twice = Resolver::new(&schema).resolve_file(&once).unwrap();
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn test_chain_is_not_resolved_further_on_second_pass() {
        let schema = schema_of(chain_proto());
        let once = resolve(&schema, "shop.proto");
        let twice = Resolver::new(&schema).resolve_file(&once).unwrap();

        let outer = &twice.messages[0].fields[5];
        assert_eq!(outer.kind, Kind::Message);
        assert_eq!(outer.message.as_deref(), Some(".shop.Wrapper"));
        assert_eq!(outer.alias.as_ref().map(|a| a.name.as_str()), Some("Outer"));
        assert_eq!(
            twice.proto.message_type[0].field[5].type_name(),
            ".shop.Wrapper"
        );
    }

    #[test]
    fn test_input_schema_is_untouched() {
        let schema = shop_schema();
        let before = schema.file("shop.proto").unwrap().clone();
        let _ = resolve(&schema, "shop.proto");
        assert_eq!(schema.file("shop.proto").unwrap(), &before);
    }

    #[test]
    fn test_alias_from_dependency() {
        let types = FileDescriptorProto {
            name: Some("types.proto".to_string()),
            package: Some("types".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Money".to_string()),
                field: vec![raw_field("cents", 1, Label::Optional, Type::Sint64)],
                ..Default::default()
            }],
            source_code_info: Some(SourceCodeInfo {
                location: vec![marked(0)],
            }),
            ..Default::default()
        };
        let order = FileDescriptorProto {
            name: Some("order.proto".to_string()),
            package: Some("order".to_string()),
            dependency: vec!["types.proto".to_string()],
            syntax: Some("proto3".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Order".to_string()),
                field: vec![raw_ref("total", 1, Type::Message, ".types.Money")],
                ..Default::default()
            }],
            ..Default::default()
        };
        let schema = Schema::from_protos(
            vec![types, order],
            &["order.proto".to_string()],
            &ResolverConfig::default(),
        );

        let file = resolve(&schema, "order.proto");
        assert_eq!(file.messages[0].fields[0].kind, Kind::Sint64);
        assert_eq!(file.proto.message_type[0].field[0].r#type(), Type::Sint64);
        // Aliases defined elsewhere are not collected here
        assert!(file.aliases.is_empty());
    }

    #[test]
    fn test_single_level_only() {
        let schema = schema_of(chain_proto());
        let file = resolve(&schema, "shop.proto");

        let outer = &file.messages[0].fields[5];
        assert_eq!(outer.kind, Kind::Message);
        assert_eq!(outer.message.as_deref(), Some(".shop.Wrapper"));
        assert_eq!(outer.alias.as_ref().map(|a| a.name.as_str()), Some("Outer"));
    }

    #[test]
    fn test_misaligned_raw_field_is_fatal() {
        let schema = shop_schema();
        let mut file = schema.file("shop.proto").unwrap().clone();
        file.proto.message_type[1].field.truncate(1);

        let err = Resolver::new(&schema).resolve_file(&file).unwrap_err();
        let msg = err.to_string();
        assert!(err.is_file_scoped());
        assert!(msg.contains("Holder[1]"));
        assert!(msg.contains("ids[2]"));
    }

    #[test]
    fn test_misaligned_raw_message_is_fatal() {
        let schema = shop_schema();
        let mut file = schema.file("shop.proto").unwrap().clone();
        file.proto.message_type.swap(1, 3);

        let err = Resolver::new(&schema).resolve_file(&file).unwrap_err();
        assert!(err.to_string().contains("raw message is named 'Empty'"));

        file.proto.message_type.pop();
        let err = Resolver::new(&schema).resolve_file(&file).unwrap_err();
        assert!(err.to_string().contains("5 semantic messages but 4 raw messages"));
    }

    #[test]
    fn test_resolved_descriptor_still_builds() {
        let schema = shop_schema();
        let file = resolve(&schema, "shop.proto");

        let set = FileDescriptorSet {
            file: vec![file.proto.clone()],
        };
        let pool = prost_reflect::DescriptorPool::decode(set.encode_to_vec().as_slice()).unwrap();
        let holder = pool.get_message_by_name("shop.Holder").unwrap();

        let w = holder.get_field_by_name("w").unwrap();
        assert!(matches!(w.kind(), prost_reflect::Kind::Int32));
        assert!(holder.get_field_by_name("ids").unwrap().is_list());
        assert!(pool.get_message_by_name("shop.Wrapper").is_none());
    }

    #[test]
    fn test_alias_with_map_payload_is_kept() {
        let mut proto = shop_proto();
        // Tags { map<string, string> value = 1; }
        proto.message_type.push(DescriptorProto {
            name: Some("Tags".to_string()),
            field: vec![FieldDescriptorProto {
                type_name: Some(".shop.Tags.ValueEntry".to_string()),
                ..raw_field("value", 1, Label::Repeated, Type::Message)
            }],
            nested_type: vec![DescriptorProto {
                name: Some("ValueEntry".to_string()),
                field: vec![
                    raw_field("key", 1, Label::Optional, Type::String),
                    raw_field("value", 2, Label::Optional, Type::String),
                ],
                options: Some(MessageOptions {
                    map_entry: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        });
        proto.message_type[1]
            .field
            .push(raw_ref("tags", 6, Type::Message, ".shop.Tags"));
        if let Some(info) = proto.source_code_info.as_mut() {
            info.location.push(marked(5));
        }

        let schema = schema_of(proto);
        let file = resolve(&schema, "shop.proto");

        assert!(file.messages.iter().any(|m| m.name == "Tags"));
        assert!(file.aliases.iter().all(|m| m.name != "Tags"));

        let tags = &file.messages[0].fields[5];
        assert_eq!(tags.kind, Kind::Message);
        assert_eq!(tags.message.as_deref(), Some(".shop.Tags"));
        assert_eq!(tags.alias, None);
        assert_eq!(file.proto.message_type[0].field[5].type_name(), ".shop.Tags");

        let pool = crate::validate::validate(&[file.proto.clone()]).unwrap();
        assert!(pool.get_message_by_name("shop.Tags.ValueEntry").is_some());
    }

    #[test]
    fn test_optional_field_leaves_synthetic_oneof() {
        let mut proto = shop_proto();
        // optional Ids ids = 3; oneof choice { string name = 2; }
        let holder = &mut proto.message_type[1];
        holder.field[1].oneof_index = Some(1);
        holder.field[2].oneof_index = Some(0);
        holder.field[2].proto3_optional = Some(true);
        holder.oneof_decl = vec![
            OneofDescriptorProto {
                name: Some("_ids".to_string()),
                ..Default::default()
            },
            OneofDescriptorProto {
                name: Some("choice".to_string()),
                ..Default::default()
            },
        ];

        let schema = schema_of(proto);
        let file = resolve(&schema, "shop.proto");
        let holder = &file.messages[0];
        let raw_holder = &file.proto.message_type[0];

        let ids = &holder.fields[2];
        assert_eq!(ids.cardinality, Cardinality::Repeated);
        assert_eq!(ids.oneof, None);
        assert_eq!(raw_holder.field[2].label(), Label::Repeated);
        assert_eq!(raw_holder.field[2].oneof_index, None);
        assert_eq!(raw_holder.field[2].proto3_optional, None);

        let oneofs: Vec<_> = holder.oneofs.iter().map(|o| o.name.as_str()).collect();
        let raw_oneofs: Vec<_> = raw_holder.oneof_decl.iter().map(|o| o.name()).collect();
        assert_eq!(oneofs, vec!["choice"]);
        assert_eq!(raw_oneofs, oneofs);
        assert_eq!(holder.fields[1].oneof, Some(0));
        assert_eq!(raw_holder.field[1].oneof_index, Some(0));

        crate::validate::validate(&[file.proto.clone()]).unwrap();
    }

    #[test]
    fn test_real_oneof_keeps_remaining_members() {
        let mut proto = shop_proto();
        // oneof choice { Wrapper w = 1; string name = 2; }
        let holder = &mut proto.message_type[1];
        holder.field[0].oneof_index = Some(0);
        holder.field[1].oneof_index = Some(0);
        holder.oneof_decl = vec![OneofDescriptorProto {
            name: Some("choice".to_string()),
            ..Default::default()
        }];

        let schema = schema_of(proto);
        let file = resolve(&schema, "shop.proto");
        let holder = &file.messages[0];
        let raw_holder = &file.proto.message_type[0];

        assert_eq!(holder.fields[0].oneof, None);
        assert_eq!(raw_holder.field[0].oneof_index, None);
        assert_eq!(holder.fields[1].oneof, Some(0));
        assert_eq!(raw_holder.field[1].oneof_index, Some(0));
        assert_eq!(raw_holder.oneof_decl.len(), 1);

        let once = file.clone();
        assert_eq!(Resolver::new(&schema).resolve_file(&once).unwrap(), once);
    }
}
