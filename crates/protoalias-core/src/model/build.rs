//! Builds the semantic model from raw `FileDescriptorProto`s.

use super::{
    Cardinality, Comments, EditionFeatures, Enum, EnumValue, Field, File, Kind, Message, Oneof,
    ProtoSyntax,
};
use crate::alias::has_alias_marker;
use prost_types::source_code_info::Location;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
};
use std::collections::HashMap;
use tracing::{trace, warn};

// FileDescriptorProto / DescriptorProto field numbers used in SourceCodeInfo paths
const FILE_MESSAGE_TYPE: i32 = 4;
const FILE_ENUM_TYPE: i32 = 5;
const MESSAGE_FIELD: i32 = 2;
const MESSAGE_NESTED_TYPE: i32 = 3;
const MESSAGE_ENUM_TYPE: i32 = 4;

/// Comments keyed by SourceCodeInfo location path
struct CommentIndex<'a> {
    locations: HashMap<&'a [i32], &'a Location>,
}

impl<'a> CommentIndex<'a> {
    fn new(proto: &'a FileDescriptorProto) -> Self {
        let locations = proto
            .source_code_info
            .iter()
            .flat_map(|info| info.location.iter())
            .map(|location| (location.path.as_slice(), location))
            .collect();
        Self { locations }
    }

    fn get(&self, path: &[i32]) -> Comments {
        self.locations
            .get(path)
            .map(|location| Comments {
                leading: location.leading_comments().to_string(),
                trailing: location.trailing_comments().to_string(),
            })
            .unwrap_or_default()
    }
}

/// State shared while walking one file
struct Builder<'a> {
    comments: CommentIndex<'a>,
    syntax: ProtoSyntax,
    marker: &'a str,
}

pub(super) fn build_file(proto: FileDescriptorProto, generate: bool, marker: &str) -> File {
    let syntax = ProtoSyntax::try_from(proto.syntax()).unwrap_or_else(|e| {
        warn!("{}: {}, assuming proto2", proto.name(), e);
        ProtoSyntax::Proto2
    });

    let scope = if proto.package().is_empty() {
        String::new()
    } else {
        format!(".{}", proto.package())
    };

    let (messages, enums) = {
        let builder = Builder {
            comments: CommentIndex::new(&proto),
            syntax,
            marker,
        };

        let messages = proto
            .message_type
            .iter()
            .enumerate()
            .map(|(i, message)| builder.message(message, &scope, vec![FILE_MESSAGE_TYPE, i as i32]))
            .collect();
        let enums = proto
            .enum_type
            .iter()
            .enumerate()
            .map(|(i, e)| builder.enumeration(e, &scope, vec![FILE_ENUM_TYPE, i as i32]))
            .collect();
        (messages, enums)
    };

    trace!("Built model for {} ({})", proto.name(), syntax.as_str());

    File {
        name: proto.name().to_string(),
        package: proto.package().to_string(),
        syntax,
        generate,
        messages,
        enums,
        aliases: Vec::new(),
        proto,
    }
}

impl Builder<'_> {
    fn message(&self, proto: &DescriptorProto, scope: &str, path: Vec<i32>) -> Message {
        let full_name = format!("{}.{}", scope, proto.name());
        let comments = self.comments.get(&path);

        let oneofs: Vec<Oneof> = proto
            .oneof_decl
            .iter()
            .enumerate()
            .map(|(i, oneof)| Oneof {
                name: oneof.name().to_string(),
                synthetic: proto.field.iter().any(|f| {
                    f.proto3_optional() && f.oneof_index == Some(i as i32)
                }),
            })
            .collect();

        let fields = proto
            .field
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let mut field_path = path.clone();
                field_path.extend([MESSAGE_FIELD, i as i32]);
                self.field(field, &field_path)
            })
            .collect();

        let nested = proto
            .nested_type
            .iter()
            .enumerate()
            .map(|(i, nested)| {
                let mut nested_path = path.clone();
                nested_path.extend([MESSAGE_NESTED_TYPE, i as i32]);
                self.message(nested, &full_name, nested_path)
            })
            .collect();

        let enums = proto
            .enum_type
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let mut enum_path = path.clone();
                enum_path.extend([MESSAGE_ENUM_TYPE, i as i32]);
                self.enumeration(e, &full_name, enum_path)
            })
            .collect();

        Message {
            name: proto.name().to_string(),
            alias: has_alias_marker(&comments.leading, self.marker),
            map_entry: proto
                .options
                .as_ref()
                .map_or(false, |o| o.map_entry.unwrap_or(false)),
            full_name,
            comments,
            fields,
            oneofs,
            nested,
            enums,
        }
    }

    fn field(&self, proto: &FieldDescriptorProto, path: &[i32]) -> Field {
        let kind = Kind::from(proto.r#type());
        let cardinality = Cardinality::from(proto.label());
        let type_name = proto.type_name.clone().filter(|n| !n.is_empty());

        let (message, enumeration) = match kind {
            Kind::Message | Kind::Group => (type_name, None),
            Kind::Enum => (None, type_name),
            _ => (None, None),
        };

        Field {
            name: proto.name().to_string(),
            number: proto.number(),
            kind,
            cardinality,
            options: proto.options.clone(),
            proto3_optional: proto.proto3_optional(),
            default: proto.default_value.clone(),
            json_name: proto.json_name.clone(),
            features: self.features(proto, kind, cardinality),
            message,
            enumeration,
            oneof: proto.oneof_index.map(|i| i as usize),
            alias: None,
            comments: self.comments.get(path),
        }
    }

    fn features(
        &self,
        proto: &FieldDescriptorProto,
        kind: Kind,
        cardinality: Cardinality,
    ) -> EditionFeatures {
        let repeated = cardinality == Cardinality::Repeated;
        let packed_option = proto.options.as_ref().and_then(|o| o.packed);

        match self.syntax {
            ProtoSyntax::Proto2 => EditionFeatures {
                explicit_presence: !repeated,
                packed: repeated && packed_option.unwrap_or(false),
                utf8_validated: false,
                legacy_required: cardinality == Cardinality::Required,
                delimited: kind == Kind::Group,
            },
            ProtoSyntax::Proto3 => EditionFeatures {
                explicit_presence: !repeated && (proto.proto3_optional() || kind == Kind::Message),
                packed: repeated && packed_option.unwrap_or(kind.is_packable()),
                utf8_validated: true,
                legacy_required: false,
                delimited: false,
            },
            ProtoSyntax::Editions => EditionFeatures {
                explicit_presence: !repeated,
                packed: repeated && packed_option.unwrap_or(kind.is_packable()),
                utf8_validated: true,
                legacy_required: cardinality == Cardinality::Required,
                delimited: kind == Kind::Group,
            },
        }
    }

    fn enumeration(&self, proto: &EnumDescriptorProto, scope: &str, path: Vec<i32>) -> Enum {
        Enum {
            name: proto.name().to_string(),
            full_name: format!("{}.{}", scope, proto.name()),
            comments: self.comments.get(&path),
            values: proto
                .value
                .iter()
                .map(|v| EnumValue {
                    name: v.name().to_string(),
                    number: v.number(),
                })
                .collect(),
        }
    }
}
