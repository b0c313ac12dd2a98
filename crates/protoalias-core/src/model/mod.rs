//! Semantic descriptor model.
//!
//! This module holds the object graph code generators consume: files,
//! messages, fields and enums with resolved qualified names, comments and
//! edition features. Every [`File`] also owns its raw `FileDescriptorProto`
//! mirror, which stays index-aligned with the semantic messages and fields.
//!
//! The graph is built once per request by [`Schema::from_protos`] and never
//! mutated afterwards; alias resolution produces new [`File`] values instead.

mod build;

use crate::error::{Error, Result};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{FieldOptions, FileDescriptorProto};
use std::collections::HashMap;
use tracing::debug;

use crate::ResolverConfig;

/// Proto syntax version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoSyntax {
    /// Proto2 syntax
    Proto2,
    /// Proto3 syntax
    Proto3,
    /// Editions syntax
    Editions,
}

impl ProtoSyntax {
    /// Returns the syntax declaration string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtoSyntax::Proto2 => "proto2",
            ProtoSyntax::Proto3 => "proto3",
            ProtoSyntax::Editions => "editions",
        }
    }
}

impl TryFrom<&str> for ProtoSyntax {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "" | "proto2" => Ok(ProtoSyntax::Proto2),
            "proto3" => Ok(ProtoSyntax::Proto3),
            "editions" => Ok(ProtoSyntax::Editions),
            _ => Err(Error::UnsupportedSyntax {
                syntax: value.to_string(),
            }),
        }
    }
}

/// The declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Kind {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Group,
    Message,
    Bytes,
    Uint32,
    Enum,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

impl Kind {
    /// Returns true for kinds that reference another named type
    pub fn is_named(&self) -> bool {
        matches!(self, Kind::Message | Kind::Group | Kind::Enum)
    }

    /// Returns true for kinds that may use packed encoding when repeated
    pub fn is_packable(&self) -> bool {
        !matches!(
            self,
            Kind::String | Kind::Bytes | Kind::Message | Kind::Group
        )
    }

    /// Returns the proto keyword for scalar kinds
    pub fn keyword(&self) -> Option<&'static str> {
        let keyword = match self {
            Kind::Double => "double",
            Kind::Float => "float",
            Kind::Int64 => "int64",
            Kind::Uint64 => "uint64",
            Kind::Int32 => "int32",
            Kind::Fixed64 => "fixed64",
            Kind::Fixed32 => "fixed32",
            Kind::Bool => "bool",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Uint32 => "uint32",
            Kind::Sfixed32 => "sfixed32",
            Kind::Sfixed64 => "sfixed64",
            Kind::Sint32 => "sint32",
            Kind::Sint64 => "sint64",
            Kind::Group | Kind::Message | Kind::Enum => return None,
        };
        Some(keyword)
    }
}

impl From<Type> for Kind {
    fn from(value: Type) -> Self {
        match value {
            Type::Double => Kind::Double,
            Type::Float => Kind::Float,
            Type::Int64 => Kind::Int64,
            Type::Uint64 => Kind::Uint64,
            Type::Int32 => Kind::Int32,
            Type::Fixed64 => Kind::Fixed64,
            Type::Fixed32 => Kind::Fixed32,
            Type::Bool => Kind::Bool,
            Type::String => Kind::String,
            Type::Group => Kind::Group,
            Type::Message => Kind::Message,
            Type::Bytes => Kind::Bytes,
            Type::Uint32 => Kind::Uint32,
            Type::Enum => Kind::Enum,
            Type::Sfixed32 => Kind::Sfixed32,
            Type::Sfixed64 => Kind::Sfixed64,
            Type::Sint32 => Kind::Sint32,
            Type::Sint64 => Kind::Sint64,
        }
    }
}

impl From<Kind> for Type {
    fn from(value: Kind) -> Self {
        match value {
            Kind::Double => Type::Double,
            Kind::Float => Type::Float,
            Kind::Int64 => Type::Int64,
            Kind::Uint64 => Type::Uint64,
            Kind::Int32 => Type::Int32,
            Kind::Fixed64 => Type::Fixed64,
            Kind::Fixed32 => Type::Fixed32,
            Kind::Bool => Type::Bool,
            Kind::String => Type::String,
            Kind::Group => Type::Group,
            Kind::Message => Type::Message,
            Kind::Bytes => Type::Bytes,
            Kind::Uint32 => Type::Uint32,
            Kind::Enum => Type::Enum,
            Kind::Sfixed32 => Type::Sfixed32,
            Kind::Sfixed64 => Type::Sfixed64,
            Kind::Sint32 => Type::Sint32,
            Kind::Sint64 => Type::Sint64,
        }
    }
}

/// Field cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Singular field
    Optional,
    /// Proto2 required field
    Required,
    /// Repeated field
    Repeated,
}

impl From<Label> for Cardinality {
    fn from(value: Label) -> Self {
        match value {
            Label::Optional => Cardinality::Optional,
            Label::Required => Cardinality::Required,
            Label::Repeated => Cardinality::Repeated,
        }
    }
}

impl From<Cardinality> for Label {
    fn from(value: Cardinality) -> Self {
        match value {
            Cardinality::Optional => Label::Optional,
            Cardinality::Required => Label::Required,
            Cardinality::Repeated => Label::Repeated,
        }
    }
}

/// Resolved per-field edition features
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditionFeatures {
    /// Field tracks presence explicitly
    pub explicit_presence: bool,
    /// Repeated scalars use packed encoding
    pub packed: bool,
    /// Strings are validated as UTF-8 on parse
    pub utf8_validated: bool,
    /// Field is a proto2-style required field
    pub legacy_required: bool,
    /// Message is encoded with group delimiters
    pub delimited: bool,
}

/// Leading and trailing comments attached to a declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    /// Comment block directly above the declaration
    pub leading: String,
    /// Comment after the declaration on the same line
    pub trailing: String,
}

/// A named type identifier as downstream generators render it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    /// Simple name, e.g. `Wrapper`
    pub name: String,
    /// Qualified name with leading dot, e.g. `.shop.Wrapper`
    pub full_name: String,
}

/// A message field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field number
    pub number: i32,
    /// Declared kind
    pub kind: Kind,
    /// Declared cardinality
    pub cardinality: Cardinality,
    /// Field options as declared
    pub options: Option<FieldOptions>,
    /// Proto3 `optional` keyword was used
    pub proto3_optional: bool,
    /// Default value (proto2)
    pub default: Option<String>,
    /// Explicit JSON name, if any
    pub json_name: Option<String>,
    /// Resolved edition features
    pub features: EditionFeatures,
    /// Qualified name of the referenced message (message and group kinds)
    pub message: Option<String>,
    /// Qualified name of the referenced enum
    pub enumeration: Option<String>,
    /// Index into the owning message's oneofs
    pub oneof: Option<usize>,
    /// Original message identifier when this field was rewritten from an alias
    pub alias: Option<Ident>,
    /// Comments
    pub comments: Comments,
}

impl Field {
    /// Qualified name of the message or enum this field points at
    pub fn type_name(&self) -> Option<&str> {
        match self.kind {
            Kind::Message | Kind::Group => self.message.as_deref(),
            Kind::Enum => self.enumeration.as_deref(),
            _ => None,
        }
    }
}

/// A oneof declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oneof {
    /// Oneof name
    pub name: String,
    /// Synthetic oneof generated for a proto3 `optional` field
    pub synthetic: bool,
}

/// An enum value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Value name
    pub name: String,
    /// Value number
    pub number: i32,
}

/// An enum declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enum {
    /// Simple name
    pub name: String,
    /// Qualified name with leading dot
    pub full_name: String,
    /// Comments
    pub comments: Comments,
    /// Values in declaration order
    pub values: Vec<EnumValue>,
}

/// A message declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Simple name
    pub name: String,
    /// Qualified name with leading dot
    pub full_name: String,
    /// Comments
    pub comments: Comments,
    /// The leading comment carries the alias marker
    pub alias: bool,
    /// Synthetic map entry message
    pub map_entry: bool,
    /// Fields in declaration order
    pub fields: Vec<Field>,
    /// Oneof declarations
    pub oneofs: Vec<Oneof>,
    /// Nested messages
    pub nested: Vec<Message>,
    /// Nested enums
    pub enums: Vec<Enum>,
}

impl Message {
    /// Returns this message's identifier
    pub fn ident(&self) -> Ident {
        Ident {
            name: self.name.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

/// A schema file with its semantic model and raw mirror
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    /// File name as passed by protoc, e.g. `shop/v1/shop.proto`
    pub name: String,
    /// Proto package
    pub package: String,
    /// Syntax
    pub syntax: ProtoSyntax,
    /// Marked for generation in this request
    pub generate: bool,
    /// Top-level messages, index-aligned with `proto.message_type`
    pub messages: Vec<Message>,
    /// Top-level enums
    pub enums: Vec<Enum>,
    /// Alias messages consumed by resolution
    pub aliases: Vec<Message>,
    /// Raw descriptor mirror
    pub proto: FileDescriptorProto,
}

impl File {
    /// Returns the output path for a generated artifact
    ///
    /// With `import_paths` the `go_package` import path, if present, is used
    /// as the output directory, matching how Go-oriented plugins lay out files.
    pub fn output_filename(&self, import_paths: bool, suffix: &str) -> String {
        let stem = self.name.strip_suffix(".proto").unwrap_or(&self.name);
        let source_relative = format!("{stem}{suffix}");
        if !import_paths {
            return source_relative;
        }

        if let Some(go_package) = self.proto.options.as_ref().and_then(|o| o.go_package.as_ref()) {
            // go_package can be "import/path;package_name" or just "import/path"
            let import_path = go_package.split(';').next().unwrap_or_default();
            if !import_path.is_empty() {
                let base = std::path::Path::new(&source_relative)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(&source_relative);
                return format!("{}/{}", import_path, base);
            }
        }
        source_relative
    }
}

/// Location of a message inside the schema: file index, then the nesting path
#[derive(Debug, Clone)]
struct MessageLocation {
    file: usize,
    path: Vec<usize>,
}

/// All files of a request with a qualified-name index over their messages
#[derive(Debug, Clone)]
pub struct Schema {
    files: Vec<File>,
    index: HashMap<String, MessageLocation>,
}

impl Schema {
    /// Builds the semantic model for every file of a request
    pub fn from_protos(
        protos: Vec<FileDescriptorProto>,
        files_to_generate: &[String],
        config: &ResolverConfig,
    ) -> Self {
        let files = protos
            .into_iter()
            .map(|proto| {
                let generate = files_to_generate.iter().any(|f| f == proto.name());
                build::build_file(proto, generate, &config.marker)
            })
            .collect();

        Self::from_files(files)
    }

    /// Indexes already-built files
    pub fn from_files(files: Vec<File>) -> Self {
        let mut index = HashMap::new();
        for (file_idx, file) in files.iter().enumerate() {
            for (msg_idx, message) in file.messages.iter().enumerate() {
                index_message(&mut index, message, file_idx, vec![msg_idx]);
            }
        }
        debug!(
            "Indexed {} messages across {} files",
            index.len(),
            files.len()
        );
        Self { files, index }
    }

    /// All files in request order
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Files marked for generation
    pub fn files_to_generate(&self) -> impl Iterator<Item = &File> {
        self.files.iter().filter(|f| f.generate)
    }

    /// Looks up a file by name
    pub fn file(&self, name: &str) -> Option<&File> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Looks up a message by qualified name (leading dot optional)
    pub fn message(&self, full_name: &str) -> Option<&Message> {
        let key = if full_name.starts_with('.') {
            full_name.to_string()
        } else {
            format!(".{full_name}")
        };
        let location = self.index.get(&key)?;
        let file = self.files.get(location.file)?;

        let (first, rest) = location.path.split_first()?;
        let mut message = file.messages.get(*first)?;
        for idx in rest {
            message = message.nested.get(*idx)?;
        }
        Some(message)
    }
}

fn index_message(
    index: &mut HashMap<String, MessageLocation>,
    message: &Message,
    file: usize,
    path: Vec<usize>,
) {
    for (i, nested) in message.nested.iter().enumerate() {
        let mut nested_path = path.clone();
        nested_path.push(i);
        index_message(index, nested, file, nested_path);
    }
    index.insert(message.full_name.clone(), MessageLocation { file, path });
}
