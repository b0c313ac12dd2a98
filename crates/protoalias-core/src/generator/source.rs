//! `.proto` source rendering of resolved files.

use super::{GeneratedFile, Generator, GeneratorConfig, GENERATED_HEADER};
use crate::error::Result;
use crate::model::{Cardinality, Comments, Enum, Field, File, Kind, Message, ProtoSyntax};
use std::collections::HashSet;
use std::fmt::Write as FmtWrite;

/// Renders the resolved schema as `<stem>.resolved.proto`
///
/// Fields rewritten from an alias are annotated with a trailing
/// `// alias of <Name>` comment, and the consumed aliases are listed in the
/// file header.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceGenerator;

impl Generator for SourceGenerator {
    fn name(&self) -> &'static str {
        "source"
    }

    fn generate(&self, file: &File, config: &GeneratorConfig) -> Result<Vec<GeneratedFile>> {
        let mut content = String::new();
        SourceWriter::new(&mut content, config)
            .write_file(file)
            .expect("String write cannot fail");

        Ok(vec![GeneratedFile {
            name: file.output_filename(config.import_paths, ".resolved.proto"),
            content,
        }])
    }
}

struct SourceWriter<'a, W: FmtWrite> {
    writer: &'a mut W,
    config: &'a GeneratorConfig,
    syntax: ProtoSyntax,
    indent_level: usize,
}

impl<'a, W: FmtWrite> SourceWriter<'a, W> {
    fn new(writer: &'a mut W, config: &'a GeneratorConfig) -> Self {
        Self {
            writer,
            config,
            syntax: ProtoSyntax::Proto2,
            indent_level: 0,
        }
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn write_indent(&mut self) -> std::fmt::Result {
        for _ in 0..self.indent_level {
            write!(self.writer, "{}", self.config.indent_str)?;
        }
        Ok(())
    }

    fn writeln(&mut self, s: &str) -> std::fmt::Result {
        self.write_indent()?;
        writeln!(self.writer, "{}", s)
    }

    fn write_comments(&mut self, comments: &Comments) -> std::fmt::Result {
        if !self.config.include_comments || comments.leading.is_empty() {
            return Ok(());
        }
        for line in comments.leading.trim_end_matches('\n').lines() {
            self.write_indent()?;
            writeln!(self.writer, "//{}", line)?;
        }
        Ok(())
    }

    fn write_file(&mut self, file: &File) -> std::fmt::Result {
        self.syntax = file.syntax;

        writeln!(self.writer, "// {}", GENERATED_HEADER)?;
        writeln!(self.writer, "// source: {}", file.name)?;
        if !file.aliases.is_empty() {
            let names: Vec<_> = file.aliases.iter().map(|m| m.name.as_str()).collect();
            writeln!(self.writer, "// aliases: {}", names.join(", "))?;
        }
        writeln!(self.writer)?;

        match file.syntax {
            ProtoSyntax::Editions => {
                // prost-types does not expose the edition number
                writeln!(self.writer, "edition = \"2023\";")?;
            }
            syntax => writeln!(self.writer, "syntax = \"{}\";", syntax.as_str())?,
        }
        writeln!(self.writer)?;

        if !file.package.is_empty() {
            writeln!(self.writer, "package {};", file.package)?;
            writeln!(self.writer)?;
        }

        self.write_file_options(file)?;
        self.write_imports(file)?;

        for service in &file.proto.service {
            self.write_service(service)?;
        }

        for message in &file.messages {
            self.write_message(message)?;
        }

        for enum_type in &file.enums {
            self.write_enum(enum_type)?;
        }

        Ok(())
    }

    fn write_file_options(&mut self, file: &File) -> std::fmt::Result {
        let Some(opts) = &file.proto.options else {
            return Ok(());
        };

        let mut wrote_option = false;

        macro_rules! write_string_option {
            ($name:expr, $value:expr) => {
                if let Some(v) = $value {
                    if !v.is_empty() {
                        writeln!(self.writer, "option {} = \"{}\";", $name, escape_string(v))?;
                        wrote_option = true;
                    }
                }
            };
        }

        macro_rules! write_bool_option {
            ($name:expr, $value:expr) => {
                if let Some(v) = $value {
                    writeln!(self.writer, "option {} = {};", $name, v)?;
                    wrote_option = true;
                }
            };
        }

        write_string_option!("go_package", opts.go_package.as_ref());
        write_string_option!("java_package", opts.java_package.as_ref());
        write_string_option!("java_outer_classname", opts.java_outer_classname.as_ref());
        write_bool_option!("java_multiple_files", opts.java_multiple_files);
        write_bool_option!("cc_enable_arenas", opts.cc_enable_arenas);
        write_string_option!("csharp_namespace", opts.csharp_namespace.as_ref());

        if wrote_option {
            writeln!(self.writer)?;
        }

        Ok(())
    }

    fn write_imports(&mut self, file: &File) -> std::fmt::Result {
        let proto = &file.proto;
        if proto.dependency.is_empty() {
            return Ok(());
        }

        let public_deps: HashSet<_> = proto.public_dependency.iter().map(|&i| i as usize).collect();
        let weak_deps: HashSet<_> = proto.weak_dependency.iter().map(|&i| i as usize).collect();

        for (i, dep) in proto.dependency.iter().enumerate() {
            let modifier = if public_deps.contains(&i) {
                "public "
            } else if weak_deps.contains(&i) {
                "weak "
            } else {
                ""
            };
            writeln!(self.writer, "import {}\"{}\";", modifier, dep)?;
        }

        writeln!(self.writer)?;
        Ok(())
    }

    fn write_service(&mut self, service: &prost_types::ServiceDescriptorProto) -> std::fmt::Result {
        writeln!(self.writer, "service {} {{", service.name())?;
        self.indent();

        for method in &service.method {
            let stream = |streaming: Option<bool>| if streaming.unwrap_or(false) { "stream " } else { "" };
            self.write_indent()?;
            writeln!(
                self.writer,
                "rpc {}({}{}) returns ({}{});",
                method.name(),
                stream(method.client_streaming),
                method.input_type(),
                stream(method.server_streaming),
                method.output_type()
            )?;
        }

        self.dedent();
        writeln!(self.writer, "}}")?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_message(&mut self, message: &Message) -> std::fmt::Result {
        self.write_comments(&message.comments)?;
        self.write_indent()?;
        writeln!(self.writer, "message {} {{", message.name)?;
        self.indent();

        for nested in message.nested.iter().filter(|m| !m.map_entry) {
            self.write_message(nested)?;
        }

        for enum_type in &message.enums {
            self.write_enum(enum_type)?;
        }

        // Real oneofs are written as blocks at the position of their first field
        let mut written_oneofs = HashSet::new();
        for field in &message.fields {
            match field.oneof.filter(|&i| !is_synthetic(message, i)) {
                Some(index) => {
                    if written_oneofs.insert(index) {
                        self.write_oneof(message, index)?;
                    }
                }
                None => self.write_field(message, field)?,
            }
        }

        self.dedent();
        self.writeln("}")?;
        if self.indent_level == 0 {
            writeln!(self.writer)?;
        }

        Ok(())
    }

    fn write_oneof(&mut self, message: &Message, index: usize) -> std::fmt::Result {
        let name = message.oneofs.get(index).map_or("", |o| o.name.as_str());
        self.write_indent()?;
        writeln!(self.writer, "oneof {} {{", name)?;
        self.indent();

        for field in message.fields.iter().filter(|f| f.oneof == Some(index)) {
            self.write_comments(&field.comments)?;
            self.write_indent()?;
            write!(
                self.writer,
                "{} {} = {}",
                self.field_type_name(field),
                field.name,
                field.number
            )?;
            self.write_field_options(field)?;
            writeln!(self.writer, ";")?;
        }

        self.dedent();
        self.writeln("}")
    }

    fn write_field(&mut self, message: &Message, field: &Field) -> std::fmt::Result {
        self.write_comments(&field.comments)?;
        self.write_indent()?;

        if let Some((key, value)) = map_entry_fields(message, field) {
            write!(
                self.writer,
                "map<{}, {}> {} = {}",
                self.field_type_name(key),
                self.field_type_name(value),
                field.name,
                field.number
            )?;
        } else {
            let label = self.field_label(field);
            if !label.is_empty() {
                write!(self.writer, "{} ", label)?;
            }
            write!(
                self.writer,
                "{} {} = {}",
                self.field_type_name(field),
                field.name,
                field.number
            )?;
        }

        self.write_field_options(field)?;
        write!(self.writer, ";")?;

        if let Some(alias) = &field.alias {
            write!(self.writer, " // alias of {}", alias.name)?;
        }
        writeln!(self.writer)
    }

    fn field_label(&self, field: &Field) -> &'static str {
        match field.cardinality {
            Cardinality::Repeated => "repeated",
            Cardinality::Required if self.syntax == ProtoSyntax::Proto2 => "required",
            Cardinality::Required => "",
            Cardinality::Optional => match self.syntax {
                ProtoSyntax::Proto2 => "optional",
                ProtoSyntax::Proto3 if field.proto3_optional => "optional",
                ProtoSyntax::Proto3 | ProtoSyntax::Editions => "",
            },
        }
    }

    fn field_type_name(&self, field: &Field) -> String {
        match field.kind.keyword() {
            Some(keyword) => keyword.to_string(),
            None => match field.type_name() {
                Some(name) => name.to_string(),
                None if field.kind == Kind::Group => "group".to_string(),
                None => "bytes".to_string(),
            },
        }
    }

    fn write_field_options(&mut self, field: &Field) -> std::fmt::Result {
        let mut options = Vec::new();

        // Default value (proto2 only)
        if self.syntax == ProtoSyntax::Proto2 {
            if let Some(default) = &field.default {
                let formatted = match field.kind {
                    Kind::String | Kind::Bytes => format!("\"{}\"", escape_string(default)),
                    _ => default.clone(),
                };
                options.push(format!("default = {}", formatted));
            }
        }

        // JSON name if different from default
        if let Some(json_name) = &field.json_name {
            if json_name != &to_lower_camel_case(&field.name) {
                options.push(format!("json_name = \"{}\"", json_name));
            }
        }

        if let Some(opts) = &field.options {
            if let Some(packed) = opts.packed {
                options.push(format!("packed = {}", packed));
            }
            if opts.deprecated.unwrap_or(false) {
                options.push("deprecated = true".to_string());
            }
        }

        if !options.is_empty() {
            write!(self.writer, " [{}]", options.join(", "))?;
        }

        Ok(())
    }

    fn write_enum(&mut self, enum_type: &Enum) -> std::fmt::Result {
        self.write_comments(&enum_type.comments)?;
        self.write_indent()?;
        writeln!(self.writer, "enum {} {{", enum_type.name)?;
        self.indent();

        for value in &enum_type.values {
            self.write_indent()?;
            writeln!(self.writer, "{} = {};", value.name, value.number)?;
        }

        self.dedent();
        self.writeln("}")?;
        if self.indent_level == 0 {
            writeln!(self.writer)?;
        }

        Ok(())
    }
}

fn is_synthetic(message: &Message, oneof: usize) -> bool {
    message.oneofs.get(oneof).map_or(false, |o| o.synthetic)
}

/// Returns the key and value fields when `field` is a map field
fn map_entry_fields<'m>(message: &'m Message, field: &Field) -> Option<(&'m Field, &'m Field)> {
    if field.cardinality != Cardinality::Repeated || field.kind != Kind::Message {
        return None;
    }
    let type_name = field.message.as_deref()?;
    let entry = message
        .nested
        .iter()
        .find(|nested| nested.map_entry && nested.full_name == type_name)?;

    let key = entry.fields.iter().find(|f| f.number == 1)?;
    let value = entry.fields.iter().find(|f| f.number == 2)?;
    Some((key, value))
}

/// Escape a string for proto syntax
fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            _ if c.is_ascii_control() => {
                result.push_str(&format!("\\x{:02x}", c as u8));
            }
            _ => result.push(c),
        }
    }
    result
}

/// Convert a snake_case name to lowerCamelCase
fn to_lower_camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = false;

    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}
