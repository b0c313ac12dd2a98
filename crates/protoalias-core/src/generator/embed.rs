//! Embedding of the synchronized raw descriptor.

use super::{GeneratedFile, Generator, GeneratorConfig, GENERATED_HEADER};
use crate::error::Result;
use crate::model::File;
use prost::Message;
use tracing::debug;

/// Bytes per line in the emitted byte string
const BYTES_PER_LINE: usize = 24;

/// Emits `<stem>.desc.rs` holding the encoded, alias-free `FileDescriptorProto`
///
/// Source code info is stripped: it is not needed for reflection and its
/// location paths do not survive message removal.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbedGenerator;

impl Generator for EmbedGenerator {
    fn name(&self) -> &'static str {
        "embed"
    }

    fn generate(&self, file: &File, config: &GeneratorConfig) -> Result<Vec<GeneratedFile>> {
        if config.strip_nonfunctional {
            debug!("{}: skipping embedded descriptor", file.name);
            return Ok(Vec::new());
        }

        let mut proto = file.proto.clone();
        proto.source_code_info = None;
        let encoded = proto.encode_to_vec();

        let mut content = format!(
            "// {}\n// source: {}\n\n/// Encoded `FileDescriptorProto` for `{}` with aliases resolved ({} bytes).\n",
            GENERATED_HEADER,
            file.name,
            file.name,
            encoded.len()
        );
        content.push_str("pub static FILE_DESCRIPTOR: &[u8] = b\"");
        for (i, chunk) in encoded.chunks(BYTES_PER_LINE).enumerate() {
            if i > 0 {
                content.push_str("\\\n    ");
            }
            content.push_str(&escape_bytes(chunk));
        }
        content.push_str("\";\n");

        Ok(vec![GeneratedFile {
            name: file.output_filename(config.import_paths, ".desc.rs"),
            content,
        }])
    }
}

/// Escapes bytes for a Rust byte string literal.
///
/// Spaces are escaped too, since a line continuation swallows leading
/// whitespace on the next line.
fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        if b == b' ' {
            out.push_str("\\x20");
        } else {
            out.extend(std::ascii::escape_default(b).map(char::from));
        }
    }
    out
}

/// Reverses [`escape_bytes`] including line continuations
#[cfg(test)]
fn unescape_bytes(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        match bytes[i + 1] {
            b'x' => {
                let hex = &s[i + 2..i + 4];
                out.push(u8::from_str_radix(hex, 16).unwrap());
                i += 4;
            }
            b'\n' => {
                i += 2;
                while bytes[i] == b' ' {
                    i += 1;
                }
            }
            b'n' => {
                out.push(b'\n');
                i += 2;
            }
            b'r' => {
                out.push(b'\r');
                i += 2;
            }
            b't' => {
                out.push(b'\t');
                i += 2;
            }
            other => {
                out.push(other);
                i += 2;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::tests::shop_proto;
    use crate::{Resolver, ResolverConfig, Schema};
    use prost_types::FileDescriptorProto;

    fn resolved_shop() -> File {
        let schema = Schema::from_protos(
            vec![shop_proto()],
            &["shop.proto".to_string()],
            &ResolverConfig::default(),
        );
        Resolver::new(&schema)
            .resolve_file(schema.file("shop.proto").unwrap())
            .unwrap()
    }

    #[test]
    fn test_escape_bytes() {
        assert_eq!(escape_bytes(b"abc"), "abc");
        assert_eq!(escape_bytes(b"a b"), "a\\x20b");
        assert_eq!(escape_bytes(b"\"\\"), "\\\"\\\\");
        assert_eq!(escape_bytes(&[0x00, 0x0a, 0xff]), "\\x00\\n\\xff");
    }

    #[test]
    fn test_embedded_descriptor_decodes_to_resolved_mirror() {
        let file = resolved_shop();
        let out = EmbedGenerator
            .generate(&file, &GeneratorConfig::default())
            .unwrap()
            .remove(0);
        assert_eq!(out.name, "shop.desc.rs");

        let start = out.content.find("b\"").unwrap() + 2;
        let end = out.content.rfind("\";").unwrap();
        let bytes = unescape_bytes(&out.content[start..end]);

        let decoded = FileDescriptorProto::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, file.proto);
        assert_eq!(decoded.message_type.len(), 2);
    }

    #[test]
    fn test_strip_nonfunctional_skips_output() {
        let file = resolved_shop();
        let config = GeneratorConfig::new().strip_nonfunctional(true);
        assert!(EmbedGenerator.generate(&file, &config).unwrap().is_empty());
    }
}
