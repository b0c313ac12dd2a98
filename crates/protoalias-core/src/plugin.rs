//! `protoc` plugin driver.
//!
//! Decodes a `CodeGeneratorRequest`, resolves aliases in every file marked
//! for generation and runs the enabled generators over the results.
//!
//! ## Parameters
//!
//! Passed by protoc as `--alias_opt=key=value,...`:
//!
//! | Parameter | Values | Default |
//! |-----------|--------|---------|
//! | `paths` | `import`, `source_relative` | `import` |
//! | `emit` | `proto`, `embed`, `all` | `all` |
//! | `alias_marker` | any non-empty text | `protobuf:alias` |
//! | `validate` | `true`, `false` | `false` |
//! | `experimental_strip_nonfunctional_codegen` | `true`, `false` | `false` |

use crate::alias::{Resolver, ResolverConfig};
use crate::error::{Error, Result};
use crate::generator::{EmbedGenerator, GeneratedFile, Generator, GeneratorConfig, SourceGenerator};
use crate::model::{File, Schema};
use crate::validate::validate;
use bytes::Buf;
use prost::Message;
use prost_types::compiler::code_generator_response::Feature;
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use tracing::{debug, info, warn};

/// `FEATURE_SUPPORTS_EDITIONS`, not yet part of prost-types' `Feature` enum
const FEATURE_SUPPORTS_EDITIONS: u64 = 2;

/// `EDITION_PROTO2`, the oldest edition this plugin accepts
pub const MINIMUM_EDITION: i32 = 998;

/// `EDITION_2023`, the newest edition this plugin accepts
pub const MAXIMUM_EDITION: i32 = 1000;

/// Features advertised in every response
const SUPPORTED_FEATURES: u64 = Feature::Proto3Optional as u64 | FEATURE_SUPPORTS_EDITIONS;

/// Edition range fields of `CodeGeneratorResponse` missing from prost-types
#[derive(Clone, PartialEq, prost::Message)]
struct EditionRange {
    #[prost(int32, optional, tag = "3")]
    minimum_edition: Option<i32>,
    #[prost(int32, optional, tag = "4")]
    maximum_edition: Option<i32>,
}

/// Which generators run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// Only `.resolved.proto` source
    Proto,
    /// Only the embedded descriptor
    Embed,
    /// Both
    All,
}

/// Options parsed from the plugin parameter string
#[derive(Debug, Clone)]
pub struct PluginOptions {
    /// Alias resolution settings
    pub resolver: ResolverConfig,
    /// Generator settings
    pub generator: GeneratorConfig,
    /// Generators to run
    pub emit: Emit,
    /// Rebuild resolved descriptors with prost-reflect before generating
    pub validate: bool,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            generator: GeneratorConfig::default(),
            emit: Emit::All,
            validate: false,
        }
    }
}

impl PluginOptions {
    /// Parses a comma-separated `key=value` parameter string
    pub fn parse(parameter: &str) -> Result<Self> {
        let mut options = Self::default();

        for param in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = param.split_once('=').unwrap_or((param, ""));
            match name {
                "paths" => {
                    let import_paths = match value {
                        "import" => true,
                        "source_relative" => false,
                        _ => {
                            return Err(Error::invalid_parameter(
                                name,
                                format!("unknown path type '{value}'"),
                            ))
                        }
                    };
                    options.generator = options.generator.import_paths(import_paths);
                }
                "emit" => {
                    options.emit = match value {
                        "proto" => Emit::Proto,
                        "embed" => Emit::Embed,
                        "all" => Emit::All,
                        _ => {
                            return Err(Error::invalid_parameter(
                                name,
                                format!("expected proto, embed or all, got '{value}'"),
                            ))
                        }
                    };
                }
                "alias_marker" => {
                    if value.is_empty() {
                        return Err(Error::invalid_parameter(name, "marker must not be empty"));
                    }
                    options.resolver = options.resolver.marker(value);
                }
                "validate" => options.validate = parse_bool(name, value)?,
                "experimental_strip_nonfunctional_codegen" => {
                    let strip = parse_bool(name, value)?;
                    options.generator = options.generator.strip_nonfunctional(strip);
                }
                "plugins" => {
                    if !value.is_empty() {
                        return Err(Error::PluginsUnsupported);
                    }
                }
                _ => return Err(Error::invalid_parameter(name, "unknown parameter")),
            }
        }

        Ok(options)
    }

    fn generators(&self) -> Vec<Box<dyn Generator>> {
        match self.emit {
            Emit::Proto => vec![Box::new(SourceGenerator)],
            Emit::Embed => vec![Box::new(EmbedGenerator)],
            Emit::All => vec![Box::new(SourceGenerator), Box::new(EmbedGenerator)],
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value {
        "" | "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::invalid_parameter(
            name,
            format!("expected true or false, got '{value}'"),
        )),
    }
}

/// Output of a plugin run
#[derive(Debug, Default)]
pub struct Generation {
    /// Generated files for every file that resolved cleanly
    pub files: Vec<GeneratedFile>,
    /// Resolved files, in request order
    pub resolved: Vec<File>,
    /// Files whose generation was aborted, with the reason
    pub failures: Vec<(String, Error)>,
}

impl Generation {
    /// Converts the run into a response for protoc
    ///
    /// Any per-file failure is reported through the response error so protoc
    /// exits non-zero.
    pub fn into_response(self) -> CodeGeneratorResponse {
        let error = if self.failures.is_empty() {
            None
        } else {
            let lines: Vec<_> = self
                .failures
                .iter()
                .map(|(file, e)| format!("{file}: {e}"))
                .collect();
            Some(lines.join("\n"))
        };

        CodeGeneratorResponse {
            error,
            supported_features: Some(SUPPORTED_FEATURES),
            file: self.files.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Builds a response that only reports `err`
pub fn error_response(err: &Error) -> CodeGeneratorResponse {
    CodeGeneratorResponse {
        error: Some(err.to_string()),
        supported_features: Some(SUPPORTED_FEATURES),
        ..Default::default()
    }
}

/// Encodes a response for protoc, including the supported edition range.
///
/// Protobuf messages concatenate field by field, so the edition range is
/// appended after the prost-encoded response.
pub fn encode_response(response: &CodeGeneratorResponse) -> Vec<u8> {
    let range = EditionRange {
        minimum_edition: Some(MINIMUM_EDITION),
        maximum_edition: Some(MAXIMUM_EDITION),
    };
    let mut buf = Vec::with_capacity(response.encoded_len() + range.encoded_len());
    buf.extend(response.encode_to_vec());
    buf.extend(range.encode_to_vec());
    buf
}

/// A decoded plugin request with its parsed options
#[derive(Debug)]
pub struct Plugin {
    request: CodeGeneratorRequest,
    options: PluginOptions,
}

impl Plugin {
    /// Decodes an encoded `CodeGeneratorRequest`
    pub fn decode(buf: impl Buf) -> Result<Self> {
        let request = CodeGeneratorRequest::decode(buf)?;
        Self::from_request(request)
    }

    /// Creates a plugin from a decoded request
    pub fn from_request(request: CodeGeneratorRequest) -> Result<Self> {
        let options = PluginOptions::parse(request.parameter())?;
        Ok(Self { request, options })
    }

    /// Returns the parsed options
    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    /// Returns the underlying request
    pub fn request(&self) -> &CodeGeneratorRequest {
        &self.request
    }

    /// Builds the schema from the request, then resolves and generates
    pub fn run(&self) -> Result<Generation> {
        let schema = Schema::from_protos(
            self.request.proto_file.clone(),
            &self.request.file_to_generate,
            &self.options.resolver,
        );
        self.generate(&schema)
    }

    /// Resolves and generates every file of `schema` marked for generation.
    ///
    /// A file-scoped failure aborts only that file; it is recorded in
    /// [`Generation::failures`] and the remaining files still generate.
    pub fn generate(&self, schema: &Schema) -> Result<Generation> {
        let resolver = Resolver::new(schema);
        let mut generation = Generation::default();

        for file in schema.files_to_generate() {
            match resolver.resolve_file(file) {
                Ok(resolved) => generation.resolved.push(resolved),
                Err(e) if e.is_file_scoped() => {
                    warn!("Skipping {}: {}", file.name, e);
                    generation.failures.push((file.name.clone(), e));
                }
                Err(e) => return Err(e),
            }
        }

        if self.options.validate {
            let protos: Vec<_> = schema
                .files()
                .iter()
                .map(|file| {
                    generation
                        .resolved
                        .iter()
                        .find(|r| r.name == file.name)
                        .map_or_else(|| file.proto.clone(), |r| r.proto.clone())
                })
                .collect();
            validate(&protos)?;
        }

        for file in &generation.resolved {
            for generator in self.options.generators() {
                let files = generator.generate(file, &self.options.generator)?;
                debug!(
                    "{}: {} generator produced {} file(s)",
                    file.name,
                    generator.name(),
                    files.len()
                );
                generation.files.extend(files);
            }
        }

        info!(
            "Generated {} file(s) from {} input(s), {} failed",
            generation.files.len(),
            generation.resolved.len(),
            generation.failures.len()
        );
        Ok(generation)
    }
}
