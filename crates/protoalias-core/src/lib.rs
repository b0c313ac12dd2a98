//! # protoalias-core
//!
//! Type-alias resolution for protobuf code generators.
//!
//! A message whose leading comment contains `protobuf:alias` and which has
//! exactly one field is treated as an alias for that field's type. This crate
//! erases such messages from a schema and rewrites every field that used
//! them, keeping the semantic model and the raw `FileDescriptorProto` that is
//! embedded for runtime reflection in sync.
//!
//! ## Architecture
//!
//! - [`model`]: Semantic descriptor model built from `FileDescriptorProto`s
//! - [`alias`]: Alias detection, field rewriting, raw synchronization and filtering
//! - [`generator`]: Downstream generators consuming resolved files
//! - [`plugin`]: `protoc` plugin driver (request in, response out)
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use protoalias_core::{Resolver, ResolverConfig, Schema};
//! # let protos: Vec<prost_types::FileDescriptorProto> = vec![];
//!
//! let schema = Schema::from_protos(protos, &["shop.proto".to_string()], &ResolverConfig::default());
//! let resolver = Resolver::new(&schema);
//!
//! for file in schema.files_to_generate() {
//!     let resolved = resolver.resolve_file(file)?;
//!     for alias in &resolved.aliases {
//!         println!("{} is an alias", alias.full_name);
//!     }
//! }
//! # Ok::<(), protoalias_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod alias;
pub mod error;
pub mod generator;
pub mod model;
pub mod plugin;
pub mod validate;

// Re-export primary types for convenience
pub use alias::{alias_payload, Resolver, ResolverConfig};
pub use error::{Error, Result};
pub use generator::{EmbedGenerator, GeneratedFile, Generator, GeneratorConfig, SourceGenerator};
pub use model::{Field, File, Kind, Message, Schema};
pub use plugin::{Generation, Plugin, PluginOptions};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
