//! Downstream generators.
//!
//! A [`Generator`] turns one resolved [`File`] into output files. Two are
//! provided:
//!
//! - [`SourceGenerator`]: renders the resolved schema as `.proto` source
//! - [`EmbedGenerator`]: emits the synchronized raw descriptor as a Rust byte string
//!
//! ## Extensibility
//!
//! Implement [`Generator`] to emit other languages from the same resolved model.
//! Fields rewritten from an alias carry [`Field::alias`](crate::model::Field::alias),
//! which generators can use to render alias-style names.

mod embed;
mod source;

use crate::error::{Error, Result};
use crate::model::File;
use prost_types::compiler::code_generator_response;
use std::path::{Component, Path, PathBuf};
use tracing::trace;

pub use embed::EmbedGenerator;
pub use source::SourceGenerator;

/// Header line written at the top of every generated file
pub const GENERATED_HEADER: &str = "Code generated by protoc-gen-alias. DO NOT EDIT.";

/// Configuration shared by generators
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Indentation string (default: 2 spaces)
    pub indent_str: String,
    /// Include source code comments if available
    pub include_comments: bool,
    /// Place output under the `go_package` import path
    pub import_paths: bool,
    /// Skip output that does not affect behavior (the embedded descriptor)
    pub strip_nonfunctional: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            indent_str: "  ".to_string(),
            include_comments: true,
            import_paths: true,
            strip_nonfunctional: false,
        }
    }
}

impl GeneratorConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation string
    pub fn indent_str(mut self, s: impl Into<String>) -> Self {
        self.indent_str = s.into();
        self
    }

    /// Sets whether to include comments
    pub fn include_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }

    /// Sets whether output paths follow the `go_package` import path
    pub fn import_paths(mut self, import_paths: bool) -> Self {
        self.import_paths = import_paths;
        self
    }

    /// Sets whether non-functional output is skipped
    pub fn strip_nonfunctional(mut self, strip: bool) -> Self {
        self.strip_nonfunctional = strip;
        self
    }
}

/// A generated output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path relative to the output directory
    pub name: String,
    /// File contents
    pub content: String,
}

impl GeneratedFile {
    /// Writes the file below `output_dir`, refusing paths that escape it
    pub fn write_to(&self, output_dir: &Path) -> Result<PathBuf> {
        let relative = Path::new(&self.name);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes || self.name.is_empty() {
            return Err(Error::path_traversal(relative));
        }

        let path = output_dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::directory_create(parent, e))?;
        }
        std::fs::write(&path, &self.content).map_err(|e| Error::file_write(&path, e))?;

        trace!("Wrote {}", path.display());
        Ok(path)
    }
}

impl From<GeneratedFile> for code_generator_response::File {
    fn from(file: GeneratedFile) -> Self {
        Self {
            name: Some(file.name),
            content: Some(file.content),
            ..Default::default()
        }
    }
}

/// Trait for generators that consume resolved files
pub trait Generator {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Generates output for one resolved file
    fn generate(&self, file: &File, config: &GeneratorConfig) -> Result<Vec<GeneratedFile>>;
}
