//! protoc-gen-alias - protoc plugin that resolves alias messages
//!
//! protoc runs this binary with a `CodeGeneratorRequest` on stdin and reads a
//! `CodeGeneratorResponse` from stdout. Messages whose leading comment holds
//! `protobuf:alias` and which have a single field are erased, and fields that
//! used them take that field's type directly.
//!
//! For debugging, `--request` reads a saved request from disk and `--output`
//! writes the generated files to a directory instead of stdout.

use anyhow::{bail, Context, Result};
use clap::Parser;
use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;
use protoalias_core::plugin::{encode_response, error_response};
use protoalias_core::Plugin;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

/// protoc plugin that resolves alias messages before generating code
#[derive(Parser, Debug)]
#[command(name = "protoc-gen-alias")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Read an encoded CodeGeneratorRequest from this file instead of stdin
    #[arg(long)]
    request: Option<PathBuf>,

    /// Write generated files to this directory instead of emitting a response
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Plugin parameter string, overriding the one in the request
    #[arg(short, long)]
    parameter: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout carries the response
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let input = read_request(cli.request.as_deref())?;

    match &cli.output {
        Some(output) => write_outputs(&cli, &input, output),
        None => {
            let response = respond(&input, cli.parameter.as_deref());
            std::io::stdout()
                .lock()
                .write_all(&response)
                .context("Failed to write response to stdout")
        }
    }
}

/// Read the encoded request from a file or stdin
fn read_request(path: Option<&Path>) -> Result<Vec<u8>> {
    let data = match path {
        Some(path) => fs::read(path)
            .with_context(|| format!("Failed to read request: {}", path.display()))?,
        None => {
            let mut data = Vec::new();
            std::io::stdin()
                .lock()
                .read_to_end(&mut data)
                .context("Failed to read request from stdin")?;
            data
        }
    };
    debug!("Read {} byte request", data.len());
    Ok(data)
}

/// Decode the request, optionally overriding its parameter string
fn load_plugin(input: &[u8], parameter: Option<&str>) -> protoalias_core::Result<Plugin> {
    let mut request = CodeGeneratorRequest::decode(input)?;
    if let Some(parameter) = parameter {
        request.parameter = Some(parameter.to_string());
    }
    Plugin::from_request(request)
}

/// Run the plugin and encode the response; errors are reported inside it
fn respond(input: &[u8], parameter: Option<&str>) -> Vec<u8> {
    let response = match load_plugin(input, parameter).and_then(|plugin| plugin.run()) {
        Ok(generation) => generation.into_response(),
        Err(e) => {
            error!("{}", e);
            error_response(&e)
        }
    };
    encode_response(&response)
}

/// Run the plugin and write every generated file below `output`
fn write_outputs(cli: &Cli, input: &[u8], output: &Path) -> Result<()> {
    let plugin = load_plugin(input, cli.parameter.as_deref()).context("Invalid request")?;
    let generation = plugin.run().context("Generation failed")?;

    for file in &generation.files {
        let path = file
            .write_to(output)
            .with_context(|| format!("Failed to write {}", file.name))?;
        println!("Wrote {}", path.display());
    }

    for (file, e) in &generation.failures {
        error!("{}: {}", file, e);
    }
    if !generation.failures.is_empty() {
        bail!("{} file(s) failed to generate", generation.failures.len());
    }

    info!("Wrote {} file(s)", generation.files.len());
    Ok(())
}
