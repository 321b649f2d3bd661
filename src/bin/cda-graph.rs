//! CDA Graph CLI
//!
//! Command-line interface for decoding Content Delivery API responses.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cda_graph::{
    decode_document, load_document_auto, load_schemas, load_schemas_into, render, summary,
    DecodeOptions, SchemaRegistry,
};

#[derive(Parser)]
#[command(name = "cda-graph")]
#[command(about = "Decode Content Delivery API responses into a linked resource graph")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a response and print its rendering
    Decode {
        /// Response source: file path or URL (http:// or https://)
        source: String,

        /// Schema descriptor file (repeatable; later files win)
        #[arg(long = "schema", value_name = "FILE")]
        schemas: Vec<PathBuf>,

        /// Keep link placeholders instead of resolving them
        #[arg(long)]
        no_resolve: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Print counts and unresolved links instead of the resources
        #[arg(long)]
        summary: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check a schema descriptor file and list its content types
    CheckSchema {
        /// Descriptor file
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode {
            source,
            schemas,
            no_resolve,
            pretty,
            summary,
            output,
        } => run_decode(DecodeArgs {
            source,
            schemas,
            resolve: !no_resolve,
            pretty,
            summary,
            output,
        }),
        Commands::CheckSchema { file } => run_check_schema(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

struct DecodeArgs {
    source: String,
    schemas: Vec<PathBuf>,
    resolve: bool,
    pretty: bool,
    summary: bool,
    output: Option<PathBuf>,
}

fn run_decode(args: DecodeArgs) -> Result<(), u8> {
    let mut registry = SchemaRegistry::new();
    for path in &args.schemas {
        load_schemas_into(&mut registry, path).map_err(|e| {
            eprintln!("Error loading schema {}: {}", path.display(), e);
            e.exit_code() as u8
        })?;
    }

    let document = load_document_auto(&args.source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let options = DecodeOptions::new().resolve_links(args.resolve);
    let resource = decode_document(&registry, &document, &options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let rendered = if args.summary {
        summary(&resource)
    } else {
        render(&resource)
    };

    let json_output = if args.pretty {
        serde_json::to_string_pretty(&rendered)
    } else {
        serde_json::to_string(&rendered)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_check_schema(file: &std::path::Path) -> Result<(), u8> {
    let registry = load_schemas(file).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    println!("{}: {} content type(s)", file.display(), registry.len());
    for content_type in registry.content_types() {
        let fields = registry
            .lookup(content_type)
            .map_or(0, |schema| schema.fields().len());
        println!("  {} ({} fields)", content_type, fields);
    }
    Ok(())
}
