//! Command-line interface for docqa.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Answer questions about your documents with retrieval-augmented generation.
#[derive(Debug, Parser)]
#[command(name = "docqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Chunk, embed and store a document
    Ingest(commands::IngestArgs),

    /// Ask a question about the ingested documents
    Ask(commands::AskArgs),

    /// Run the HTTP API
    Serve(commands::ServeArgs),

    /// Check configuration and vector store status
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
