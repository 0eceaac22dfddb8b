use anyhow::{Result, bail};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

use crate::cli::output::get_formatter;
use crate::error::IngestError;
use crate::models::{Config, Document, OutputFormat};
use crate::services::{DocQa, load_document};
use crate::utils::decode_text;

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Plain-text file to ingest, or `-` to read standard input
    #[arg(conflicts_with = "text", required_unless_present = "text")]
    pub path: Option<PathBuf>,

    #[arg(long, short = 't', help = "Ingest this text instead of a file")]
    pub text: Option<String>,

    #[arg(long, help = "Source label for --text or stdin input")]
    pub source: Option<String>,
}

pub async fn handle_ingest(
    args: IngestArgs,
    format: OutputFormat,
    verbose: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let config = Config::load()?;
    let max_bytes = config.server.max_document_bytes;
    let formatter = get_formatter(format);

    let document = match (args.path, args.text) {
        (Some(path), _) if path.as_os_str() == "-" => {
            let mut bytes = Vec::new();
            tokio::io::stdin()
                .take(max_bytes + 1)
                .read_to_end(&mut bytes)
                .await?;
            if bytes.len() as u64 > max_bytes {
                return Err(IngestError::TooLarge {
                    size: bytes.len() as u64,
                    limit: max_bytes,
                }
                .into());
            }
            labelled(decode_text(bytes, "stdin")?, args.source)
        }
        (Some(path), _) => load_document(&path, max_bytes).await?,
        (None, Some(text)) => labelled(text, args.source),
        (None, None) => bail!("provide a file path, `-` for stdin, or --text"),
    };

    let docqa = DocQa::from_config(config)?;

    let spinner = if format == OutputFormat::Text && !verbose {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
        );
        pb.set_message(format!("Ingesting {}", document.source));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = docqa.ingestion().ingest(&document, &cancel).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let report = result?;
    print!("{}", formatter.format_ingest_report(&report));

    if !report.is_complete() {
        eprintln!(
            "Warning: {} of {} chunks were not stored. Re-run the command to retry them.",
            report.failed(),
            report.attempted
        );
    }
    Ok(())
}

fn labelled(text: String, source: Option<String>) -> Document {
    match source {
        Some(source) => Document::new(source, text),
        None => Document::inline(text),
    }
}
