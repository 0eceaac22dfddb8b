use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::DocQa;

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Question to answer from the ingested documents
    pub question: String,

    #[arg(long, short = 'k', help = "Number of chunks to retrieve")]
    pub top_k: Option<usize>,

    #[arg(long, help = "Print the retrieved context with the answer")]
    pub show_context: bool,
}

pub async fn handle_ask(
    args: AskArgs,
    format: OutputFormat,
    _verbose: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(top_k) = args.top_k {
        config.retrieval.top_k = top_k;
        config.validate()?;
    }
    let formatter = get_formatter(format);

    let docqa = DocQa::from_config(config)?;
    let answer = docqa.query().answer(&args.question, &cancel).await?;
    debug!(
        sources = answer.sources.len(),
        ungrounded = answer.is_ungrounded(),
        "answer ready"
    );

    print!("{}", formatter.format_answer(&answer, args.show_context));
    Ok(())
}
