use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;

use crate::models::Config;
use crate::server::run_server;
use crate::services::DocQa;

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(
        long,
        short = 'b',
        env = "DOCQA_BIND",
        help = "Address to listen on (overrides server.bind)"
    )]
    pub bind: Option<String>,
}

pub async fn handle_serve(args: ServeArgs, cancel: CancellationToken) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let docqa = DocQa::from_config(config)?;
    run_server(docqa, cancel).await?;
    Ok(())
}
