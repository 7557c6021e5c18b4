use std::io::IsTerminal;
use std::time::Duration;

use anyhow::{Context, Result};
use chanrelay::prelude::*;
use chanrelay_cli::ClientArgs;
use clap::Parser;
use tokio::io::BufReader;

fn main() -> Result<()> {
    let mut args = ClientArgs::parse();
    if !std::io::stdout().is_terminal() {
        args.no_color = true;
    }

    // Bad names are rejected before logging or networking starts.
    let config = args.client_config().context("invalid client settings")?;
    init_logging("client", &args.log_config()).context("failed to set up logging")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(config));
    // A pending stdin read sits on a blocking thread and never returns.
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn run(config: ClientConfig) -> Result<()> {
    let endpoint = config.endpoint().clone();
    let banner = format!(
        "Joined {} as {}. Type a message and press Enter; Ctrl-C to quit.",
        config.channel(),
        config.username()
    );

    let client = ChatClient::connect(config)
        .await
        .with_context(|| format!("failed to connect to relay at {}", endpoint.host))?;
    println!("{banner}");

    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    client
        .run_until(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), interrupted)
        .await?;

    println!("\nDisconnected.");
    Ok(())
}
