use anyhow::{Context, Result};
use chanrelay::prelude::*;
use chanrelay_cli::RelayArgs;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = RelayArgs::parse();
    let log_file = init_logging("relay", &args.log_config()).context("failed to set up logging")?;

    let config = args.relay_config();
    let relay = Relay::bind(config.clone())
        .await
        .with_context(|| format!("failed to start relay on {}", config.endpoint.host))?;

    println!("chanrelay relay running");
    println!("  ingress:   {}", relay.ingress_addr()?);
    println!("  broadcast: {}", relay.broadcast_addr()?);
    println!("  log file:  {}", log_file.display());
    println!("Press Ctrl-C to stop.");

    relay.run_until_ctrl_c().await;

    println!("relay stopped");
    Ok(())
}
