//! The `carelens serve` command.

use std::sync::Arc;

use carelens_core::{Config, Services};
use clap::Args;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(long, env = "CARELENS_HOST")]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "CARELENS_PORT")]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Initializing services...");
    let init_config = config.clone();
    let services = tokio::task::spawn_blocking(move || Services::initialize(&init_config)).await?;

    crate::server::run(&config.server, Arc::new(services)).await
}
