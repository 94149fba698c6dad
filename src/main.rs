use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use netpanel::agent::AgentServer;
use netpanel::agent::systemd::Systemd;
use netpanel::controller::ControllerServer;
use netpanel::{AgentConfig, ControllerConfig};

/// Netpanel - control plane for a small fleet of Linux nodes
#[derive(Parser)]
#[command(name = "netpanel", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the per-node agent
    Agent {
        /// Port to listen on
        #[arg(long, env = "NETPANEL_AGENT_PORT", default_value = "8050")]
        port: u16,
    },
    /// Run the controller (panel backend)
    Controller {
        /// Port to listen on
        #[arg(long, env = "NETPANEL_PORT", default_value = "8060")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,netpanel=info",
        1 => "info,netpanel=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Agent { port } => {
            let config = AgentConfig::from_env()?;
            tracing::info!(port, caps = ?config.caps, "starting node agent");
            AgentServer::new(config, Arc::new(Systemd), port).run().await?;
        }
        Command::Controller { port } => {
            let config = ControllerConfig::from_env()?;
            tracing::info!(port, nodes = config.nodes.len(), "starting controller");
            ControllerServer::new(config, port).run().await?;
        }
    }
    Ok(())
}
