// Path: crates/node/src/bin/flora-node.rs
#![forbid(unsafe_code)]

//! The Flora service binary.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(version, about = "Iris parameters, auth and model service")]
struct NodeOpts {
    #[clap(
        long,
        env = "FLORA_CONFIG",
        global = true,
        help = "Path to the flora.toml configuration file. Defaults apply when omitted."
    )]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bootstrap the backend and serve HTTP (the default).
    Serve,
    /// Parse the configuration, print it and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = NodeOpts::parse();
    let config = flora_node::load_config(opts.config.as_deref())?;

    match opts.command.unwrap_or(Command::Serve) {
        Command::CheckConfig => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Serve => {
            flora_telemetry::init::init_tracing("info")?;
            tracing::info!(target: "node", event = "startup", config = ?opts.config);
            flora_node::serve(config).await
        }
    }
}
