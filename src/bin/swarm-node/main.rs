//! swarm-node - one speaker in a multicast synth swarm
//!
//! Run a node:      swarm-node run --address 17
//! Play a note:     swarm-node send -v 0 -w 1 -n 60 -l 1
//! Sync the swarm:  swarm-node send --sync

mod app;
mod send;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use swarm_synth::NodeConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swarm-node")]
#[command(author, version, about = "Multicast-controlled synthesizer node", long_about = None)]
struct Cli {
    /// Node configuration (TOML). Built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join the swarm and play
    Run(RunArgs),

    /// Broadcast one event or sync request to the swarm
    Send(send::SendArgs),

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
pub struct RunArgs {
    /// Address reported in sync replies (usually the last IPv4 octet)
    #[arg(long)]
    address: Option<u8>,

    /// Pin the node id instead of deriving it from swarm rank
    #[arg(long)]
    id: Option<u8>,

    /// Output device name
    #[arg(long)]
    device: Option<String>,

    /// Render without opening an audio device
    #[arg(long)]
    no_audio: bool,

    /// Skip the start and stop chimes
    #[arg(long)]
    no_chimes: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<NodeConfig> {
    match path {
        Some(path) => NodeConfig::load(path)
            .wrap_err_with(|| format!("failed to load config {}", path.display())),
        None => Ok(NodeConfig::default()),
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Run(args) => {
            if let Some(address) = args.address {
                config.node.address = address;
            }
            if args.id.is_some() {
                config.node.id = args.id;
            }
            if args.device.is_some() {
                config.audio.device = args.device;
            }
            if args.no_chimes {
                config.node.chimes = false;
            }
            config.validate().wrap_err("invalid configuration")?;
            app::run(&config, !args.no_audio)
        }
        Commands::Send(args) => send::run(&config, args),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
