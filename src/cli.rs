use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ve-farmer", version, about = "Lend, swap, lock and vote across a list of wallets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the farming pipeline for every key
    Run(RunArgs),
    /// Swap leftover tokens back to the native coin
    Rescue(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Chain config, merged over configs/common.toml
    #[arg(short, long, default_value = "configs/optimism.toml")]
    pub config: String,

    /// Private key list, one per line
    #[arg(long)]
    pub keys: Option<PathBuf>,

    /// File that collects keys whose run failed
    #[arg(long)]
    pub failed: Option<PathBuf>,
}

impl Command {
    pub fn args(&self) -> &RunArgs {
        match self {
            Command::Run(args) | Command::Rescue(args) => args,
        }
    }
}
