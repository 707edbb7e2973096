//! Command-line argument definitions.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "nothanks", version, about = "No Thanks! table tools")]
pub struct NothanksCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play all-bot rounds offline and report results
    Sim {
        /// Number of rounds to play
        #[arg(long, default_value_t = 100)]
        games: u32,
        /// Comma-separated bot tiers, one per seat (easy, medium, hard)
        #[arg(long, default_value = "easy,medium,hard")]
        bots: String,
        #[arg(long)]
        seed: Option<u64>,
        /// Write one JSON line per round to this file
        #[arg(long)]
        output: Option<String>,
        /// Decision policy driving every bot (tiered, baseline)
        #[arg(long, default_value = "tiered")]
        policy: String,
    },
    /// Deal one round and print the hidden cards
    Deal {
        #[arg(long)]
        seed: Option<u64>,
        /// Cards to set aside; defaults to the configured count
        #[arg(long)]
        removed: Option<u8>,
    },
    /// Show the resolved configuration and where each value came from
    Cfg,
}
