//! Command-line interface for the ETL binary.

use std::path::PathBuf;

use clap::Parser;

/// CoinGecko market snapshot ETL
#[derive(Parser)]
#[command(name = "crypto-etl")]
#[command(about = "Loads CoinGecko market snapshots into Postgres", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Append log output to this file in addition to stdout
    pub log_path: Option<PathBuf>,
}
