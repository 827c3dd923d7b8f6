use std::path::PathBuf;

use clap::Parser;

/// Ink Battles analysis server
#[derive(Debug, Parser)]
#[command(name = "inkbattles", about = "AI writing-analysis server")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "inkbattles.toml", env = "INKBATTLES_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "INKBATTLES_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,

    /// Log filter in `RUST_LOG` syntax
    #[arg(long, default_value = "info", env = "INKBATTLES_LOG")]
    pub log: String,
}
