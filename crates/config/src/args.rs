use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to .env file (e.g., .env.polkadot)
    #[arg(short, long, default_value = ".env")]
    pub env_file: String,

    /// Decoded block files (JSON) to ingest, processed in the given order
    #[arg(required = true)]
    pub blocks: Vec<PathBuf>,

    /// Pretty-print the JSON output instead of writing one line per block
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
