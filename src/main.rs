use anyhow::Result;
use clap::Parser;

use opsdeck::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    cli::init_tracing();
    Cli::parse().execute().await
}
