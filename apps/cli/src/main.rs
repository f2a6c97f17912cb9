//! PageLens CLI — readable-text reports for web pages.
//!
//! Fetches a page, extracts its readable text, and enriches it with a
//! model-generated summary, key points, and vocabulary.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
