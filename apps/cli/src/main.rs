//! slovlex CLI: find and download Slovak laws from Slov-Lex.
//!
//! Fetches a law's promulgated XML and PDF by year and number, or scans a
//! year's law titles for a keyword.

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
