//! vidupe - near-duplicate video finder
//!
//! Entry point for the vidupe CLI application.

use clap::Parser;
use vidupe::cli::Cli;

fn main() -> anyhow::Result<()> {
    vidupe::run_app(Cli::parse())
}
