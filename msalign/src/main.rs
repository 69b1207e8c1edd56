use anyhow::Result;
use clap::{Parser, Subcommand};
use msalign::align;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Align multiple protein structures progressively along a guide tree.
    Align(align::Cli),
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Align(cli) => align::cli(cli),
    }
}
