use anyhow::Result;
use author_list::{build, fetch};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "author-list")]
#[command(about = "Fetch ORCID profiles and build a ranked manuscript author list")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch registry profiles for every ORCID in a contributions table
    Fetch(fetch::FetchArgs),
    /// Rank authors, index affiliations and render the author list
    Build(build::BuildArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    match cli.command {
        Commands::Fetch(args) => fetch::run(args),
        Commands::Build(args) => build::run(args),
    }
}
