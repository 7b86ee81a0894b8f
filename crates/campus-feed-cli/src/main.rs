mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays parseable.
    let default_filter = if cli.verbose {
        "warn,campus_feed=debug"
    } else {
        "warn,campus_feed=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;
    let store = commands::open_store(&cli.db_path)?;

    match cli.command {
        Commands::Seed(args) => commands::seed::run(&store, args, cli.format),
        Commands::Browse(args) => commands::browse::run(store, config, args, cli.format).await,
        Commands::Vote(args) => commands::interact::vote(store, config, args, cli.format).await,
        Commands::Favorite(args) => {
            commands::interact::favorite(store, config, args, cli.format).await
        }
        Commands::Delete(args) => commands::interact::delete(store, config, args, cli.format).await,
    }
}
