mod commands;
mod opts;
mod output;
mod scenario;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::replay::ReplayArgs;
use commands::resolve::ResolveArgs;
use opts::GlobalOpts;

#[derive(Parser, Debug)]
#[command(name = "wardrobe", version, about = "Wardrobe appearance sync engine")]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scenario against the recording adapter and print the call log
    Replay(ReplayArgs),

    /// Print the resolved equip map for a snapshot
    Resolve(ResolveArgs),

    /// Print the effective engine config (WARDROBE_* over defaults)
    Config,
}

// replay output is ordered by submission, which a single-threaded runtime keeps
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();
    let opts = &cli.opts;

    match cli.command {
        Command::Replay(args) => commands::replay::cmd_replay(opts, &args).await,
        Command::Resolve(args) => commands::resolve::cmd_resolve(opts, &args),
        Command::Config => commands::config::cmd_config(opts),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}
