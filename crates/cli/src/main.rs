//! opsloop CLI: the main entry point.
//!
//! Commands:
//! - `run`     : Hand a task to the agent and supervise it
//! - `actions` : List the actions the agent can request
//! - `init`    : Write the default config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod operator;
mod transcript;

#[derive(Parser)]
#[command(
    name = "opsloop",
    about = "opsloop: a model-driven operations agent with a human in the loop",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent on a task
    Run {
        /// What the agent should do (read from stdin if omitted)
        task: Option<String>,

        /// Project directory the agent works in
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Approve every action without asking
        #[arg(short, long)]
        yes: bool,

        /// Idle rounds in a row before the run ends
        #[arg(long)]
        idle_threshold: Option<u32>,

        /// Maximum model calls (0 = unbounded)
        #[arg(long)]
        max_rounds: Option<u32>,

        /// Override the model
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List the available actions
    Actions,

    /// Write the default configuration file
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            task,
            path,
            yes,
            idle_threshold,
            max_rounds,
            model,
        } => {
            let args = commands::run::RunArgs {
                task,
                path,
                yes,
                idle_threshold,
                max_rounds,
                model,
            };
            let report = commands::run::run(args).await?;
            if !report.termination.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Actions => commands::actions::run()?,
        Commands::Init => commands::init::run()?,
    }

    Ok(())
}
