// ABOUTME: Entry point for the bastion-relay CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use bastion_relay::config::{self, Config};
use bastion_relay::error::Result;
use bastion_relay::output::{Output, OutputMode};
use clap::Parser;
use cli::{Cli, Commands};
use commands::AddServerArgs;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    let verbose = cli.verbose;
    if let Err(e) = run(cli, mode).await {
        tracing::debug!(kind = ?e.kind(), "command failed");
        let message = if verbose {
            e.to_string()
        } else {
            e.public_message()
        };
        Output::new(mode).error(&message);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    let cwd = env::current_dir()?;

    if let Commands::Init { force } = cli.command {
        let path = config::init_config(&cwd, force)?;
        output.success(&format!("Created {}", path.display()));
        return Ok(());
    }

    let config = Config::resolve(cli.config.as_deref(), &cwd)?;
    let relay = commands::connect_relay(&config, &output)?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::AddServer {
            target_ids,
            bastion_hosts,
            target_hosts,
            bastion_user,
            target_user,
            bastion_key,
            target_key,
        } => {
            let args = AddServerArgs {
                target_ids,
                bastion_hosts,
                target_hosts,
                bastion_user,
                target_user,
                bastion_key,
                target_key,
            };
            commands::add_server(&relay, args, output).await
        }
        Commands::Download {
            target,
            remote_path,
        } => commands::download(&relay, &target, &remote_path, output).await,
        Commands::Stage {
            target,
            filename,
            file,
        } => commands::stage(&relay, &target, &filename, &file, output).await,
        Commands::Upload {
            target,
            filename,
            remote_path,
        } => commands::upload(&relay, &target, &filename, &remote_path, output).await,
        Commands::List { kind, target } => commands::list(&relay, kind, &target, output).await,
        Commands::Fetch {
            kind,
            target,
            filename,
        } => commands::fetch(&relay, kind, &target, &filename).await,
        Commands::Targets => commands::targets(&relay, output).await,
    }
}
