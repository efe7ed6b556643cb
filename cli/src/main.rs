// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # vibeguard CLI
//!
//! The `vibeguard` binary runs language guards against a project directory
//! and serves the same operations to agents over MCP.
//!
//! ## Commands
//!
//! - `vibeguard check [DIR] --language auto|<lang> [--guard NAME] [--strict]` - Run guards
//! - `vibeguard compliance|metrics [DIR]` - Run the bundled project scripts
//! - `vibeguard detect [DIR]` / `vibeguard guards` - Inspect detection and the registry
//! - `vibeguard classify --files ... --error-log FILE` - Suggest a follow-up agent
//! - `vibeguard serve` - MCP tool server on stdin/stdout
//! - `vibeguard config show|validate` - Configuration management
//!
//! Reports go to stdout; logs and status lines go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use vibeguard::commands::{
    self, CheckArgs, ClassifyArgs, ConfigCommand, DetectArgs, GuardsArgs, ProjectArgs,
};

/// vibeguard - Guard orchestration for AI-assisted codebases
#[derive(Parser)]
#[command(name = "vibeguard")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "VIBEGUARD_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Root holding guards/, scripts/ and rules/
    #[arg(long, global = true, env = "VIBEGUARD_ROOT", value_name = "DIR")]
    root: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "VIBEGUARD_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run language guards against a project
    #[command(name = "check")]
    Check(CheckArgs),

    /// Run the compliance check script
    #[command(name = "compliance")]
    Compliance(ProjectArgs),

    /// Collect project metrics
    #[command(name = "metrics")]
    Metrics(ProjectArgs),

    /// Show languages detected in a directory
    #[command(name = "detect")]
    Detect(DetectArgs),

    /// List registered guards
    #[command(name = "guards")]
    Guards(GuardsArgs),

    /// Suggest a follow-up agent from changed files or error output
    #[command(name = "classify")]
    Classify(ClassifyArgs),

    /// Serve guard tools over MCP (stdio)
    #[command(name = "serve")]
    Serve,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    let clean = match cli.command {
        Some(Commands::Check(args)) => {
            commands::check::check(args, commands::load_config(cli.config, cli.root)?).await?
        }
        Some(Commands::Compliance(args)) => {
            commands::check::compliance(args, commands::load_config(cli.config, cli.root)?).await?
        }
        Some(Commands::Metrics(args)) => {
            commands::check::metrics(args, commands::load_config(cli.config, cli.root)?).await?
        }
        Some(Commands::Detect(args)) => commands::check::detect(args)?,
        Some(Commands::Guards(args)) => commands::check::guards(args)?,
        Some(Commands::Classify(args)) => commands::classify::classify(args)?,
        Some(Commands::Serve) => {
            commands::serve::serve(commands::load_config(cli.config, cli.root)?).await?;
            true
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config, cli.root)?
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(2);
        }
    };

    if !clean {
        std::process::exit(1);
    }
    Ok(())
}

/// Initialize tracing subscriber for logging
///
/// Writes to stderr: stdout carries reports and the MCP protocol.
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
