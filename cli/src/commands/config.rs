// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use vibeguard_core::domain::config::{ENV_CONFIG_PATH, ENV_GUARD_CONCURRENCY};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

pub fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
    root_override: Option<PathBuf>,
) -> Result<bool> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, root_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override), root_override),
    }
}

fn show(
    config_override: Option<PathBuf>,
    root_override: Option<PathBuf>,
    show_paths: bool,
) -> Result<bool> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. {}: {}",
            ENV_CONFIG_PATH,
            std::env::var(ENV_CONFIG_PATH)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./vibeguard.yaml");
        println!("  4. ~/.vibeguard/config.yaml");
        println!();
    }

    let config = super::load_config(config_override, root_override)?;

    println!("{}", "Current configuration:".bold());
    println!();
    print!("{}", config.to_yaml_string()?);
    println!();
    println!("{}", "Effective values:".bold());
    println!("  Root: {}", config.resolved_root().display());
    let source = if config.guard_concurrency.is_some() {
        "config file".to_string()
    } else {
        ENV_GUARD_CONCURRENCY.to_string()
    };
    println!("  Guard concurrency: {} ({})", config.guard_concurrency(), source.dimmed());

    Ok(true)
}

fn validate(config_path: Option<PathBuf>, root_override: Option<PathBuf>) -> Result<bool> {
    println!("Validating configuration...");

    let config = super::load_config(config_path, root_override)?;
    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());
    Ok(true)
}
