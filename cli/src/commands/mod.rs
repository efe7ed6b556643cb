// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the vibeguard CLI

pub mod check;
pub mod classify;
pub mod config;
pub mod serve;

pub use self::check::{CheckArgs, DetectArgs, GuardsArgs, ProjectArgs};
pub use self::classify::ClassifyArgs;
pub use self::config::ConfigCommand;

use anyhow::{Context, Result};
use std::path::PathBuf;

use vibeguard_core::domain::config::OrchestratorConfig;

/// Load configuration (discovery + env), then apply the `--root` flag on top.
pub fn load_config(
    config_override: Option<PathBuf>,
    root_override: Option<PathBuf>,
) -> Result<OrchestratorConfig> {
    let mut config = OrchestratorConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;
    if let Some(root) = root_override {
        config.root = Some(root);
    }
    Ok(config)
}
