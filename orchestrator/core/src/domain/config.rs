// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Orchestrator Configuration
//
// Defines the configuration for the guard orchestrator:
// - Root directory holding bundled guards, scripts and rule templates
// - Guard batch concurrency
// - Per-invocation timeouts
//
// Values come from an optional YAML file, then environment overrides.
// The guard concurrency is the one setting read per call rather than at load.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "VIBEGUARD_CONFIG_PATH";
pub const ENV_ROOT: &str = "VIBEGUARD_ROOT";
pub const ENV_GUARD_CONCURRENCY: &str = "VIBEGUARD_GUARD_CONCURRENCY";

pub const DEFAULT_GUARD_CONCURRENCY: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Root holding `guards/`, `scripts/` and `rules/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Pins the guard concurrency; when unset it is read from the environment per call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard_concurrency: Option<usize>,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_timeout_ms")]
    pub default_ms: u64,

    /// Project lint runs are slower than bundled guards
    #[serde(default = "default_lint_timeout_ms")]
    pub lint_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_ms: default_timeout_ms(),
            lint_ms: default_lint_timeout_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }

    pub fn lint_timeout(&self) -> Duration {
        Duration::from_millis(self.lint_ms)
    }
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_lint_timeout_ms() -> u64 {
    120_000
}

impl OrchestratorConfig {
    /// Build a configuration for a fixed root (tests, embedding)
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover configuration file using precedence order
    /// 1. VIBEGUARD_CONFIG_PATH environment variable
    /// 2. ./vibeguard.yaml (working directory)
    /// 3. ~/.vibeguard/config.yaml (user home)
    pub fn discover_config() -> Option<PathBuf> {
        Self::discovery_paths().into_iter().find(|path| path.exists())
    }

    pub fn discovery_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            paths.push(PathBuf::from(path));
        }
        paths.push(PathBuf::from("./vibeguard.yaml"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".vibeguard").join("config.yaml"));
        }
        paths
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // 1. Explicit CLI path (Fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        // 2. Discovery (Env -> Cwd -> Home)
        let mut config = if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)?
        } else {
            tracing::debug!("No configuration file found; using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(ENV_ROOT) {
            if val.trim().is_empty() {
                tracing::warn!("{} is set but empty. Ignoring.", ENV_ROOT);
            } else {
                tracing::info!("Environment override: {}={}", ENV_ROOT, val);
                self.root = Some(PathBuf::from(val));
            }
        }
    }

    /// Root directory, falling back to the location of the running binary
    pub fn resolved_root(&self) -> PathBuf {
        if let Some(root) = &self.root {
            return root.clone();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| root_from_executable(&exe))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Guard concurrency for one batch; reads the environment when not pinned
    pub fn guard_concurrency(&self) -> usize {
        match self.guard_concurrency {
            Some(pinned) => pinned.max(1),
            None => resolve_guard_concurrency(std::env::var(ENV_GUARD_CONCURRENCY).ok().as_deref()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.guard_concurrency == Some(0) {
            anyhow::bail!("guard_concurrency must be at least 1");
        }
        if self.timeouts.default_ms == 0 {
            anyhow::bail!("timeouts.default_ms must be positive");
        }
        if self.timeouts.lint_ms == 0 {
            anyhow::bail!("timeouts.lint_ms must be positive");
        }
        if let Some(root) = &self.root {
            if !root.is_dir() {
                anyhow::bail!("root is not a directory: {}", root.display());
            }
        }
        Ok(())
    }
}

/// `<root>/bin/vibeguard` -> `<root>`
fn root_from_executable(exe: &Path) -> Option<PathBuf> {
    exe.parent()?.parent().map(Path::to_path_buf)
}

/// Parse a concurrency override. Non-numeric, non-finite or missing values
/// fall back to the default; everything else is floored and clamped to >= 1.
pub fn resolve_guard_concurrency(raw: Option<&str>) -> usize {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_GUARD_CONCURRENCY;
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            let floored = value.floor();
            if floored < 1.0 {
                1
            } else {
                floored.min(usize::MAX as f64) as usize
            }
        }
        _ => DEFAULT_GUARD_CONCURRENCY,
    }
}
