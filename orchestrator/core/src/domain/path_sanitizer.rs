// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path Sanitizer Domain Service
//!
//! Resolves a caller-supplied target directory into the canonical absolute
//! form used by every downstream component, and refuses operating-system
//! critical directories.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Authorizes target directories before any guard runs

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directories that guards must never be pointed at.
pub const FORBIDDEN_PREFIXES: &[&str] = &[
    "/etc", "/usr", "/bin", "/sbin", "/var", "/System", "/Library", "/proc", "/sys",
];

/// Path validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathValidationError {
    #[error("path must be absolute: {0}")]
    InvalidPath(String),

    #[error("access to system directory is forbidden: {0}")]
    ForbiddenPath(String),

    #[error("directory does not exist: {0}")]
    NotFound(String),
}

/// Path sanitizer domain service
///
/// # Security Guarantees
/// - Relative input is resolved against the process working directory
/// - `.` and `..` are collapsed lexically before the deny-list check
/// - Deny-list matching is segment exact (`/etcetera` is allowed, `/etc/x` is not)
pub struct PathSanitizer {
    forbidden: Vec<PathBuf>,
}

impl PathSanitizer {
    /// Create a sanitizer with the built-in deny-list
    pub fn new() -> Self {
        Self::with_forbidden(FORBIDDEN_PREFIXES.iter().map(PathBuf::from).collect())
    }

    /// Create a sanitizer with a custom deny-list
    pub fn with_forbidden(forbidden: Vec<PathBuf>) -> Self {
        Self { forbidden }
    }

    /// Resolve and authorize a target directory
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Canonical absolute directory
    /// * `Err(PathValidationError)` - Path is relative after resolution, forbidden or missing
    pub fn validate_target(&self, raw: &str) -> Result<PathBuf, PathValidationError> {
        let resolved = resolve(Path::new(raw));

        if !resolved.is_absolute() {
            return Err(PathValidationError::InvalidPath(raw.to_string()));
        }

        if let Some(prefix) = self.forbidden_prefix(&resolved) {
            tracing::warn!(
                path = %resolved.display(),
                prefix = %prefix.display(),
                "Rejected target inside a system directory"
            );
            return Err(PathValidationError::ForbiddenPath(
                resolved.display().to_string(),
            ));
        }

        if !resolved.exists() {
            return Err(PathValidationError::NotFound(resolved.display().to_string()));
        }

        // Symlinks are resolved last so the deny-list sees what the caller asked for
        // and the filesystem sees where it really points.
        let canonical = std::fs::canonicalize(&resolved).unwrap_or(resolved);
        if let Some(prefix) = self.forbidden_prefix(&canonical) {
            tracing::warn!(
                path = %canonical.display(),
                prefix = %prefix.display(),
                "Rejected target resolving into a system directory"
            );
            return Err(PathValidationError::ForbiddenPath(
                canonical.display().to_string(),
            ));
        }

        Ok(canonical)
    }

    fn forbidden_prefix(&self, path: &Path) -> Option<&PathBuf> {
        // Path::starts_with compares whole components, which is the
        // "prefix followed by a separator" rule.
        self.forbidden.iter().find(|prefix| path.starts_with(prefix))
    }
}

impl Default for PathSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Lexically resolve `path` to an absolute, normalized form.
fn resolve(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}
