// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Language
//!
//! Language identifiers understood by the guard registry, together with the
//! marker files that reveal them at the top level of a project.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements language identifiers and marker tables

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selector value that asks the dispatcher to detect languages itself.
pub const AUTO_LANGUAGE: &str = "auto";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Rust,
    TypeScript,
    JavaScript,
    Go,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Rust => "rust",
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Go => "go",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "python" => Ok(Self::Python),
            "rust" => Ok(Self::Rust),
            "typescript" => Ok(Self::TypeScript),
            "javascript" => Ok(Self::JavaScript),
            "go" => Ok(Self::Go),
            other => Err(other.to_string()),
        }
    }
}

/// Primary detection table, checked in this order.
pub const LANGUAGE_MARKERS: &[(Language, &[&str])] = &[
    (Language::Rust, &["Cargo.toml"]),
    (
        Language::Python,
        &["pyproject.toml", "setup.py", "requirements.txt", "Pipfile"],
    ),
    (Language::TypeScript, &["tsconfig.json"]),
    (Language::Go, &["go.mod"]),
];

/// A generic manifest that only means JavaScript when the typed marker is absent.
pub const JAVASCRIPT_FALLBACK_MARKERS: &[&str] = &["package.json", "jsconfig.json"];

/// Human-readable marker summary used in "nothing detected" reports.
pub fn describe_markers() -> String {
    let mut parts: Vec<String> = LANGUAGE_MARKERS
        .iter()
        .map(|(language, markers)| format!("{}({})", markers.join("/"), language))
        .collect();
    parts.push(format!(
        "{} without tsconfig.json({})",
        JAVASCRIPT_FALLBACK_MARKERS.join("/"),
        Language::JavaScript
    ));
    parts.join(", ")
}
