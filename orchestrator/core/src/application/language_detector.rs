// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Language Detector
//!
//! Infers project languages from marker files at the top level of a
//! directory. Detection is advisory: it drives `auto` mode and error hints,
//! never overrides an explicit language.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements top-level marker detection

use std::path::Path;

use crate::domain::language::{Language, JAVASCRIPT_FALLBACK_MARKERS, LANGUAGE_MARKERS};

/// Detect languages in table order, JavaScript fallback last.
///
/// `package.json` alone cannot tell TypeScript from JavaScript; `tsconfig.json`
/// decides, so the JavaScript fallback only applies when TypeScript was not found.
pub fn detect_languages(target_dir: &Path) -> Vec<Language> {
    let has = |marker: &&str| target_dir.join(marker).exists();

    let mut languages: Vec<Language> = LANGUAGE_MARKERS
        .iter()
        .filter(|(_, markers)| markers.iter().any(has))
        .map(|(language, _)| *language)
        .collect();

    if !languages.contains(&Language::TypeScript) && JAVASCRIPT_FALLBACK_MARKERS.iter().any(has) {
        languages.push(Language::JavaScript);
    }

    tracing::debug!(dir = %target_dir.display(), ?languages, "Detected languages");
    languages
}
