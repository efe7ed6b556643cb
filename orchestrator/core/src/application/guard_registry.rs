// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Guard Registry
//!
//! Read-only table of `language -> ordered guard descriptors`. Insertion
//! order matters: it is the execution order of "run all" mode and the order
//! in which guard names are listed in error messages. TypeScript and
//! JavaScript share one descriptor set.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements the process-wide guard dispatch table

use std::sync::{Arc, LazyLock};

use crate::domain::guard::{GuardDescriptor, GuardRecipe, StrictFlag, WorkingDir};
use crate::domain::language::Language;

static BUILTIN: LazyLock<Arc<GuardRegistry>> = LazyLock::new(|| Arc::new(GuardRegistry::builtin()));

const PYTHON_GUARDS: &[GuardDescriptor] = &[
    GuardDescriptor::script(
        "duplicates",
        "python3",
        "python/check_duplicates.py",
        StrictFlag::AfterTarget,
    ),
    GuardDescriptor::script(
        "naming",
        "python3",
        "python/check_naming_convention.py",
        StrictFlag::Unsupported,
    ),
    GuardDescriptor::script(
        "dead_shims",
        "python3",
        "python/check_dead_shims.py",
        StrictFlag::AfterTarget,
    ),
    GuardDescriptor::special("quality", GuardRecipe::QualityTemplate),
];

const RUST_GUARDS: &[GuardDescriptor] = &[
    GuardDescriptor::script(
        "nested_locks",
        "bash",
        "rust/check_nested_locks.sh",
        StrictFlag::BeforeTarget,
    ),
    GuardDescriptor::script(
        "unwrap",
        "bash",
        "rust/check_unwrap_in_prod.sh",
        StrictFlag::BeforeTarget,
    ),
    GuardDescriptor::script(
        "duplicate_types",
        "bash",
        "rust/check_duplicate_types.sh",
        StrictFlag::BeforeTarget,
    ),
    GuardDescriptor::script(
        "workspace_consistency",
        "bash",
        "rust/check_workspace_consistency.sh",
        StrictFlag::BeforeTarget,
    ),
    GuardDescriptor::script(
        "single_source_of_truth",
        "bash",
        "rust/check_single_source_of_truth.sh",
        StrictFlag::BeforeTarget,
    ),
    GuardDescriptor::script(
        "semantic_effect",
        "bash",
        "rust/check_semantic_effect.sh",
        StrictFlag::BeforeTarget,
    ),
];

const TS_JS_GUARDS: &[GuardDescriptor] = &[
    GuardDescriptor::special("eslint_guards", GuardRecipe::LintConfig),
    GuardDescriptor::script(
        "any_abuse",
        "bash",
        "typescript/check_any_abuse.sh",
        StrictFlag::BeforeTarget,
    ),
    GuardDescriptor::script(
        "console_residual",
        "bash",
        "typescript/check_console_residual.sh",
        StrictFlag::BeforeTarget,
    ),
    GuardDescriptor::script(
        "no_api_direct_ai_call",
        "bash",
        "typescript/check_no_api_direct_ai_call.sh",
        StrictFlag::BeforeTarget,
    ),
    GuardDescriptor::script(
        "no_dual_track_fallback",
        "bash",
        "typescript/check_no_dual_track_fallback.sh",
        StrictFlag::BeforeTarget,
    ),
    GuardDescriptor::script(
        "duplicate_constants",
        "bash",
        "typescript/check_duplicate_constants.sh",
        StrictFlag::BeforeTarget,
    ),
];

const GO_GUARDS: &[GuardDescriptor] = &[
    GuardDescriptor::tool("vet", "go", &["vet", "./..."], WorkingDir::Target),
];

#[derive(Debug, Clone)]
pub struct GuardRegistry {
    languages: Vec<(Language, Arc<[GuardDescriptor]>)>,
}

impl GuardRegistry {
    /// Shared instance of the built-in table.
    pub fn shared() -> Arc<Self> {
        BUILTIN.clone()
    }

    pub fn builtin() -> Self {
        let ts_js: Arc<[GuardDescriptor]> = Arc::from(TS_JS_GUARDS);
        Self {
            languages: vec![
                (Language::Python, Arc::from(PYTHON_GUARDS)),
                (Language::Rust, Arc::from(RUST_GUARDS)),
                (Language::TypeScript, ts_js.clone()),
                (Language::JavaScript, ts_js),
                (Language::Go, Arc::from(GO_GUARDS)),
            ],
        }
    }

    /// Build a registry from explicit entries (first registration of a language wins).
    pub fn from_entries(entries: Vec<(Language, Vec<GuardDescriptor>)>) -> Self {
        let mut languages: Vec<(Language, Arc<[GuardDescriptor]>)> = Vec::new();
        for (language, guards) in entries {
            if languages.iter().any(|(known, _)| *known == language) {
                continue;
            }
            languages.push((language, Arc::from(guards)));
        }
        Self { languages }
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.languages.iter().map(|(language, _)| *language)
    }

    pub fn guards(&self, language: Language) -> Option<&[GuardDescriptor]> {
        self.languages
            .iter()
            .find(|(known, _)| *known == language)
            .map(|(_, guards)| guards.as_ref())
    }

    pub fn guard(&self, language: Language, name: &str) -> Option<&GuardDescriptor> {
        self.guards(language)?.iter().find(|guard| guard.name == name)
    }

    pub fn guard_names(&self, language: Language) -> Vec<&'static str> {
        self.guards(language)
            .map(|guards| guards.iter().map(|guard| guard.name).collect())
            .unwrap_or_default()
    }

    /// Comma-separated identifiers in registration order.
    pub fn supported_languages(&self) -> String {
        self.languages()
            .map(|language| language.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether two languages were registered with the very same descriptor set.
    pub fn shares_guards(&self, a: Language, b: Language) -> bool {
        let find = |language: Language| {
            self.languages
                .iter()
                .find(|(known, _)| *known == language)
                .map(|(_, guards)| guards.clone())
        };
        match (find(a), find(b)) {
            (Some(x), Some(y)) => Arc::ptr_eq(&x, &y),
            _ => false,
        }
    }
}

impl Default for GuardRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_supported_languages_in_registration_order() {
        let registry = GuardRegistry::builtin();
        assert_eq!(
            registry.supported_languages(),
            "python, rust, typescript, javascript, go"
        );
    }

    #[test]
    fn test_guard_names_are_unique_per_language() {
        let registry = GuardRegistry::builtin();
        for language in registry.languages() {
            let names = registry.guard_names(language);
            let unique: HashSet<_> = names.iter().collect();
            assert_eq!(names.len(), unique.len(), "duplicate guard in {language}");
        }
    }

    #[test]
    fn test_rust_guards_include_semantic_guards() {
        let registry = GuardRegistry::builtin();
        let names = registry.guard_names(Language::Rust);
        assert!(names.contains(&"single_source_of_truth"));
        assert!(names.contains(&"semantic_effect"));
        assert_eq!(names.first(), Some(&"nested_locks"));
    }

    #[test]
    fn test_typescript_and_javascript_share_descriptors() {
        let registry = GuardRegistry::builtin();
        assert!(registry.shares_guards(Language::TypeScript, Language::JavaScript));
        assert!(!registry.shares_guards(Language::Python, Language::Rust));
        let names = registry.guard_names(Language::JavaScript);
        assert!(names.contains(&"no_api_direct_ai_call"));
        assert!(names.contains(&"no_dual_track_fallback"));
        assert!(names.contains(&"duplicate_constants"));
    }

    #[test]
    fn test_lookup() {
        let registry = GuardRegistry::shared();
        assert!(registry.guard(Language::Go, "vet").is_some());
        assert!(registry.guard(Language::JavaScript, "vet").is_none());
        assert!(registry.guard(Language::Python, "quality").unwrap().is_special());
    }

    #[test]
    fn test_from_entries_keeps_first_registration() {
        let registry = GuardRegistry::from_entries(vec![
            (
                Language::Go,
                vec![GuardDescriptor::tool("vet", "go", &["vet"], WorkingDir::Target)],
            ),
            (Language::Go, Vec::new()),
        ]);
        assert_eq!(registry.guard_names(Language::Go), vec!["vet"]);
        assert!(registry.guards(Language::Rust).is_none());
    }
}
