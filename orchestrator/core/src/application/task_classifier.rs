// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Task Classifier
//!
//! Maps a change set or an error log to the most relevant follow-up agent.
//!
//! Error text is checked first and the first matching pattern wins with
//! high confidence. Otherwise every changed file votes for the agent of
//! each pattern it matches; the agent with the most votes wins, ties going
//! to the agent that received its first vote earliest.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements heuristic follow-up classification

use regex::Regex;
use std::sync::LazyLock;

use crate::domain::classification::{Classification, ClassificationVote, Confidence};

/// Changed-file count from which an unrecognized change set counts as a refactor.
pub const BROAD_REFACTOR_MIN_FILES: usize = 5;

pub const BROAD_REFACTOR_AGENT: &str = "refactor-planner";

struct Rule {
    pattern: Regex,
    agent: &'static str,
    reason: &'static str,
}

fn rules(table: &[(&str, &'static str, &'static str)]) -> Vec<Rule> {
    table
        .iter()
        .map(|(pattern, agent, reason)| Rule {
            pattern: Regex::new(pattern).expect("classifier pattern must compile"),
            agent: *agent,
            reason: *reason,
        })
        .collect()
}

/// Ordered by priority: compiler error codes, then test failures, then build tools.
static ERROR_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    rules(&[
        // rustc
        (r"error\[E\d{4}\]", "build-error-resolver", "Rust compiler error code in output"),
        // tsc
        (r"error TS\d{4,5}", "build-error-resolver", "TypeScript compiler error code in output"),
        // go / gcc style diagnostics
        (
            r"(?m)^\S+\.(go|c|cc|cpp|h):\d+:\d+: (error|undefined)",
            "build-error-resolver",
            "compiler diagnostic in output",
        ),
        (r"panicked at", "test-fixer", "panic in test or runtime output"),
        (
            concat!(
                r"(?m)test result: FAILED|^--- FAIL:|^FAILED |",
                r"AssertionError|Traceback \(most recent call last\)",
            ),
            "test-fixer",
            "failing tests in output",
        ),
        (
            concat!(
                r"could not compile|npm ERR!|ModuleNotFoundError|",
                r"[Cc]annot find module|undefined reference to",
            ),
            "build-error-resolver",
            "build tool failure in output",
        ),
    ])
});

static FILE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    rules(&[
        (
            concat!(
                r"(^|/)(Cargo\.(toml|lock)|package(-lock)?\.json|pnpm-lock\.yaml|yarn\.lock|",
                r"go\.(mod|sum)|requirements[^/]*\.txt|pyproject\.toml|Pipfile(\.lock)?)$",
            ),
            "dependency-auditor",
            "dependency manifest changed",
        ),
        (
            concat!(
                r"(^|/)(tests?|__tests__)/|_test\.(go|py|rs)$|",
                r"\.(test|spec)\.[jt]sx?$|(^|/)test_[^/]+\.py$",
            ),
            "test-fixer",
            "test files changed",
        ),
        (
            r"(?i)(auth|crypto|secret|token|password|permission|session|credential)",
            "security-reviewer",
            "security-sensitive code changed",
        ),
        (
            r"(^|/)migrations?/|\.sql$",
            "database-reviewer",
            "schema or migration changed",
        ),
        (
            concat!(
                r"(^|/)\.github/workflows/|(^|/)Dockerfile|",
                r"\.gitlab-ci\.yml$|(^|/)docker-compose[^/]*\.ya?ml$",
            ),
            "ci-reviewer",
            "CI or container configuration changed",
        ),
        (
            r"(^|/)docs?/|\.(md|rst|adoc)$",
            "doc-updater",
            "documentation changed",
        ),
        (
            concat!(
                r"(^|/)(guards|rules)/|",
                r"(^|/)(eslint\.config\.[^/]+|\.eslintrc[^/]*|clippy\.toml|ruff\.toml)$",
            ),
            "guard-maintainer",
            "guard or lint rules changed",
        ),
    ])
});

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskClassifier;

impl TaskClassifier {
    pub fn new() -> Self {
        Self
    }

    /// `None` means no signal: the caller picks the follow-up manually.
    pub fn classify(
        &self,
        changed_files: &[String],
        error_output: Option<&str>,
    ) -> Option<Classification> {
        if let Some(classification) = error_output.and_then(classify_error) {
            return Some(classification);
        }
        classify_files(changed_files)
    }
}

fn classify_error(error_output: &str) -> Option<Classification> {
    let rule = ERROR_RULES.iter().find(|rule| rule.pattern.is_match(error_output))?;
    tracing::debug!(agent = rule.agent, "Error output matched");
    Some(Classification {
        agent: rule.agent.to_string(),
        confidence: Confidence::High,
        reason: rule.reason.to_string(),
    })
}

fn classify_files(changed_files: &[String]) -> Option<Classification> {
    let mut votes: Vec<ClassificationVote> = Vec::new();

    for file in changed_files {
        let file = file.replace('\\', "/");
        for rule in FILE_RULES.iter().filter(|rule| rule.pattern.is_match(&file)) {
            match votes.iter_mut().find(|vote| vote.agent == rule.agent) {
                Some(vote) => vote.count += 1,
                None => votes.push(ClassificationVote {
                    agent: rule.agent,
                    count: 1,
                    reason: rule.reason,
                }),
            }
        }
    }

    if votes.is_empty() {
        if changed_files.len() >= BROAD_REFACTOR_MIN_FILES {
            return Some(Classification {
                agent: BROAD_REFACTOR_AGENT.to_string(),
                confidence: Confidence::Medium,
                reason: format!(
                    "{} files changed without a recognizable pattern; likely a broad refactor",
                    changed_files.len()
                ),
            });
        }
        return None;
    }

    // Strictly greater keeps the earliest agent on ties.
    let mut best = &votes[0];
    for vote in &votes[1..] {
        if vote.count > best.count {
            best = vote;
        }
    }

    Some(Classification {
        agent: best.agent.to_string(),
        confidence: Confidence::from_votes(best.count),
        reason: best.reason.to_string(),
    })
}
