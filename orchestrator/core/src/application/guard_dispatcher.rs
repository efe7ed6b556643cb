// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Guard Dispatcher
//!
//! Entry point for the three orchestration operations: `guard_check`,
//! `compliance_report` and `metrics_collect`. Every operation answers with a
//! report string; validation and dispatch errors are rendered as text rather
//! than returned to the caller.
//!
//! ## Dispatch Modes
//! | language | guard | Action |
//! |----------|-------|--------|
//! | registered | given | run that guard, or `UnknownGuard` listing valid names |
//! | registered | none | run every guard of the language, registration order |
//! | `auto` | any | detect languages, one `== <language> ==` section each |
//! | anything else | any | `UnsupportedLanguage`, with an `auto` hint if markers exist |
//!
//! Guards of one batch run through the bounded task runner. A guard whose
//! task fails (error or panic) is rendered as an `ISSUES FOUND` report and
//! never aborts its siblings.

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::application::guard_registry::GuardRegistry;
use crate::application::language_detector::detect_languages;
use crate::application::task_runner::run_bounded;
use crate::domain::config::OrchestratorConfig;
use crate::domain::execution::{CommandExecutor, CommandSpec};
use crate::domain::guard::{GuardDescriptor, GuardRecipe};
use crate::domain::language::{describe_markers, Language, AUTO_LANGUAGE};
use crate::domain::path_sanitizer::PathSanitizer;
use crate::domain::report::{
    format_info, format_result, format_runtime_error, GUARD_SEPARATOR,
};
use crate::infrastructure::process_executor::ProcessExecutor;

/// Project-local quality test looked up by the `quality` guard.
pub const QUALITY_TEMPLATE_FILE: &str = "test_code_quality_guards.py";

/// Directories never searched for project-local guard files.
const DISCOVERY_EXCLUDED_DIRS: &[&str] = &["node_modules", ".git"];

const COMPLIANCE_SCRIPT: &str = "compliance_check.sh";
const METRICS_SCRIPT: &str = "metrics_collector.sh";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unsupported language: {language}. Supported languages: {supported}{hint}")]
    UnsupportedLanguage {
        language: String,
        supported: String,
        hint: String,
    },

    #[error("unsupported guard: {guard}. Available {language} guards: {available}")]
    UnknownGuard {
        guard: String,
        language: Language,
        available: String,
    },

    #[error(
        "no supported language detected. Supported languages: {supported}\n\
         Detection markers: {markers}"
    )]
    NoLanguageDetected { supported: String, markers: String },
}

/// A guard task that failed before producing an execution result.
#[derive(Debug, Error)]
pub enum GuardTaskError {
    #[error("{0}")]
    Runtime(String),
}

fn default_language() -> String {
    AUTO_LANGUAGE.to_string()
}

/// Parameters of the `guard_check` operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardCheckRequest {
    pub target_dir: String,

    /// A registered language identifier or `auto`
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,

    #[serde(default)]
    pub strict: bool,
}

impl GuardCheckRequest {
    pub fn new(target_dir: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            target_dir: target_dir.into(),
            language: language.into(),
            guard: None,
            strict: false,
        }
    }

    pub fn guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

pub struct GuardDispatcher {
    config: OrchestratorConfig,
    root: PathBuf,
    registry: Arc<GuardRegistry>,
    executor: Arc<dyn CommandExecutor>,
    sanitizer: PathSanitizer,
}

impl GuardDispatcher {
    pub fn new(config: OrchestratorConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        let root = config.resolved_root();
        Self {
            config,
            root,
            registry: GuardRegistry::shared(),
            executor,
            sanitizer: PathSanitizer::new(),
        }
    }

    /// Dispatcher backed by real child processes running in the configured root
    pub fn with_process_executor(config: OrchestratorConfig) -> Self {
        let executor = Arc::new(ProcessExecutor::new(config.resolved_root()));
        Self::new(config, executor)
    }

    pub fn with_registry(mut self, registry: Arc<GuardRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: PathSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &GuardRegistry {
        &self.registry
    }

    pub async fn guard_check(&self, request: &GuardCheckRequest) -> String {
        let target = match self.sanitizer.validate_target(&request.target_dir) {
            Ok(target) => target,
            Err(e) => return e.to_string(),
        };
        match self.dispatch(&target, request).await {
            Ok(report) => report,
            Err(e) => {
                debug!(error = %e, "Guard check rejected");
                e.to_string()
            }
        }
    }

    pub async fn compliance_report(&self, project_dir: &str) -> String {
        self.run_project_script("compliance_report", COMPLIANCE_SCRIPT, project_dir)
            .await
    }

    pub async fn metrics_collect(&self, project_dir: &str) -> String {
        self.run_project_script("metrics_collect", METRICS_SCRIPT, project_dir)
            .await
    }

    async fn run_project_script(
        &self,
        report_name: &str,
        script: &str,
        project_dir: &str,
    ) -> String {
        let project = match self.sanitizer.validate_target(project_dir) {
            Ok(project) => project,
            Err(e) => return e.to_string(),
        };
        let script = self.root.join("scripts").join(script);
        let command = CommandSpec::new("bash")
            .arg(script.display().to_string())
            .arg(project.display().to_string())
            .timeout(self.config.timeouts.default_timeout());

        let result = self.executor.execute(command).await;
        info!(
            report = report_name,
            exit_code = result.exit_code,
            "Project script finished"
        );
        format_result(report_name, &result)
    }

    async fn dispatch(
        &self,
        target: &Path,
        request: &GuardCheckRequest,
    ) -> Result<String, DispatchError> {
        let guard = request.guard.as_deref();

        if request.language == AUTO_LANGUAGE {
            let detected = detect_languages(target);
            if detected.is_empty() {
                return Err(DispatchError::NoLanguageDetected {
                    supported: self.registry.supported_languages(),
                    markers: describe_markers(),
                });
            }

            let names: Vec<&str> = detected.iter().map(Language::as_str).collect();
            let mut sections = vec![format!("[auto] detected languages: {}\n", names.join(", "))];
            for language in detected {
                sections.push(format!("== {language} =="));
                let section = self
                    .run_language(target, language, guard, request.strict)
                    .await
                    .unwrap_or_else(|e| e.to_string());
                sections.push(section);
            }
            return Ok(sections.join("\n"));
        }

        let language = request
            .language
            .parse::<Language>()
            .ok()
            .filter(|language| self.registry.guards(*language).is_some())
            .ok_or_else(|| self.unsupported_language(&request.language, target))?;

        self.run_language(target, language, guard, request.strict).await
    }

    fn unsupported_language(&self, language: &str, target: &Path) -> DispatchError {
        let detected = detect_languages(target);
        let hint = if detected.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = detected.iter().map(Language::as_str).collect();
            format!(
                "\nHint: detected project language(s) {}; \
                 use language \"{}\" to select automatically",
                names.join(", "),
                AUTO_LANGUAGE
            )
        };
        DispatchError::UnsupportedLanguage {
            language: language.to_string(),
            supported: self.registry.supported_languages(),
            hint,
        }
    }

    async fn run_language(
        &self,
        target: &Path,
        language: Language,
        guard: Option<&str>,
        strict: bool,
    ) -> Result<String, DispatchError> {
        let guards = self
            .registry
            .guards(language)
            .ok_or_else(|| self.unsupported_language(language.as_str(), target))?;

        let selected: Vec<&GuardDescriptor> = match guard {
            Some(name) => {
                let descriptor = guards.iter().find(|g| g.name == name).ok_or_else(|| {
                    DispatchError::UnknownGuard {
                        guard: name.to_string(),
                        language,
                        available: self.registry.guard_names(language).join(", "),
                    }
                })?;
                vec![descriptor]
            }
            None => guards.iter().collect(),
        };

        let concurrency = self.config.guard_concurrency();
        info!(
            %language,
            guards = selected.len(),
            concurrency,
            target = %target.display(),
            "Running guard batch"
        );

        let tasks: Vec<_> = selected
            .into_iter()
            .map(|descriptor| self.guard_task(descriptor, target, strict))
            .collect();
        let reports = run_bounded(tasks, concurrency).await;
        Ok(reports.join(GUARD_SEPARATOR))
    }

    /// Task boundary: errors and panics become this guard's failing report.
    async fn guard_task(
        &self,
        descriptor: &GuardDescriptor,
        target: &Path,
        strict: bool,
    ) -> String {
        let outcome = AssertUnwindSafe(self.run_guard(descriptor, target, strict))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                warn!(guard = descriptor.name, error = %e, "Guard task failed");
                format_runtime_error(descriptor.name, &e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload);
                warn!(guard = descriptor.name, error = %message, "Guard task panicked");
                format_runtime_error(descriptor.name, &message)
            }
        }
    }

    async fn run_guard(
        &self,
        descriptor: &GuardDescriptor,
        target: &Path,
        strict: bool,
    ) -> Result<String, GuardTaskError> {
        match descriptor.recipe {
            GuardRecipe::LintConfig => self.run_lint_config_guard(descriptor.name, target).await,
            GuardRecipe::QualityTemplate => self.run_quality_guard(descriptor.name, target).await,
            GuardRecipe::Script { .. } | GuardRecipe::Tool { .. } => {
                let command = descriptor
                    .build(&self.root, target, strict)
                    .ok_or_else(|| {
                        GuardTaskError::Runtime(format!(
                            "guard {} has no invocation",
                            descriptor.name
                        ))
                    })?
                    .timeout(self.config.timeouts.default_timeout());

                let result = self.executor.execute(command).await;
                info!(
                    guard = descriptor.name,
                    exit_code = result.exit_code,
                    "Guard finished"
                );
                Ok(format_result(descriptor.name, &result))
            }
        }
    }

    async fn run_lint_config_guard(
        &self,
        name: &str,
        target: &Path,
    ) -> Result<String, GuardTaskError> {
        let configs = discover(target, find_lint_configs).await?;
        if configs.is_empty() {
            let rules = self.root.join("rules").join("typescript.md");
            let template = self
                .root
                .join("guards")
                .join("typescript")
                .join("eslint-guards.ts");
            return Ok(format_info(
                name,
                &format!(
                    "Target project has no ESLint configuration. \
                     TypeScript guards ship as rule files:\n  \
                     - rules: {}\n  \
                     - ESLint plugin template: {}\n\
                     Integrate the template into the project's ESLint config \
                     to enable automatic checks.\n",
                    rules.display(),
                    template.display()
                ),
            ));
        }

        debug!(guard = name, configs = ?configs, "Found project lint configuration");
        let command = CommandSpec::new("npx")
            .args(["eslint", "--max-warnings=0", "."])
            .current_dir(target)
            .timeout(self.config.timeouts.lint_timeout());
        let result = self.executor.execute(command).await;
        Ok(format_result(name, &result))
    }

    async fn run_quality_guard(
        &self,
        name: &str,
        target: &Path,
    ) -> Result<String, GuardTaskError> {
        let Some(quality_file) = discover(target, find_quality_file).await? else {
            let template = self
                .root
                .join("guards")
                .join("python")
                .join(QUALITY_TEMPLATE_FILE);
            return Ok(format_info(
                name,
                &format!(
                    "{QUALITY_TEMPLATE_FILE} was not found in the target project.\n\
                     This guard is a project-level template and must be deployed \
                     into the project before it can run.\n\
                     Template: {}\n",
                    template.display()
                ),
            ));
        };

        let command = CommandSpec::new("python3")
            .args(["-m", "pytest"])
            .arg(quality_file.display().to_string())
            .arg("-v")
            .current_dir(target)
            .timeout(self.config.timeouts.default_timeout());
        let result = self.executor.execute(command).await;
        Ok(format_result(name, &result))
    }
}

/// Run a directory walk on the blocking pool so sibling guards keep running.
async fn discover<T, F>(target: &Path, walk: F) -> Result<T, GuardTaskError>
where
    T: Send + 'static,
    F: FnOnce(&Path) -> Result<T, GuardTaskError> + Send + 'static,
{
    let target = target.to_path_buf();
    tokio::task::spawn_blocking(move || walk(&target))
        .await
        .map_err(|e| GuardTaskError::Runtime(format!("discovery task failed: {e}")))?
}

fn discovery_error(target: &Path, e: walkdir::Error) -> GuardTaskError {
    GuardTaskError::Runtime(format!("cannot search {}: {}", target.display(), e))
}

/// `eslint.config.*` or `.eslintrc*` within two levels of the target.
fn find_lint_configs(target: &Path) -> Result<Vec<PathBuf>, GuardTaskError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(target).min_depth(1).max_depth(2).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(discovery_error(target, e)),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let file_name = entry.file_name().to_string_lossy();
        if file_name.starts_with("eslint.config.") || file_name.starts_with(".eslintrc") {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// First quality template file in sorted walk order, skipping dependency and VCS trees.
fn find_quality_file(target: &Path) -> Result<Option<PathBuf>, GuardTaskError> {
    let walker = WalkDir::new(target)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.depth() > 0
                && entry.file_type().is_dir()
                && DISCOVERY_EXCLUDED_DIRS
                    .iter()
                    .any(|excluded| entry.file_name() == *excluded))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(discovery_error(target, e)),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && entry.file_name() == QUALITY_TEMPLATE_FILE {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "guard task panicked".to_string()
    }
}
