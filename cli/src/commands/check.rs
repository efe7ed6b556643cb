// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Guard commands
//!
//! Commands: check, compliance, metrics, detect, guards

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::debug;

use vibeguard_core::application::guard_dispatcher::{GuardCheckRequest, GuardDispatcher};
use vibeguard_core::application::guard_registry::GuardRegistry;
use vibeguard_core::application::language_detector::detect_languages;
use vibeguard_core::domain::config::OrchestratorConfig;
use vibeguard_core::domain::language::{describe_markers, Language, AUTO_LANGUAGE};
use vibeguard_core::domain::path_sanitizer::PathSanitizer;

/// Marker every failing guard header carries.
const ISSUES_MARKER: &str = "] ISSUES FOUND (exit code: ";

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Project directory to check
    #[arg(value_name = "DIR", default_value = ".")]
    pub target: String,

    /// Project language, or "auto" to detect from marker files
    #[arg(short, long, default_value = AUTO_LANGUAGE)]
    pub language: String,

    /// Run a single guard instead of every guard of the language
    #[arg(short, long)]
    pub guard: Option<String>,

    /// Strict mode: guards exit non-zero on findings
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Project directory
    #[arg(value_name = "DIR", default_value = ".")]
    pub project: String,
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Project directory to inspect
    #[arg(value_name = "DIR", default_value = ".")]
    pub target: String,
}

#[derive(Args, Debug)]
pub struct GuardsArgs {
    /// Only list guards of this language
    #[arg(short, long)]
    pub language: Option<String>,
}

/// Run guards and print the report. `Ok(false)` when any guard found issues.
pub async fn check(args: CheckArgs, config: OrchestratorConfig) -> Result<bool> {
    let dispatcher = GuardDispatcher::with_process_executor(config);
    debug!(root = %dispatcher.root().display(), "Dispatcher ready");

    let mut request = GuardCheckRequest::new(args.target, args.language).strict(args.strict);
    request.guard = args.guard;

    let report = dispatcher.guard_check(&request).await;
    Ok(print_report(&report))
}

pub async fn compliance(args: ProjectArgs, config: OrchestratorConfig) -> Result<bool> {
    let dispatcher = GuardDispatcher::with_process_executor(config);
    let report = dispatcher.compliance_report(&args.project).await;
    Ok(print_report(&report))
}

pub async fn metrics(args: ProjectArgs, config: OrchestratorConfig) -> Result<bool> {
    let dispatcher = GuardDispatcher::with_process_executor(config);
    let report = dispatcher.metrics_collect(&args.project).await;
    Ok(print_report(&report))
}

pub fn detect(args: DetectArgs) -> Result<bool> {
    let target = match PathSanitizer::new().validate_target(&args.target) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("{}", format!("✗ {e}").red());
            return Ok(false);
        }
    };

    let languages = detect_languages(&target);
    if languages.is_empty() {
        println!("{}", "ℹ No supported language detected".yellow());
        println!("  Markers: {}", describe_markers());
        return Ok(true);
    }

    println!("{}", format!("Detected languages in {}:", target.display()).bold());
    for language in languages {
        println!("  - {language}");
    }
    Ok(true)
}

pub fn guards(args: GuardsArgs) -> Result<bool> {
    let registry = GuardRegistry::shared();

    let selected: Vec<Language> = match args.language.as_deref() {
        None => registry.languages().collect(),
        Some(raw) => match raw.parse::<Language>() {
            Ok(language) if registry.guards(language).is_some() => vec![language],
            _ => {
                eprintln!(
                    "{}",
                    format!(
                        "✗ unsupported language: {raw}. Supported languages: {}",
                        registry.supported_languages()
                    )
                    .red()
                );
                return Ok(false);
            }
        },
    };

    for language in selected {
        println!("{}", language.as_str().bold());
        for guard in registry.guards(language).unwrap_or_default() {
            if guard.is_special() {
                println!("  {} {}", guard.name, "(project template)".dimmed());
            } else {
                println!("  {}", guard.name);
            }
        }
    }
    Ok(true)
}

/// Print a report to stdout and a colored verdict to stderr.
fn print_report(report: &str) -> bool {
    println!("{report}");
    let clean = !has_issues(report);
    if clean {
        eprintln!("{}", "✓ No issues found".green());
    } else {
        eprintln!("{}", "✗ Issues found".red());
    }
    clean
}

fn has_issues(report: &str) -> bool {
    report.contains(ISSUES_MARKER)
}
