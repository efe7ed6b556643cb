// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Integration tests for guard dispatch
//!
//! Drives `GuardDispatcher` end to end against a recording executor, so the
//! command lines, ordering, concurrency and report text can be asserted
//! without spawning real guard scripts.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use vibeguard_core::application::guard_dispatcher::{GuardCheckRequest, GuardDispatcher};
use vibeguard_core::application::guard_registry::GuardRegistry;
use vibeguard_core::domain::config::OrchestratorConfig;
use vibeguard_core::domain::execution::{CommandExecutor, CommandSpec, ExecutionResult};
use vibeguard_core::domain::guard::{GuardDescriptor, StrictFlag, WorkingDir};
use vibeguard_core::domain::language::Language;
use vibeguard_core::domain::path_sanitizer::PathSanitizer;
use vibeguard_core::domain::report::GUARD_SEPARATOR;

/// Records every command and answers with `ran <script>`.
#[derive(Default)]
struct RecordingExecutor {
    commands: Mutex<Vec<CommandSpec>>,
    active: AtomicUsize,
    peak: AtomicUsize,
    /// Script file name whose invocation panics
    panic_on: Option<&'static str>,
    /// Script file name that reports findings
    fail_on: Option<&'static str>,
}

impl RecordingExecutor {
    fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().clone()
    }
}

fn script_name(command: &CommandSpec) -> String {
    command
        .args
        .first()
        .and_then(|arg| Path::new(arg).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| command.program.clone())
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, command: CommandSpec) -> ExecutionResult {
        self.commands.lock().push(command.clone());
        let script = script_name(&command);

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        // Shorter names finish first, so completion order differs from registration order.
        let delay = 80u64.saturating_sub(script.len() as u64 * 2);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.panic_on == Some(script.as_str()) {
            panic!("executor exploded on {script}");
        }
        let exit_code = if self.fail_on == Some(script.as_str()) { 1 } else { 0 };
        ExecutionResult::new(format!("ran {script}").into_bytes(), Vec::new(), exit_code)
    }
}

struct Harness {
    _root: TempDir,
    project: TempDir,
    executor: Arc<RecordingExecutor>,
    dispatcher: GuardDispatcher,
}

impl Harness {
    fn new(executor: RecordingExecutor, concurrency: usize) -> Self {
        // Under the target dir rather than the system temp dir, which is /var on macOS.
        let root = tempfile::tempdir_in(env!("CARGO_TARGET_TMPDIR")).unwrap();
        let project = tempfile::tempdir_in(env!("CARGO_TARGET_TMPDIR")).unwrap();
        let executor = Arc::new(executor);

        let mut config = OrchestratorConfig::with_root(root.path());
        config.guard_concurrency = Some(concurrency);
        let dispatcher = GuardDispatcher::new(config, executor.clone());

        Self {
            _root: root,
            project,
            executor,
            dispatcher,
        }
    }

    /// Swap the dispatcher's registry, keeping everything else.
    fn with_registry(mut self, registry: GuardRegistry) -> Self {
        self.dispatcher = self.dispatcher.with_registry(Arc::new(registry));
        self
    }

    fn with_sanitizer(mut self, sanitizer: PathSanitizer) -> Self {
        self.dispatcher = self.dispatcher.with_sanitizer(sanitizer);
        self
    }

    fn project_path(&self) -> PathBuf {
        std::fs::canonicalize(self.project.path()).unwrap()
    }

    fn target(&self) -> String {
        self.project.path().display().to_string()
    }

    fn touch(&self, relative: &str) {
        let path = self.project.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "{}\n").unwrap();
    }

    async fn check(&self, request: GuardCheckRequest) -> String {
        self.dispatcher.guard_check(&request).await
    }
}

#[tokio::test]
async fn test_auto_on_empty_directory_lists_languages_and_markers() {
    let harness = Harness::new(RecordingExecutor::default(), 2);

    let report = harness.check(GuardCheckRequest::new(harness.target(), "auto")).await;

    assert!(report.starts_with("no supported language detected"), "{report}");
    assert!(report.contains("python, rust, typescript, javascript, go"));
    assert!(report.contains("Cargo.toml(rust)"));
    assert!(report.contains("without tsconfig.json(javascript)"));
    assert!(harness.executor.commands().is_empty());
}

#[tokio::test]
async fn test_unknown_guard_lists_available_names() {
    let harness = Harness::new(RecordingExecutor::default(), 2);

    let report = harness
        .check(GuardCheckRequest::new(harness.target(), "javascript").guard("nonexistent"))
        .await;

    assert!(report.starts_with("unsupported guard: nonexistent"), "{report}");
    assert!(report.contains(concat!(
        "eslint_guards, any_abuse, console_residual, no_api_direct_ai_call, ",
        "no_dual_track_fallback, duplicate_constants"
    )));
    assert!(harness.executor.commands().is_empty());
}

#[tokio::test]
async fn test_unsupported_language_with_auto_hint() {
    let harness = Harness::new(RecordingExecutor::default(), 2);
    harness.touch("go.mod");

    let report = harness.check(GuardCheckRequest::new(harness.target(), "ruby")).await;

    assert!(report.starts_with("unsupported language: ruby."), "{report}");
    assert!(report.contains("Supported languages: python, rust, typescript, javascript, go"));
    assert!(report.contains("detected project language(s) go"));
    assert!(report.contains("\"auto\""));
}

#[tokio::test]
async fn test_unsupported_language_without_markers_has_no_hint() {
    let harness = Harness::new(RecordingExecutor::default(), 2);

    let report = harness.check(GuardCheckRequest::new(harness.target(), "ruby")).await;

    assert!(report.starts_with("unsupported language: ruby."));
    assert!(!report.contains("Hint"));
}

#[tokio::test]
async fn test_forbidden_and_missing_targets() {
    let harness = Harness::new(RecordingExecutor::default(), 2);

    let forbidden = harness.check(GuardCheckRequest::new("/etc", "rust")).await;
    assert_eq!(forbidden, "access to system directory is forbidden: /etc");

    let missing_path = harness.project.path().join("missing");
    let missing = harness
        .check(GuardCheckRequest::new(missing_path.display().to_string(), "rust"))
        .await;
    assert!(missing.starts_with("directory does not exist: "), "{missing}");

    assert!(harness.executor.commands().is_empty());
}

#[tokio::test]
async fn test_run_all_keeps_registration_order_and_separator() {
    let harness = Harness::new(RecordingExecutor::default(), 3);

    let report = harness.check(GuardCheckRequest::new(harness.target(), "rust")).await;

    let sections: Vec<&str> = report.split(GUARD_SEPARATOR).collect();
    let headers: Vec<&str> = sections
        .iter()
        .map(|section| section.lines().next().unwrap_or_default())
        .collect();
    assert_eq!(
        headers,
        vec![
            "[nested_locks] PASS (exit code: 0)",
            "[unwrap] PASS (exit code: 0)",
            "[duplicate_types] PASS (exit code: 0)",
            "[workspace_consistency] PASS (exit code: 0)",
            "[single_source_of_truth] PASS (exit code: 0)",
            "[semantic_effect] PASS (exit code: 0)",
        ]
    );
    assert!(sections[1].contains("ran check_unwrap_in_prod.sh"));
}

#[tokio::test]
async fn test_concurrency_limit_is_respected() {
    for limit in [1usize, 2, 4] {
        let harness = Harness::new(RecordingExecutor::default(), limit);

        harness.check(GuardCheckRequest::new(harness.target(), "typescript")).await;

        let peak = harness.executor.peak.load(Ordering::SeqCst);
        assert!(peak <= limit, "limit {limit}, peak {peak}");
        if limit > 1 {
            assert!(peak > 1, "limit {limit} ran serially");
        }
    }
}

#[tokio::test]
async fn test_panicking_guard_does_not_abort_siblings() {
    let executor = RecordingExecutor {
        panic_on: Some("check_unwrap_in_prod.sh"),
        ..RecordingExecutor::default()
    };
    let harness = Harness::new(executor, 2);

    let report = harness.check(GuardCheckRequest::new(harness.target(), "rust")).await;

    let sections: Vec<&str> = report.split(GUARD_SEPARATOR).collect();
    assert_eq!(sections.len(), 6);
    assert!(sections[1].starts_with("[unwrap] ISSUES FOUND (exit code: 1)"));
    assert!(sections[1].contains("runtime error:\nexecutor exploded on check_unwrap_in_prod.sh"));
    assert!(sections[0].starts_with("[nested_locks] PASS"));
    assert!(sections[5].starts_with("[semantic_effect] PASS"));
    assert_eq!(harness.executor.commands().len(), 6);
}

#[tokio::test]
async fn test_failing_guard_reports_issues() {
    let executor = RecordingExecutor {
        fail_on: Some("check_duplicates.py"),
        ..RecordingExecutor::default()
    };
    let harness = Harness::new(executor, 2);

    let report = harness
        .check(GuardCheckRequest::new(harness.target(), "python").guard("duplicates"))
        .await;

    assert_eq!(report, "[duplicates] ISSUES FOUND (exit code: 1)\n\nran check_duplicates.py\n");
}

#[tokio::test]
async fn test_strict_flag_placement() {
    let harness = Harness::new(RecordingExecutor::default(), 1);
    let target = harness.project_path().display().to_string();

    harness
        .check(GuardCheckRequest::new(harness.target(), "rust").guard("unwrap").strict(true))
        .await;
    harness
        .check(GuardCheckRequest::new(harness.target(), "python").guard("duplicates").strict(true))
        .await;
    harness
        .check(GuardCheckRequest::new(harness.target(), "python").guard("naming").strict(true))
        .await;

    let commands = harness.executor.commands();
    assert_eq!(commands[0].program, "bash");
    assert_eq!(commands[0].args[1..], ["--strict".to_string(), target.clone()]);
    assert_eq!(commands[1].program, "python3");
    assert_eq!(commands[1].args[1..], [target.clone(), "--strict".to_string()]);
    assert_eq!(commands[2].args[1..], [target]);
    assert!(commands[0].args[0].ends_with("guards/rust/check_unwrap_in_prod.sh"));
}

#[tokio::test]
async fn test_go_vet_runs_in_target() {
    let harness = Harness::new(RecordingExecutor::default(), 2);

    let report = harness.check(GuardCheckRequest::new(harness.target(), "go")).await;

    assert!(report.starts_with("[vet] PASS"));
    let commands = harness.executor.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].program, "go");
    assert_eq!(commands[0].args, vec!["vet", "./..."]);
    assert_eq!(commands[0].cwd, Some(harness.project_path()));
}

#[tokio::test]
async fn test_lint_guard_without_config_is_info() {
    let harness = Harness::new(RecordingExecutor::default(), 2);

    let report = harness
        .check(GuardCheckRequest::new(harness.target(), "typescript").guard("eslint_guards"))
        .await;

    assert!(report.starts_with("[eslint_guards] INFO"), "{report}");
    assert!(report.contains("rules/typescript.md"));
    assert!(report.contains("guards/typescript/eslint-guards.ts"));
    assert!(harness.executor.commands().is_empty());
}

#[tokio::test]
async fn test_lint_guard_with_config_runs_eslint() {
    let harness = Harness::new(RecordingExecutor::default(), 2);
    harness.touch("web/.eslintrc.json");

    let report = harness
        .check(GuardCheckRequest::new(harness.target(), "javascript").guard("eslint_guards"))
        .await;

    assert!(report.starts_with("[eslint_guards] PASS"));
    let commands = harness.executor.commands();
    assert_eq!(commands[0].program, "npx");
    assert_eq!(commands[0].args, vec!["eslint", "--max-warnings=0", "."]);
    assert_eq!(commands[0].cwd, Some(harness.project_path()));
    assert_eq!(commands[0].timeout, Duration::from_secs(120));
}

#[tokio::test]
async fn test_quality_guard_template_lookup() {
    let harness = Harness::new(RecordingExecutor::default(), 2);

    let missing = harness
        .check(GuardCheckRequest::new(harness.target(), "python").guard("quality"))
        .await;
    assert!(missing.starts_with("[quality] INFO"), "{missing}");
    assert!(missing.contains("test_code_quality_guards.py"));

    harness.touch("tests/test_code_quality_guards.py");
    let found = harness
        .check(GuardCheckRequest::new(harness.target(), "python").guard("quality"))
        .await;
    assert!(found.starts_with("[quality] PASS"));

    let commands = harness.executor.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].program, "python3");
    assert_eq!(commands[0].args[..2], ["-m".to_string(), "pytest".to_string()]);
    assert!(commands[0].args[2].ends_with("tests/test_code_quality_guards.py"));
}

#[tokio::test]
async fn test_auto_mode_sections_per_language() {
    let harness = Harness::new(RecordingExecutor::default(), 2);
    harness.touch("go.mod");
    harness.touch("requirements.txt");

    let report = harness.check(GuardCheckRequest::new(harness.target(), "auto")).await;

    assert!(report.starts_with("[auto] detected languages: python, go\n"), "{report}");
    let python = report.find("== python ==").unwrap();
    let go = report.find("== go ==").unwrap();
    assert!(python < go);
    assert!(report[go..].contains("[vet] PASS"));
}

#[tokio::test]
async fn test_auto_mode_with_guard_applies_per_language() {
    let harness = Harness::new(RecordingExecutor::default(), 2);
    harness.touch("go.mod");
    harness.touch("Cargo.toml");

    let report = harness
        .check(GuardCheckRequest::new(harness.target(), "auto").guard("vet"))
        .await;

    assert!(report.contains("== rust ==\nunsupported guard: vet. Available rust guards:"));
    assert!(report.contains("== go ==\n[vet] PASS"));
    assert_eq!(harness.executor.commands().len(), 1);
}

#[tokio::test]
async fn test_compliance_and_metrics_commands() {
    let harness = Harness::new(RecordingExecutor::default(), 2);
    let project = harness.project_path().display().to_string();

    let compliance = harness.dispatcher.compliance_report(&harness.target()).await;
    let metrics = harness.dispatcher.metrics_collect(&harness.target()).await;

    assert_eq!(compliance, "[compliance_report] PASS (exit code: 0)\n\nran compliance_check.sh\n");
    assert!(metrics.starts_with("[metrics_collect] PASS"));

    let commands = harness.executor.commands();
    assert_eq!(commands.len(), 2);
    assert!(commands[0].args[0].ends_with("scripts/compliance_check.sh"));
    assert_eq!(commands[0].args[1], project);
    assert!(commands[1].args[0].ends_with("scripts/metrics_collector.sh"));

    let rejected = harness.dispatcher.metrics_collect("/proc").await;
    assert!(rejected.contains("forbidden"));
}

#[test]
fn test_repeated_checks_are_identical() {
    let harness = Harness::new(RecordingExecutor::default(), 2);
    harness.touch("Cargo.toml");

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let first = runtime.block_on(harness.check(GuardCheckRequest::new(harness.target(), "auto")));
    let second =
        tokio_test::block_on(harness.check(GuardCheckRequest::new(harness.target(), "auto")));

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_custom_registry_drives_dispatch() {
    let registry = GuardRegistry::from_entries(vec![
        (
            Language::Go,
            vec![
                GuardDescriptor::tool("fmt", "gofmt", &["-l", "."], WorkingDir::Target),
                GuardDescriptor::script("shadow", "bash", "go/shadow.sh", StrictFlag::BeforeTarget),
            ],
        ),
        (Language::Go, Vec::new()),
    ]);
    let harness = Harness::new(RecordingExecutor::default(), 2).with_registry(registry);

    let rejected = harness.check(GuardCheckRequest::new(harness.target(), "rust")).await;
    assert_eq!(rejected, "unsupported language: rust. Supported languages: go");

    let report = harness.check(GuardCheckRequest::new(harness.target(), "go")).await;
    let headers: Vec<&str> = report
        .split(GUARD_SEPARATOR)
        .map(|section| section.lines().next().unwrap_or_default())
        .collect();
    assert_eq!(headers, vec!["[fmt] PASS (exit code: 0)", "[shadow] PASS (exit code: 0)"]);

    let commands = harness.executor.commands();
    assert_eq!(commands[0].program, "gofmt");
    assert_eq!(commands[0].cwd, Some(harness.project_path()));
    assert!(commands[1].args[0].ends_with("guards/go/shadow.sh"));
}

#[tokio::test]
async fn test_custom_deny_list_rejects_target() {
    let harness = Harness::new(RecordingExecutor::default(), 2);
    let denied = harness.project_path();
    let harness = harness.with_sanitizer(PathSanitizer::with_forbidden(vec![denied]));

    let report = harness.check(GuardCheckRequest::new(harness.target(), "go")).await;

    assert!(report.starts_with("access to system directory is forbidden: "), "{report}");
    assert!(harness.executor.commands().is_empty());
}
