// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Guard
//!
//! Guard descriptors are immutable invocation recipes. Building an
//! invocation is deterministic given `(root, target_dir, strict)` and has no
//! side effects; two recipe kinds need bespoke handling by the dispatcher
//! and build nothing.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements guard descriptors and invocation recipes

use std::path::Path;

use crate::domain::execution::CommandSpec;

/// Where the `--strict` flag goes, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrictFlag {
    /// `<script> --strict <target>`
    BeforeTarget,
    /// `<script> <target> --strict`
    AfterTarget,
    /// The guard has no strict mode.
    Unsupported,
}

/// Working directory for an ordinary guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingDir {
    /// The configured guard root.
    Root,
    /// The validated target directory.
    Target,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardRecipe {
    /// A bundled script under `<root>/guards/`.
    Script {
        interpreter: &'static str,
        script: &'static str,
        strict: StrictFlag,
    },
    /// A toolchain command with fixed arguments.
    Tool {
        program: &'static str,
        args: &'static [&'static str],
        cwd: WorkingDir,
    },
    /// Runs the project's own lint configuration when one exists.
    LintConfig,
    /// Runs a project-local quality test file when one exists.
    QualityTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardDescriptor {
    pub name: &'static str,
    pub recipe: GuardRecipe,
}

impl GuardDescriptor {
    pub const fn script(
        name: &'static str,
        interpreter: &'static str,
        script: &'static str,
        strict: StrictFlag,
    ) -> Self {
        Self {
            name,
            recipe: GuardRecipe::Script {
                interpreter,
                script,
                strict,
            },
        }
    }

    pub const fn tool(
        name: &'static str,
        program: &'static str,
        args: &'static [&'static str],
        cwd: WorkingDir,
    ) -> Self {
        Self {
            name,
            recipe: GuardRecipe::Tool { program, args, cwd },
        }
    }

    pub const fn special(name: &'static str, recipe: GuardRecipe) -> Self {
        Self { name, recipe }
    }

    pub fn is_special(&self) -> bool {
        matches!(
            self.recipe,
            GuardRecipe::LintConfig | GuardRecipe::QualityTemplate
        )
    }

    /// Build the command for an ordinary guard. Special recipes return `None`.
    pub fn build(&self, root: &Path, target_dir: &Path, strict: bool) -> Option<CommandSpec> {
        match &self.recipe {
            GuardRecipe::Script {
                interpreter,
                script,
                strict: flag,
            } => {
                let script = root.join("guards").join(script).display().to_string();
                let target = target_dir.display().to_string();
                let args = match (flag, strict) {
                    (StrictFlag::BeforeTarget, true) => {
                        vec![script, "--strict".to_string(), target]
                    }
                    (StrictFlag::AfterTarget, true) => vec![script, target, "--strict".to_string()],
                    _ => vec![script, target],
                };
                Some(CommandSpec::new(*interpreter).args(args))
            }
            GuardRecipe::Tool { program, args, cwd } => {
                let spec = CommandSpec::new(*program).args(args.iter().copied());
                Some(match cwd {
                    WorkingDir::Root => spec,
                    WorkingDir::Target => spec.current_dir(target_dir),
                })
            }
            GuardRecipe::LintConfig | GuardRecipe::QualityTemplate => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const ROOT: &str = "/opt/vibeguard";
    const TARGET: &str = "/work/project";

    fn build(descriptor: &GuardDescriptor, strict: bool) -> Option<CommandSpec> {
        descriptor.build(Path::new(ROOT), Path::new(TARGET), strict)
    }

    #[test]
    fn test_strict_before_target() {
        let guard = GuardDescriptor::script(
            "unwrap",
            "bash",
            "rust/check_unwrap_in_prod.sh",
            StrictFlag::BeforeTarget,
        );
        let spec = build(&guard, true).unwrap();
        assert_eq!(spec.program, "bash");
        assert_eq!(
            spec.args,
            vec![
                "/opt/vibeguard/guards/rust/check_unwrap_in_prod.sh",
                "--strict",
                TARGET
            ]
        );
        assert_eq!(spec.cwd, None);
        assert_eq!(build(&guard, false).unwrap().args.len(), 2);
    }

    #[test]
    fn test_strict_after_target() {
        let guard = GuardDescriptor::script(
            "duplicates",
            "python3",
            "python/check_duplicates.py",
            StrictFlag::AfterTarget,
        );
        let spec = build(&guard, true).unwrap();
        assert_eq!(spec.args.last().map(String::as_str), Some("--strict"));
        assert_eq!(spec.args[1], TARGET);
    }

    #[test]
    fn test_strict_ignored_when_unsupported() {
        let guard = GuardDescriptor::script(
            "naming",
            "python3",
            "python/check_naming_convention.py",
            StrictFlag::Unsupported,
        );
        assert_eq!(build(&guard, true), build(&guard, false));
    }

    #[test]
    fn test_tool_runs_in_target() {
        let guard = GuardDescriptor::tool("vet", "go", &["vet", "./..."], WorkingDir::Target);
        let spec = build(&guard, true).unwrap();
        assert_eq!(spec.args, vec!["vet", "./..."]);
        assert_eq!(spec.cwd, Some(PathBuf::from(TARGET)));
    }

    #[test]
    fn test_special_recipes_build_nothing() {
        let lint = GuardDescriptor::special("eslint_guards", GuardRecipe::LintConfig);
        let quality = GuardDescriptor::special("quality", GuardRecipe::QualityTemplate);
        assert!(lint.is_special() && quality.is_special());
        assert!(build(&lint, false).is_none());
        assert!(build(&quality, true).is_none());
    }

    #[test]
    fn test_build_is_deterministic() {
        let guard = GuardDescriptor::script(
            "any_abuse",
            "bash",
            "typescript/check_any_abuse.sh",
            StrictFlag::BeforeTarget,
        );
        assert_eq!(build(&guard, true), build(&guard, true));
    }
}
