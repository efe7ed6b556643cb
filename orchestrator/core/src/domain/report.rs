// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Report
//!
//! Text rendering for guard results. Every orchestration operation answers
//! with one of these strings, including usage errors.

use crate::domain::execution::{ExecutionResult, FAILURE_EXIT_CODE};

/// Separator between guard reports of one language.
pub const GUARD_SEPARATOR: &str = "\n---\n\n";

pub fn format_result(guard_name: &str, result: &ExecutionResult) -> String {
    format_output(
        guard_name,
        &result.stdout_lossy(),
        &result.stderr_lossy(),
        result.exit_code,
    )
}

pub fn format_output(guard_name: &str, stdout: &str, stderr: &str, exit_code: i32) -> String {
    let status = if exit_code == 0 { "PASS" } else { "ISSUES FOUND" };
    let mut output = format!("[{guard_name}] {status} (exit code: {exit_code})\n");

    let stdout = stdout.trim();
    if !stdout.is_empty() {
        output.push_str(&format!("\n{stdout}\n"));
    }

    let stderr = stderr.trim();
    if !stderr.is_empty() {
        output.push_str(&format!("\nstderr:\n{stderr}\n"));
    }

    output
}

/// A guard whose task failed before producing an [`ExecutionResult`].
pub fn format_runtime_error(guard_name: &str, message: &str) -> String {
    format!(
        "[{guard_name}] ISSUES FOUND (exit code: {FAILURE_EXIT_CODE})\n\n\
         runtime error:\n{message}\n"
    )
}

/// A non-failing notice for guards that had nothing to run.
pub fn format_info(guard_name: &str, body: &str) -> String {
    format!("[{guard_name}] INFO\n\n{body}")
}
