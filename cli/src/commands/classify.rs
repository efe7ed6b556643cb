// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Follow-up classification command

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};

use vibeguard_core::application::task_classifier::TaskClassifier;
use vibeguard_core::domain::classification::Classification;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Changed file paths
    #[arg(long, num_args = 1.., value_name = "FILE")]
    pub files: Vec<String>,

    /// Error output to classify ("-" reads stdin)
    #[arg(long, value_name = "FILE")]
    pub error_log: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn classify(args: ClassifyArgs) -> Result<bool> {
    let error_output = match &args.error_log {
        Some(path) => Some(read_error_log(path)?),
        None => None,
    };

    let classification = TaskClassifier::new().classify(&args.files, error_output.as_deref());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&classification)?);
    } else {
        print_classification(classification.as_ref());
    }
    Ok(true)
}

fn read_error_log(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read error log from stdin")?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read error log {}", path.display()))
}

fn print_classification(classification: Option<&Classification>) {
    match classification {
        Some(c) => {
            println!("{} {}", "Suggested agent:".bold(), c.agent.green());
            println!("  Confidence: {}", c.confidence);
            println!("  Reason: {}", c.reason);
        }
        None => println!("{}", "ℹ No follow-up signal; pick an agent manually".yellow()),
    }
}
