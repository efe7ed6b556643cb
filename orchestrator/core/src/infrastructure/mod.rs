// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod process_executor;

pub use process_executor::ProcessExecutor;
