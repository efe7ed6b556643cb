// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod guard_dispatcher;
pub mod guard_registry;
pub mod language_detector;
pub mod task_classifier;
pub mod task_runner;

// Re-export use cases for convenience
pub use guard_dispatcher::{DispatchError, GuardCheckRequest, GuardDispatcher};
pub use task_classifier::TaskClassifier;
