// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # vibeguard-core
//!
//! Guard orchestration engine: validates target directories, detects project
//! languages, dispatches registered guards as supervised child processes with
//! bounded concurrency, and renders every outcome as a plain-text report.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, use cases, process supervision and the MCP surface

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use application::guard_dispatcher::{GuardCheckRequest, GuardDispatcher};
pub use domain::config::OrchestratorConfig;
