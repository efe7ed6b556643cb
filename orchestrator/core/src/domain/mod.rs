// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! Value types and pure rules shared by the use cases. Nothing here spawns
//! processes; the only I/O is path validation and config file loading.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Languages, guard descriptors, commands, reports, config

pub mod classification;
pub mod config;
pub mod execution;
pub mod guard;
pub mod language;
pub mod path_sanitizer;
pub mod report;
