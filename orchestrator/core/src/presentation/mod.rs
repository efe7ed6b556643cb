// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`vibeguard-core`)
//!
//! Transport surface that translates external requests into application
//! service calls. **No business logic lives here**; all real work is
//! delegated to [`crate::application::guard_dispatcher`].
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`mcp`] | JSON-RPC over stdio | MCP tool server exposing the three orchestration tools |

pub mod mcp;
