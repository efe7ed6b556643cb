// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! MCP stdio server command

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

use vibeguard_core::application::guard_dispatcher::GuardDispatcher;
use vibeguard_core::domain::config::OrchestratorConfig;
use vibeguard_core::presentation::mcp::McpServer;

/// Serve MCP on stdin/stdout until the client disconnects.
pub async fn serve(config: OrchestratorConfig) -> Result<()> {
    let dispatcher = GuardDispatcher::with_process_executor(config);
    info!(root = %dispatcher.root().display(), "Starting MCP server");

    McpServer::new(Arc::new(dispatcher))
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .context("MCP stdio transport failed")
}
