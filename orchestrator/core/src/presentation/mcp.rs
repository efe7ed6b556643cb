// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! MCP tool server
//!
//! Newline-delimited JSON-RPC 2.0 over any async reader/writer pair (stdio in
//! production). Exposes `guard_check`, `compliance_report` and
//! `metrics_collect` as MCP tools; each answers with a single text block.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::application::guard_dispatcher::{GuardCheckRequest, GuardDispatcher};
use crate::domain::language::AUTO_LANGUAGE;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    /// `None` only when the member is absent (a notification); an explicit
    /// `null` id is `Some(Value::Null)` and still gets a reply.
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ProjectArguments {
    project_dir: String,
}

pub struct McpServer {
    dispatcher: Arc<GuardDispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Arc<GuardDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Serve until the reader reaches EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("MCP server listening on stdio");
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        info!("MCP client closed the stream");
        Ok(())
    }

    /// Handle one raw message; `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(line) {
            Err(e) => Some(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::new(PARSE_ERROR, format!("parse error: {e}")),
            )),
            Ok(value) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value::<JsonRpcRequest>(value) {
                    Ok(request) => self.handle_request(request).await,
                    Err(e) => Some(JsonRpcResponse::failure(
                        id,
                        JsonRpcError::new(
                            INVALID_REQUEST,
                            format!("invalid request: {e}"),
                        ),
                    )),
                }
            }
        }?;

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Failed to serialize response");
                None
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "MCP request");
        let Some(id) = request.id else {
            // Notifications never get a reply, known or not.
            return None;
        };

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tool_definitions() })),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            )),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "vibeguard",
                "version": env!("CARGO_PKG_VERSION"),
            }
        })
    }

    pub fn tool_definitions(&self) -> Vec<Value> {
        let mut languages: Vec<&str> = self
            .dispatcher
            .registry()
            .languages()
            .map(|language| language.as_str())
            .collect();
        languages.push(AUTO_LANGUAGE);

        let project_schema = json!({
            "type": "object",
            "properties": {
                "project_dir": {
                    "type": "string",
                    "description": "Absolute path of the target project"
                }
            },
            "required": ["project_dir"]
        });

        vec![
            json!({
                "name": "guard_check",
                "description": "Run language-specific guards \
                    (duplication, naming, code quality, nested locks, unwrap, ...)",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "target_dir": {
                            "type": "string",
                            "description": "Absolute path of the target project"
                        },
                        "language": {
                            "type": "string",
                            "enum": languages,
                            "description": "Project language, or auto to detect"
                        },
                        "guard": {
                            "type": "string",
                            "description": "Single guard; omit to run every guard of the language"
                        },
                        "strict": {
                            "type": "boolean",
                            "default": false,
                            "description": "Strict mode: guards exit non-zero on findings"
                        }
                    },
                    "required": ["target_dir", "language"]
                }
            }),
            json!({
                "name": "compliance_report",
                "description": "Run the compliance check and return a PASS/WARN/FAIL report",
                "inputSchema": project_schema.clone(),
            }),
            json!({
                "name": "metrics_collect",
                "description": "Collect quantitative project metrics",
                "inputSchema": project_schema,
            }),
        ]
    }

    async fn call_tool(&self, params: Value) -> Result<Value, JsonRpcError> {
        let call: ToolCallParams = serde_json::from_value(params)
            .map_err(|e| {
                JsonRpcError::new(INVALID_PARAMS, format!("invalid tools/call params: {e}"))
            })?;
        info!(tool = %call.name, "Tool call");

        let text = match call.name.as_str() {
            "guard_check" => {
                let request: GuardCheckRequest = parse_arguments(call.arguments)?;
                self.dispatcher.guard_check(&request).await
            }
            "compliance_report" => {
                let args: ProjectArguments = parse_arguments(call.arguments)?;
                self.dispatcher.compliance_report(&args.project_dir).await
            }
            "metrics_collect" => {
                let args: ProjectArguments = parse_arguments(call.arguments)?;
                self.dispatcher.metrics_collect(&args.project_dir).await
            }
            other => {
                return Err(JsonRpcError::new(INVALID_PARAMS, format!("unknown tool: {other}")));
            }
        };

        Ok(json!({ "content": [{ "type": "text", "text": text }] }))
    }
}

fn parse_arguments<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(arguments)
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("invalid arguments: {e}")))
}
