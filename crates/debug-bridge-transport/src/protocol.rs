//! JSON-RPC tool protocol for external agents.
//!
//! A request/response subset of the Model Context Protocol: `initialize`,
//! `ping`, `tools/list` and `tools/call`. Every tool is a read-only query
//! against a [`DebugStore`].

use std::sync::Arc;

use debug_bridge_core::{DebugStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Name reported in `initialize` and `/mcp-info`.
pub const SERVER_NAME: &str = "VS Code Debug Tools";

/// Protocol revision spoken by [`ToolServer`].
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// The only JSON-RPC version accepted and emitted.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC request. A request without `id` is a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Parse a request body.
    ///
    /// # Errors
    /// Returns a parse error for invalid JSON and an invalid-request error
    /// for JSON that is not a single `"jsonrpc": "2.0"` request object.
    pub fn parse(body: &[u8]) -> Result<Self, JsonRpcError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| JsonRpcError::new(JsonRpcError::PARSE_ERROR, format!("Parse error: {e}")))?;
        let request: Self = serde_json::from_value(value).map_err(|e| {
            JsonRpcError::new(JsonRpcError::INVALID_REQUEST, format!("Invalid request: {e}"))
        })?;

        if request.jsonrpc != JSONRPC_VERSION {
            return Err(JsonRpcError::new(
                JsonRpcError::INVALID_REQUEST,
                format!("Invalid request: unsupported jsonrpc version {:?}", request.jsonrpc),
            ));
        }

        Ok(request)
    }

    /// Whether the sender expects no response.
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    #[must_use]
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(id: Option<Value>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<StoreError> for JsonRpcError {
    fn from(e: StoreError) -> Self {
        Self::new(Self::INTERNAL_ERROR, e.to_string())
    }
}

/// Read-only tools exposed to agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GetVariables,
    GetStackTrace,
    GetBreakpoints,
    GetSessions,
}

/// Name and description of a tool.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
}

impl Tool {
    pub const ALL: [Self; 4] = [
        Self::GetVariables,
        Self::GetStackTrace,
        Self::GetBreakpoints,
        Self::GetSessions,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetVariables => "get_variables",
            Self::GetStackTrace => "get_stack_trace",
            Self::GetBreakpoints => "get_breakpoints",
            Self::GetSessions => "get_sessions",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::GetVariables => "Returns the latest debug variables",
            Self::GetStackTrace => "Returns the current stack trace",
            Self::GetBreakpoints => "Returns the current breakpoints",
            Self::GetSessions => "Returns every recorded debug session with its event log",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    #[must_use]
    pub const fn info(self) -> ToolInfo {
        ToolInfo {
            name: self.name(),
            description: self.description(),
        }
    }

    fn descriptor(self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": {"type": "object", "properties": {}},
        })
    }
}

/// Tool protocol handler over a store.
pub struct ToolServer<S> {
    store: Arc<S>,
}

impl<S: DebugStore> ToolServer<S> {
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Handle one request. Notifications produce no response.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification received");
            return None;
        }

        let response = match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(e) => {
                tracing::warn!(method = %request.method, code = e.code, "{}", e.message);
                JsonRpcResponse::failure(request.id, e)
            }
        };
        Some(response)
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {"listChanged": false}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                }
            })),

            "ping" => Ok(json!({})),

            "tools/list" => Ok(json!({
                "tools": Tool::ALL.map(Tool::descriptor),
            })),

            "tools/call" => {
                let params = params.ok_or_else(|| {
                    JsonRpcError::new(JsonRpcError::INVALID_PARAMS, "Missing params")
                })?;

                let name = params
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        JsonRpcError::new(JsonRpcError::INVALID_PARAMS, "Missing tool name")
                    })?;

                let tool = Tool::from_name(name).ok_or_else(|| {
                    JsonRpcError::new(JsonRpcError::INVALID_PARAMS, format!("Unknown tool: {name}"))
                })?;

                let result = self.call_tool(tool).await?;
                Ok(json!({
                    "content": [{"type": "text", "text": result.to_string()}],
                    "structuredContent": {"result": result},
                    "isError": false,
                }))
            }

            _ => Err(JsonRpcError::new(
                JsonRpcError::METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            )),
        }
    }

    /// Run a tool and return its raw result.
    ///
    /// Variables, stack and breakpoints come from the latest view, so they
    /// reflect the most recent submission whether or not a session is active.
    ///
    /// # Errors
    /// Returns an internal error if the store cannot be read.
    pub async fn call_tool(&self, tool: Tool) -> Result<Value, JsonRpcError> {
        let (key, fallback) = match tool {
            Tool::GetVariables => ("variables", json!({})),
            Tool::GetStackTrace => ("stack", json!([])),
            Tool::GetBreakpoints => ("breakpoints", json!([])),
            Tool::GetSessions => {
                let list = self.store.sessions().await?;
                return serde_json::to_value(list)
                    .map_err(|e| JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, e.to_string()));
            }
        };

        let mut view = self.store.query().await?;
        Ok(view.fields.remove(key).unwrap_or(fallback))
    }
}
