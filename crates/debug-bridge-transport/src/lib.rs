//! Transport layer for debugger clients and agents.
//!
//! Provides:
//! - Tool protocol (JSON-RPC 2.0, MCP subset)
//! - HTTP routes (feature: http)

pub mod protocol;

#[cfg(feature = "http")]
pub mod http;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, Tool, ToolServer};

#[cfg(feature = "http")]
pub use http::create_router;
