//! Shared utilities for the MCP tools

use rmcp::ErrorData as McpError;

/// Create an internal error
pub fn internal_error(msg: impl Into<String>) -> McpError {
    McpError::internal_error(msg.into(), None)
}

/// Map a sensor error into an MCP error with context
pub fn sensor_error(context: &str, e: macals::Error) -> McpError {
    internal_error(format!("{}: {}", context, e))
}
