//! MCP tools served by `macals serve`

pub mod light;
