//! MCP server exposing the ambient light sensors as tools

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters, ServerHandler},
    model::*,
    ErrorData as McpError,
    ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;

use macals::SystemRegistry;

use crate::config::Config;
use crate::tools;

// === Common Parameter Types ===

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EmptyParams {}

// === Server ===

#[derive(Debug)]
pub struct LuxServer {
    pub tool_router: ToolRouter<Self>,
    default_sensor: Option<String>,
}

impl LuxServer {
    pub fn new(config: Config) -> Self {
        let mut tool_router = Self::tool_router();

        for tool_name in &config.disabled {
            if tool_router.has_route(tool_name) {
                tool_router.remove_route(tool_name);
                tracing::info!("Disabled tool: {}", tool_name);
            } else {
                tracing::warn!("Config disables unknown tool: {}", tool_name);
            }
        }

        Self {
            tool_router,
            default_sensor: config.sensor,
        }
    }
}

#[rmcp::tool_router]
impl LuxServer {
    #[rmcp::tool(description = "List every ambient light sensor with its current reading in lux")]
    pub async fn list_light_sensors(
        &self,
        Parameters(_params): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        tools::light::list_light_sensors(SystemRegistry::default()).await
    }

    #[rmcp::tool(description = "Find the first ambient light sensor and return its current reading")]
    pub async fn find_light_sensor(
        &self,
        Parameters(_params): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        tools::light::find_light_sensor(SystemRegistry::default()).await
    }

    #[rmcp::tool(description = "Get the current ambient light level in lux from a named sensor")]
    pub async fn get_current_lux(
        &self,
        Parameters(params): Parameters<tools::light::SensorNameParams>,
    ) -> Result<CallToolResult, McpError> {
        tools::light::get_current_lux(
            SystemRegistry::default(),
            params,
            self.default_sensor.as_deref(),
        )
        .await
    }
}

#[rmcp::tool_handler]
impl ServerHandler for LuxServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "macals: ambient light sensor readings (lux) from the IOKit service registry"
                    .to_string(),
            ),
        }
    }
}

/// Run the MCP server on stdio until the client disconnects
pub fn run(config: Config) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(serve(config))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting macals server");

    let server = LuxServer::new(config);
    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;

    tracing::info!("macals server stopped");
    Ok(())
}
