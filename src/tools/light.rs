//! Ambient light sensor tools

use crate::shared::sensor_error;
use macals::report::{collect_readings, format_reading, Reading};
use macals::{find_first_in, scan_in, LightSensor, Registry};
use rmcp::{model::*, ErrorData as McpError};
use schemars::JsonSchema;
use serde::Deserialize;

// === Parameter Types ===

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SensorNameParams {
    #[schemars(
        description = "Registry service name of the sensor (optional - uses the configured sensor, then the first sensor found)"
    )]
    pub name: Option<String>,
}

// === Helper Functions ===

fn list_text<R: Registry>(registry: R) -> Result<String, McpError> {
    let sensors =
        scan_in(registry).map_err(|e| sensor_error("Failed to scan for light sensors", e))?;
    let readings = collect_readings(sensors);

    let mut result = String::from("Ambient Light Sensors:\n\n");
    if readings.is_empty() {
        result.push_str("No ambient light sensors found.\n");
    } else {
        for reading in &readings {
            result.push_str(&format!("  {}\n", format_reading(reading)));
        }
        result.push_str(&format!("\nTotal sensors: {}\n", readings.len()));
    }
    Ok(result)
}

fn reading_text<R: Registry>(sensor: &LightSensor<R>) -> Result<String, McpError> {
    let reading = Reading::from_sensor(sensor)
        .map_err(|e| sensor_error(&format!("Failed to read {}", sensor), e))?;
    Ok(format_reading(&reading))
}

fn current_lux_text<R: Registry>(registry: R, name: Option<&str>) -> Result<String, McpError> {
    let sensor = match name {
        Some(name) => LightSensor::open_in(registry, name)
            .map_err(|e| sensor_error("Failed to open sensor", e))?,
        None => {
            find_first_in(registry).map_err(|e| sensor_error("Failed to find sensor", e))?
        }
    };
    reading_text(&sensor)
}

// === Tool Functions ===

pub async fn list_light_sensors<R: Registry>(registry: R) -> Result<CallToolResult, McpError> {
    let result = list_text(registry)?;
    Ok(CallToolResult::success(vec![Content::text(result)]))
}

pub async fn find_light_sensor<R: Registry>(registry: R) -> Result<CallToolResult, McpError> {
    let result = current_lux_text(registry, None)?;
    Ok(CallToolResult::success(vec![Content::text(result)]))
}

pub async fn get_current_lux<R: Registry>(
    registry: R,
    params: SensorNameParams,
    default_sensor: Option<&str>,
) -> Result<CallToolResult, McpError> {
    let name = params.name.as_deref().or(default_sensor);
    let result = current_lux_text(registry, name)?;
    Ok(CallToolResult::success(vec![Content::text(result)]))
}
