//! Plain-text sensor report

use std::io::{self, Write};

use serde::Serialize;

use crate::error::Result;
use crate::registry::Registry;
use crate::sensor::LightSensor;

/// One successful sensor reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub name: String,
    pub lux: f32,
}

impl Reading {
    pub fn from_sensor<R: Registry>(sensor: &LightSensor<R>) -> Result<Self> {
        Ok(Self {
            name: sensor.name().to_string(),
            lux: sensor.current_lux()?,
        })
    }
}

/// `<name>: <lux> lux` with one decimal place
pub fn format_reading(reading: &Reading) -> String {
    format!("{}: {:.1} lux", reading.name, reading.lux)
}

/// Read every sensor, silently dropping the ones that fail
pub fn collect_readings<R, I>(sensors: I) -> Vec<Reading>
where
    R: Registry,
    I: IntoIterator<Item = Result<LightSensor<R>>>,
{
    sensors
        .into_iter()
        .filter_map(|sensor| match sensor.and_then(|s| Reading::from_sensor(&s)) {
            Ok(reading) => Some(reading),
            Err(e) => {
                tracing::debug!("Skipping sensor: {}", e);
                None
            }
        })
        .collect()
}

/// Write one line per reading, returning how many were written
pub fn write_report<W: Write>(readings: &[Reading], out: &mut W) -> io::Result<usize> {
    for reading in readings {
        writeln!(out, "{}", format_reading(reading))?;
    }
    Ok(readings.len())
}
