//! macals: ambient light sensor readings from the macOS IOKit registry
//!
//! Two operations: enumerate the registry services that expose a `CurrentLux`
//! property, and read the current value of a named one.
//!
//! ```no_run
//! for sensor in macals::list_sensors()? {
//!     let sensor = sensor?;
//!     println!("{}: {:.1} lux", sensor.name(), sensor.current_lux()?);
//! }
//! # Ok::<(), macals::Error>(())
//! ```
//!
//! Every registry reference is owned by exactly one value and released once,
//! on drop or on an explicit `release()`/`close()`. Nothing is cached; each
//! call goes back to the live registry.

pub mod error;
pub mod registry;
pub mod report;
pub mod scan;
pub mod sensor;

pub use error::{Error, Result};
pub use registry::{Registry, SystemRegistry};
pub use scan::{find_first, find_first_in, scan, scan_in, CursorPhase, SensorIter};
pub use sensor::LightSensor;

/// Cursor over every ambient light sensor in the system registry
pub fn list_sensors() -> Result<SensorIter> {
    scan()
}

/// The first ambient light sensor in the system registry
pub fn find_sensor() -> Result<LightSensor> {
    find_first()
}
