//! Ambient light sensor handle

use std::fmt;

use crate::error::{Error, Result};
use crate::registry::{
    bounded_name, PropertyValue, Registry, RegistryObject, SystemRegistry, LUX_PROPERTY,
    SERVICE_CLASS,
};

/// An open ambient light sensor service
///
/// Owns its service reference exclusively; the reference is released by
/// [`LightSensor::release`] or on drop, whichever happens first.
pub struct LightSensor<R: Registry = SystemRegistry> {
    name: String,
    service: RegistryObject<R>,
}

impl LightSensor<SystemRegistry> {
    /// Open the service named `name` in the system registry
    pub fn open(name: &str) -> Result<Self> {
        Self::open_in(SystemRegistry::default(), name)
    }
}

impl<R: Registry> LightSensor<R> {
    /// Open the first service in `registry` whose name equals `name`
    pub fn open_in(registry: R, name: &str) -> Result<Self> {
        let iterator = registry.matching_services(SERVICE_CLASS)?;
        let iterator = RegistryObject::new(registry.clone(), iterator);

        while let Some(candidate) = registry.next_service(iterator.raw()) {
            let candidate = RegistryObject::new(registry.clone(), candidate);
            match registry.service_name(candidate.raw()) {
                Ok(candidate_name) if candidate_name == name => {
                    tracing::debug!("Opened service '{}'", name);
                    return Ok(Self {
                        name: bounded_name(name),
                        service: candidate,
                    });
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Skipping unnamed service: {}", e),
            }
        }

        Err(Error::NotFound(name.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the live lux value; every call goes to the registry
    pub fn current_lux(&self) -> Result<f32> {
        if self.service.is_empty() {
            return Err(Error::InvalidHandle);
        }

        match self
            .service
            .registry()
            .service_property(self.service.raw(), LUX_PROPERTY)
        {
            Some(PropertyValue::Number(lux)) => Ok(lux as f32),
            Some(other) => Err(Error::TypeMismatch {
                key: LUX_PROPERTY.to_string(),
                found: other.type_name().to_string(),
            }),
            None => Err(Error::PropertyUnavailable(LUX_PROPERTY.to_string())),
        }
    }

    /// Release the service reference; the handle stays usable for `name()`
    pub fn release(&mut self) {
        self.service.release();
    }

    pub fn is_released(&self) -> bool {
        self.service.is_empty()
    }
}

impl<R: Registry> fmt::Display for LightSensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LightSensor('{}')", self.name)
    }
}

impl<R: Registry> fmt::Debug for LightSensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LightSensor")
            .field("name", &self.name)
            .field("service", &self.service)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MemoryRegistry, MemoryService, NAME_CAPACITY};

    fn registry() -> MemoryRegistry {
        MemoryRegistry::new()
            .with_service(MemoryService::new("A"))
            .with_service(MemoryService::new("B").with_lux(42.5))
            .with_service(MemoryService::new("C").with_lux(10.0))
    }

    #[test]
    fn test_open_by_name() {
        let registry = registry();
        let sensor = LightSensor::open_in(registry.clone(), "B").unwrap();

        assert_eq!(sensor.name(), "B");
        assert_eq!(sensor.current_lux().unwrap(), 42.5);
        assert_eq!(sensor.to_string(), "LightSensor('B')");

        // Only the matched service reference stays alive
        assert_eq!(registry.live_count(), 1);
        drop(sensor);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.invalid_release_count(), 0);
    }

    #[test]
    fn test_open_missing_name() {
        let registry = registry();
        let err = LightSensor::open_in(registry.clone(), "Z").unwrap_err();
        assert_eq!(err, Error::NotFound("Z".to_string()));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_open_query_failure() {
        let registry = registry();
        registry.fail_queries(true);
        let err = LightSensor::open_in(registry.clone(), "B").unwrap_err();
        assert!(matches!(err, Error::QueryFailed(_)));
    }

    #[test]
    fn test_open_skips_services_whose_name_fails() {
        let registry = MemoryRegistry::new()
            .with_service(MemoryService::new("B").with_failing_name())
            .with_service(MemoryService::new("B").with_lux(7.0));

        let sensor = LightSensor::open_in(registry.clone(), "B").unwrap();
        assert_eq!(sensor.current_lux().unwrap(), 7.0);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_first_match_wins() {
        let registry = MemoryRegistry::new()
            .with_service(MemoryService::new("B").with_lux(1.0))
            .with_service(MemoryService::new("B").with_lux(2.0));

        let sensor = LightSensor::open_in(registry, "B").unwrap();
        assert_eq!(sensor.current_lux().unwrap(), 1.0);
    }

    #[test]
    fn test_open_service_without_property() {
        let sensor = LightSensor::open_in(registry(), "A").unwrap();
        assert_eq!(
            sensor.current_lux().unwrap_err(),
            Error::PropertyUnavailable(LUX_PROPERTY.to_string())
        );
    }

    #[test]
    fn test_non_numeric_property() {
        let registry = MemoryRegistry::new().with_service(
            MemoryService::new("S")
                .with_property(LUX_PROPERTY, PropertyValue::Other("CFString".to_string())),
        );
        let sensor = LightSensor::open_in(registry, "S").unwrap();
        assert_eq!(
            sensor.current_lux().unwrap_err(),
            Error::TypeMismatch {
                key: LUX_PROPERTY.to_string(),
                found: "CFString".to_string(),
            }
        );
    }

    #[test]
    fn test_reads_are_live_and_leave_name_alone() {
        let registry = registry();
        let sensor = LightSensor::open_in(registry.clone(), "C").unwrap();
        assert_eq!(sensor.current_lux().unwrap(), 10.0);

        registry.set_property("C", LUX_PROPERTY, PropertyValue::Number(250.25));
        assert_eq!(sensor.current_lux().unwrap(), 250.25);
        assert_eq!(sensor.name(), "C");
    }

    #[test]
    fn test_released_handle_is_invalid() {
        let registry = registry();
        let mut sensor = LightSensor::open_in(registry.clone(), "B").unwrap();

        sensor.release();
        assert!(sensor.is_released());
        assert_eq!(sensor.current_lux().unwrap_err(), Error::InvalidHandle);
        assert_eq!(sensor.name(), "B");

        sensor.release();
        drop(sensor);
        assert_eq!(registry.invalid_release_count(), 0);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_long_name_is_truncated() {
        let long = "L".repeat(NAME_CAPACITY + 10);
        let bounded = &long[..NAME_CAPACITY - 1];
        let registry =
            MemoryRegistry::new().with_service(MemoryService::new(long.clone()).with_lux(1.0));

        // Name lookup only ever reports the bounded name
        assert_eq!(
            LightSensor::open_in(registry.clone(), &long).unwrap_err(),
            Error::NotFound(long.clone())
        );

        let sensor = LightSensor::open_in(registry.clone(), bounded).unwrap();
        assert_eq!(sensor.name(), bounded);
        assert_eq!(sensor.current_lux().unwrap(), 1.0);

        drop(sensor);
        assert_eq!(registry.live_count(), 0);
    }
}
