//! Registry scan for ambient light sensors
//!
//! The matching query covers every registry service; the cursor filters that
//! down to services exposing `CurrentLux` and opens a fresh [`LightSensor`]
//! for each one.

use std::iter::FusedIterator;

use crate::error::{Error, Result};
use crate::registry::{Registry, RegistryObject, SystemRegistry, LUX_PROPERTY, SERVICE_CLASS};
use crate::sensor::LightSensor;

/// Where a [`SensorIter`] is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPhase {
    /// Holds a live iterator reference
    Open,
    /// All candidates consumed; iterator reference already released
    Exhausted,
    /// Closed before exhaustion
    Released,
}

enum CursorState<R: Registry> {
    Open(RegistryObject<R>),
    Exhausted,
    Released,
}

/// Lazy, one-pass cursor over the ambient light sensors in a registry
pub struct SensorIter<R: Registry = SystemRegistry> {
    registry: R,
    state: CursorState<R>,
}

/// Scan the system registry
pub fn scan() -> Result<SensorIter> {
    scan_in(SystemRegistry::default())
}

/// Issue a matching query against `registry`
pub fn scan_in<R: Registry>(registry: R) -> Result<SensorIter<R>> {
    let iterator = registry.matching_services(SERVICE_CLASS)?;
    Ok(SensorIter {
        state: CursorState::Open(RegistryObject::new(registry.clone(), iterator)),
        registry,
    })
}

/// First ambient light sensor in the system registry
pub fn find_first() -> Result<LightSensor> {
    find_first_in(SystemRegistry::default())
}

/// First ambient light sensor in `registry`
pub fn find_first_in<R: Registry>(registry: R) -> Result<LightSensor<R>> {
    let mut sensors = scan_in(registry)?;
    sensors.next().unwrap_or(Err(Error::NoSensorFound))
}

impl<R: Registry> SensorIter<R> {
    pub fn phase(&self) -> CursorPhase {
        match self.state {
            CursorState::Open(_) => CursorPhase::Open,
            CursorState::Exhausted => CursorPhase::Exhausted,
            CursorState::Released => CursorPhase::Released,
        }
    }

    /// Release the iterator reference without draining the cursor
    pub fn close(&mut self) {
        if let CursorState::Open(_) = self.state {
            self.state = CursorState::Released;
        }
    }
}

impl<R: Registry> Iterator for SensorIter<R> {
    type Item = Result<LightSensor<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        let iterator = match &self.state {
            CursorState::Open(iterator) => iterator.raw(),
            CursorState::Exhausted | CursorState::Released => return None,
        };

        while let Some(candidate) = self.registry.next_service(iterator) {
            // Released on every path out of this iteration
            let candidate = RegistryObject::new(self.registry.clone(), candidate);

            if self
                .registry
                .service_property(candidate.raw(), LUX_PROPERTY)
                .is_none()
            {
                continue;
            }

            let name = match self.registry.service_name(candidate.raw()) {
                Ok(name) => name,
                Err(e) => {
                    tracing::debug!("Skipping light sensor candidate: {}", e);
                    continue;
                }
            };

            return Some(LightSensor::open_in(self.registry.clone(), &name));
        }

        tracing::trace!("Sensor scan exhausted");
        self.state = CursorState::Exhausted;
        None
    }
}

impl<R: Registry> FusedIterator for SensorIter<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MemoryRegistry, MemoryService, PropertyValue};

    fn registry() -> MemoryRegistry {
        MemoryRegistry::new()
            .with_service(MemoryService::new("A"))
            .with_service(MemoryService::new("B").with_lux(42.5))
            .with_service(MemoryService::new("C").with_lux(10.0))
    }

    #[test]
    fn test_scan_yields_only_light_sensors_in_order() {
        let registry = registry();
        let sensors: Vec<_> = scan_in(registry.clone())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        let names: Vec<_> = sensors.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["B", "C"]);
        assert_eq!(sensors[0].current_lux().unwrap(), 42.5);
        assert_eq!(sensors[1].current_lux().unwrap(), 10.0);

        // Cursor and candidates are gone; only the two handles remain
        assert_eq!(registry.live_count(), 2);
        drop(sensors);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.invalid_release_count(), 0);
    }

    #[test]
    fn test_drained_cursor_stays_exhausted() {
        let registry = registry();
        let mut sensors = scan_in(registry.clone()).unwrap();
        assert_eq!(sensors.phase(), CursorPhase::Open);

        for sensor in sensors.by_ref() {
            sensor.unwrap();
        }
        assert_eq!(sensors.phase(), CursorPhase::Exhausted);
        assert!(sensors.next().is_none());
        assert!(sensors.next().is_none());
        assert_eq!(sensors.phase(), CursorPhase::Exhausted);

        drop(sensors);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.invalid_release_count(), 0);
    }

    #[test]
    fn test_close_releases_iterator_once() {
        let registry = registry();
        let mut sensors = scan_in(registry.clone()).unwrap();
        let first = sensors.next().unwrap().unwrap();
        assert_eq!(first.name(), "B");

        sensors.close();
        sensors.close();
        assert_eq!(sensors.phase(), CursorPhase::Released);
        assert!(sensors.next().is_none());
        drop(sensors);

        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.invalid_release_count(), 0);
    }

    #[test]
    fn test_scan_query_failure() {
        let registry = registry();
        registry.fail_queries(true);
        assert!(matches!(scan_in(registry.clone()), Err(Error::QueryFailed(_))));
        assert!(matches!(
            find_first_in(registry),
            Err(Error::QueryFailed(_))
        ));
    }

    #[test]
    fn test_name_failure_skips_candidate() {
        let registry = MemoryRegistry::new()
            .with_service(MemoryService::new("X").with_lux(5.0).with_failing_name())
            .with_service(MemoryService::new("C").with_lux(10.0));

        let sensors: Vec<_> = scan_in(registry.clone())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors[0].name(), "C");

        drop(sensors);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.invalid_release_count(), 0);
    }

    #[test]
    fn test_failed_reopen_is_yielded_and_scan_continues() {
        let registry = MemoryRegistry::new()
            .with_service(MemoryService::new("B").with_lux(42.5))
            .with_service(MemoryService::new("C").with_lux(10.0));
        let mut sensors = scan_in(registry.clone()).unwrap();

        registry.fail_queries(true);
        assert!(matches!(sensors.next(), Some(Err(Error::QueryFailed(_)))));
        // Candidate released; only the cursor's iterator remains
        assert_eq!(registry.live_count(), 1);
        assert_eq!(sensors.phase(), CursorPhase::Open);

        registry.fail_queries(false);
        let c = sensors.next().unwrap().unwrap();
        assert_eq!(c.name(), "C");
        assert!(sensors.next().is_none());

        drop(c);
        drop(sensors);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.invalid_release_count(), 0);
    }

    #[test]
    fn test_find_first_propagates_reopen_failure() {
        let registry = MemoryRegistry::new()
            .with_service(MemoryService::new("B").with_lux(42.5))
            .with_service(MemoryService::new("C").with_lux(10.0));

        // The scan's own query succeeds, reopening "B" fails
        registry.fail_queries_after(1);
        assert!(matches!(
            find_first_in(registry.clone()),
            Err(Error::QueryFailed(_))
        ));
        assert_eq!(registry.query_count(), 2);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.invalid_release_count(), 0);
    }

    #[test]
    fn test_find_first() {
        let registry = registry();
        let sensor = find_first_in(registry.clone()).unwrap();
        assert_eq!(sensor.name(), "B");
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_find_first_without_sensors() {
        let registry = MemoryRegistry::new()
            .with_service(MemoryService::new("A"))
            .with_service(
                MemoryService::new("D").with_property("Brightness", PropertyValue::Number(0.5)),
            );

        assert_eq!(find_first_in(registry.clone()).unwrap_err(), Error::NoSensorFound);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.invalid_release_count(), 0);
    }

    #[test]
    fn test_open_is_independent_of_scan() {
        let registry = registry();
        let mut scanned = find_first_in(registry.clone()).unwrap();
        let opened = LightSensor::open_in(registry.clone(), "B").unwrap();

        scanned.release();
        assert_eq!(scanned.current_lux().unwrap_err(), Error::InvalidHandle);
        assert_eq!(opened.current_lux().unwrap(), 42.5);

        drop(scanned);
        assert_eq!(registry.live_count(), 1);
        drop(opened);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.invalid_release_count(), 0);
    }
}
