//! Fallback registry for targets without IOKit

use super::{PropertyValue, RawObject, Registry};
use crate::error::{Error, Result};

/// Registry that reports every query as failed
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedRegistry;

impl Registry for UnsupportedRegistry {
    fn matching_services(&self, _class: &str) -> Result<RawObject> {
        Err(Error::QueryFailed(format!(
            "IOKit service registry is not available on {}",
            std::env::consts::OS
        )))
    }

    fn next_service(&self, _iterator: RawObject) -> Option<RawObject> {
        None
    }

    fn service_name(&self, _service: RawObject) -> Result<String> {
        Err(Error::InvalidHandle)
    }

    fn service_property(&self, _service: RawObject, _key: &str) -> Option<PropertyValue> {
        None
    }

    fn release(&self, _object: RawObject) {}
}
