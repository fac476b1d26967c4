//! IOKit service registry (macOS)

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use core_foundation::base::{kCFAllocatorDefault, CFCopyTypeIDDescription, CFType, TCFType};
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use io_kit_sys::ret::kIOReturnSuccess;
use io_kit_sys::types::io_iterator_t;
use io_kit_sys::{
    kIOMasterPortDefault, IOIteratorNext, IOObjectRelease, IORegistryEntryCreateCFProperty,
    IORegistryEntryGetName, IOServiceGetMatchingServices, IOServiceMatching,
};

use super::{PropertyValue, RawObject, Registry, NAME_CAPACITY};
use crate::error::{Error, Result};

/// The live IOKit registry on the main port
#[derive(Debug, Clone, Copy, Default)]
pub struct IoKitRegistry;

impl Registry for IoKitRegistry {
    fn matching_services(&self, class: &str) -> Result<RawObject> {
        let class = CString::new(class)
            .map_err(|e| Error::AllocationFailure(format!("Invalid service class: {}", e)))?;

        let matching = unsafe { IOServiceMatching(class.as_ptr()) };
        if matching.is_null() {
            return Err(Error::QueryFailed(
                "Failed to create matching dictionary".to_string(),
            ));
        }

        // IOServiceGetMatchingServices consumes the matching dictionary
        let mut iterator: io_iterator_t = 0;
        let kr =
            unsafe { IOServiceGetMatchingServices(kIOMasterPortDefault, matching as _, &mut iterator) };
        if kr != kIOReturnSuccess || iterator == 0 {
            return Err(Error::QueryFailed(format!(
                "Failed to get matching services (kern_return {:#x})",
                kr
            )));
        }

        Ok(RawObject::from_raw(iterator))
    }

    fn next_service(&self, iterator: RawObject) -> Option<RawObject> {
        if iterator.is_null() {
            return None;
        }
        let service = unsafe { IOIteratorNext(iterator.as_raw()) };
        (service != 0).then(|| RawObject::from_raw(service))
    }

    fn service_name(&self, service: RawObject) -> Result<String> {
        if service.is_null() {
            return Err(Error::InvalidHandle);
        }

        let mut buffer: [c_char; NAME_CAPACITY] = [0; NAME_CAPACITY];
        let kr = unsafe { IORegistryEntryGetName(service.as_raw(), buffer.as_mut_ptr()) };
        if kr != kIOReturnSuccess {
            return Err(Error::QueryFailed(format!(
                "Failed to get service name (kern_return {:#x})",
                kr
            )));
        }

        // The registry always NUL-terminates within the buffer
        let name = unsafe { CStr::from_ptr(buffer.as_ptr()) };
        Ok(name.to_string_lossy().into_owned())
    }

    fn service_property(&self, service: RawObject, key: &str) -> Option<PropertyValue> {
        if service.is_null() {
            return None;
        }

        let key = CFString::new(key);
        let value = unsafe {
            IORegistryEntryCreateCFProperty(
                service.as_raw(),
                key.as_concrete_TypeRef(),
                kCFAllocatorDefault,
                0,
            )
        };
        if value.is_null() {
            return None;
        }

        // Create rule: released when `value` drops
        let value = unsafe { CFType::wrap_under_create_rule(value) };
        Some(property_value(&value))
    }

    fn release(&self, object: RawObject) {
        if object.is_null() {
            return;
        }
        let kr = unsafe { IOObjectRelease(object.as_raw()) };
        if kr != kIOReturnSuccess {
            tracing::warn!(
                "IOObjectRelease({}) returned {:#x}",
                object.as_raw(),
                kr
            );
        }
    }
}

/// Numbers of any CF width become `Number`; everything else is described by
/// its CF type name
fn property_value(value: &CFType) -> PropertyValue {
    if let Some(number) = value.downcast::<CFNumber>() {
        let n = number
            .to_f64()
            .or_else(|| number.to_f32().map(f64::from))
            .or_else(|| number.to_i64().map(|n| n as f64));
        if let Some(n) = n {
            return PropertyValue::Number(n);
        }
    }
    PropertyValue::Other(type_name(value))
}

fn type_name(value: &CFType) -> String {
    let description = unsafe { CFCopyTypeIDDescription(value.type_of()) };
    if description.is_null() {
        return format!("CFTypeID {}", value.type_of());
    }
    unsafe { CFString::wrap_under_create_rule(description) }.to_string()
}
