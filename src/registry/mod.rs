//! Service registry access
//!
//! The [`Registry`] trait is the seam between the sensor logic and the platform.
//! Every reference a registry hands out must be released exactly once; the
//! [`RegistryObject`] guard owns one such reference and takes care of that.

mod memory;

#[cfg(target_os = "macos")]
mod iokit;

#[cfg(not(target_os = "macos"))]
mod unsupported;

pub use memory::{MemoryRegistry, MemoryService};

#[cfg(target_os = "macos")]
pub use iokit::IoKitRegistry;

#[cfg(not(target_os = "macos"))]
pub use unsupported::UnsupportedRegistry;

use std::fmt;

use crate::error::Result;

/// Registry backend for the build target
#[cfg(target_os = "macos")]
pub type SystemRegistry = IoKitRegistry;

/// Registry backend for the build target
#[cfg(not(target_os = "macos"))]
pub type SystemRegistry = UnsupportedRegistry;

/// Broad class every registry service matches
pub const SERVICE_CLASS: &str = "IOService";

/// Property carrying the ambient light reading
pub const LUX_PROPERTY: &str = "CurrentLux";

/// Size of the platform name buffer, terminator included
pub const NAME_CAPACITY: usize = 128;

// === Raw References ===

/// Opaque reference number handed out by a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawObject(u32);

impl RawObject {
    /// The empty sentinel
    pub const NULL: RawObject = RawObject(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u32 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

// === Property Values ===

/// Dynamically typed property value read from a service
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    /// Any non-numeric value, described by its type name
    Other(String),
}

impl PropertyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Other(_) => None,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            PropertyValue::Number(_) => "number",
            PropertyValue::Other(kind) => kind,
        }
    }
}

// === Registry Trait ===

/// Platform service registry
///
/// Implementations are cheap handles onto the platform (or onto shared test
/// state), so owned references can carry a clone and release themselves.
pub trait Registry: Clone {
    /// Query all services of `class` and return an iterator reference
    fn matching_services(&self, class: &str) -> Result<RawObject>;

    /// Next service from an iterator reference, `None` once exhausted.
    /// The returned reference is owned by the caller.
    fn next_service(&self, iterator: RawObject) -> Option<RawObject>;

    /// Platform-assigned name of a service
    fn service_name(&self, service: RawObject) -> Result<String>;

    /// Property lookup; `None` when the service does not expose `key`
    fn service_property(&self, service: RawObject, key: &str) -> Option<PropertyValue>;

    /// Release a reference obtained from this registry
    fn release(&self, object: RawObject);
}

// === Owned Reference ===

/// Exclusively owned registry reference, released exactly once
pub struct RegistryObject<R: Registry> {
    raw: RawObject,
    registry: R,
}

impl<R: Registry> RegistryObject<R> {
    pub fn new(registry: R, raw: RawObject) -> Self {
        Self { raw, registry }
    }

    pub fn raw(&self) -> RawObject {
        self.raw
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// True once released (or if constructed from the sentinel)
    pub fn is_empty(&self) -> bool {
        self.raw.is_null()
    }

    /// Release the reference now; later calls and the eventual drop are no-ops
    pub fn release(&mut self) {
        if self.raw.is_null() {
            return;
        }
        let raw = std::mem::replace(&mut self.raw, RawObject::NULL);
        tracing::trace!("Releasing registry object {}", raw.as_raw());
        self.registry.release(raw);
    }
}

impl<R: Registry> Drop for RegistryObject<R> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<R: Registry> fmt::Debug for RegistryObject<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RegistryObject").field(&self.raw.as_raw()).finish()
    }
}

/// Cut `name` down to what fits the platform name buffer, on a char boundary
pub fn bounded_name(name: &str) -> String {
    let max = NAME_CAPACITY - 1;
    if name.len() <= max {
        return name.to_string();
    }
    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}
