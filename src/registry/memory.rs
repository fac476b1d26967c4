//! In-memory service registry
//!
//! Behaves like the platform registry (fresh references per lookup, explicit
//! release) and keeps count of every release so leaks and double releases
//! show up in tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{bounded_name, PropertyValue, RawObject, Registry, LUX_PROPERTY};
use crate::error::{Error, Result};

/// A service entry in a [`MemoryRegistry`]
#[derive(Debug, Clone)]
pub struct MemoryService {
    name: String,
    properties: HashMap<String, PropertyValue>,
    name_fails: bool,
}

impl MemoryService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
            name_fails: false,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Shorthand for a numeric `CurrentLux` property
    pub fn with_lux(self, lux: f64) -> Self {
        self.with_property(LUX_PROPERTY, PropertyValue::Number(lux))
    }

    /// Make name lookups on this service fail
    pub fn with_failing_name(mut self) -> Self {
        self.name_fails = true;
        self
    }
}

#[derive(Debug)]
struct Slot {
    service: MemoryService,
    present: bool,
}

#[derive(Debug)]
enum Live {
    Iterator { matched: Vec<usize>, position: usize },
    Service(usize),
}

#[derive(Debug)]
struct State {
    slots: Vec<Slot>,
    live: HashMap<u32, Live>,
    next_raw: u32,
    queries: usize,
    releases: usize,
    invalid_releases: usize,
    fail_queries: bool,
    query_budget: Option<usize>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: HashMap::new(),
            next_raw: 1,
            queries: 0,
            releases: 0,
            invalid_releases: 0,
            fail_queries: false,
            query_budget: None,
        }
    }
}

impl State {
    fn allocate(&mut self, live: Live) -> RawObject {
        let raw = self.next_raw;
        self.next_raw += 1;
        self.live.insert(raw, live);
        RawObject::from_raw(raw)
    }

    fn service(&self, object: RawObject) -> Option<&Slot> {
        match self.live.get(&object.as_raw()) {
            Some(Live::Service(index)) => self.slots.get(*index),
            _ => None,
        }
    }
}

/// Shared in-memory registry; clones observe the same services and counters
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    state: Rc<RefCell<State>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(self, service: MemoryService) -> Self {
        self.add_service(service);
        self
    }

    /// Append a service; discovery order is insertion order
    pub fn add_service(&self, service: MemoryService) {
        self.state.borrow_mut().slots.push(Slot {
            service,
            present: true,
        });
    }

    /// Remove every service named `name`. Outstanding references stay valid
    /// to release but no longer expose properties.
    pub fn remove_service(&self, name: &str) {
        for slot in self.state.borrow_mut().slots.iter_mut() {
            if slot.service.name == name {
                slot.present = false;
            }
        }
    }

    /// Set a property on every service named `name`
    pub fn set_property(&self, name: &str, key: &str, value: PropertyValue) {
        for slot in self.state.borrow_mut().slots.iter_mut() {
            if slot.service.name == name {
                slot.service.properties.insert(key.to_string(), value.clone());
            }
        }
    }

    /// Make subsequent queries fail (or succeed again)
    pub fn fail_queries(&self, fail: bool) {
        let mut state = self.state.borrow_mut();
        state.fail_queries = fail;
        state.query_budget = None;
    }

    /// Let the next `allowed` queries succeed and fail every one after
    pub fn fail_queries_after(&self, allowed: usize) {
        let mut state = self.state.borrow_mut();
        state.fail_queries = false;
        state.query_budget = Some(allowed);
    }

    /// Number of matching queries issued so far
    pub fn query_count(&self) -> usize {
        self.state.borrow().queries
    }

    /// Number of successful releases
    pub fn release_count(&self) -> usize {
        self.state.borrow().releases
    }

    /// Releases of references that were already released or never handed out
    pub fn invalid_release_count(&self) -> usize {
        self.state.borrow().invalid_releases
    }

    /// References handed out and not yet released
    pub fn live_count(&self) -> usize {
        self.state.borrow().live.len()
    }
}

impl Registry for MemoryRegistry {
    fn matching_services(&self, class: &str) -> Result<RawObject> {
        let mut state = self.state.borrow_mut();
        state.queries += 1;

        let exhausted = match state.query_budget {
            Some(0) => true,
            Some(ref mut remaining) => {
                *remaining -= 1;
                false
            }
            None => false,
        };

        if state.fail_queries || exhausted {
            return Err(Error::QueryFailed(format!(
                "matching services for class '{}' unavailable",
                class
            )));
        }

        let matched = state
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.present)
            .map(|(index, _)| index)
            .collect();

        Ok(state.allocate(Live::Iterator {
            matched,
            position: 0,
        }))
    }

    fn next_service(&self, iterator: RawObject) -> Option<RawObject> {
        let mut state = self.state.borrow_mut();

        let index = match state.live.get_mut(&iterator.as_raw()) {
            Some(Live::Iterator { matched, position }) => {
                let index = matched.get(*position).copied()?;
                *position += 1;
                index
            }
            _ => return None,
        };

        Some(state.allocate(Live::Service(index)))
    }

    fn service_name(&self, service: RawObject) -> Result<String> {
        let state = self.state.borrow();
        let slot = state.service(service).ok_or(Error::InvalidHandle)?;

        if slot.service.name_fails {
            return Err(Error::QueryFailed(format!(
                "name lookup failed for object {}",
                service.as_raw()
            )));
        }
        Ok(bounded_name(&slot.service.name))
    }

    fn service_property(&self, service: RawObject, key: &str) -> Option<PropertyValue> {
        let state = self.state.borrow();
        let slot = state.service(service)?;
        if !slot.present {
            return None;
        }
        slot.service.properties.get(key).cloned()
    }

    fn release(&self, object: RawObject) {
        let mut state = self.state.borrow_mut();
        if state.live.remove(&object.as_raw()).is_some() {
            state.releases += 1;
        } else {
            tracing::warn!("Release of unknown registry object {}", object.as_raw());
            state.invalid_releases += 1;
        }
    }
}
