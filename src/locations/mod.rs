//! Warehouse location registry.
//!
//! Locations form a tree (building, zone, rack, shelf, bin) stored in
//! `.binlock/locations.yaml`. Each record also carries the lock attribute
//! managed by [`crate::locks::LocationLockManager`]; the registry file is the
//! single authoritative copy of both.

mod model;
mod registry;


pub use model::{Location, LocationKind, validate_location_id};
pub use registry::Registry;
