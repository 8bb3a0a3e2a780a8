//! Core type definitions: target specifications and host records.

mod host;
mod target;

pub use host::{normalize_field, HostRecord, PortBanner, UNKNOWN};
pub use target::{OctetRange, TargetError, TargetSpec};
