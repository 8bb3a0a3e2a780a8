//! Configuration management for Pythodan.
//!
//! Provides XDG-compliant settings storage.

mod settings;

pub use settings::{Paths, Settings};
