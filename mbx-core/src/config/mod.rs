//! Configuration types
//!
//! Board-agnostic node configuration, optionally loaded from TOML.

#[cfg(feature = "toml")]
pub mod loader;
pub mod types;

pub use types::*;
