//! Camera registry
//!
//! The camera list is loaded once at startup from a JSON file, validated,
//! and read-only afterwards. Each camera is keyed by its network address.

pub mod descriptor;
pub mod error;
pub mod registry;

pub use descriptor::{CameraDescriptor, CameraSummary, DEFAULT_CONTROL_PORT};
pub use error::ConfigError;
pub use registry::CameraRegistry;
