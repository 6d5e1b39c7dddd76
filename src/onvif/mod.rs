//! ONVIF device control
//!
//! SOAP over HTTP with WS-Security digest authentication. Every operation
//! opens its own [`ControlSession`] (`GetCapabilities`, `GetProfiles`) and
//! drops it afterwards.
//!
//! # Example
//! ```no_run
//! use camgate::onvif::{ControlConfig, DeviceControl, OnvifClient, Velocity};
//! use camgate::CameraDescriptor;
//!
//! # async fn example() -> Result<(), camgate::onvif::ControlError> {
//! let client = OnvifClient::new(ControlConfig::default())?;
//! let camera = CameraDescriptor::new("10.0.0.5", "admin", "secret", "rtsp://10.0.0.5/live");
//!
//! client.move_camera(&camera, Velocity::new(0.5, 0.0, 0.0), 1.0).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod soap;
pub mod types;
pub mod xml;

pub use client::{DeviceControl, OnvifClient};
pub use config::ControlConfig;
pub use error::ControlError;
pub use session::ControlSession;
pub use types::{Capabilities, MediaProfile, Velocity};
