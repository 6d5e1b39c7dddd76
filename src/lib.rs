//! camgate: on-demand RTSP to HLS gateway for IP cameras
//!
//! The crate supervises external converter processes that turn a camera's
//! RTSP feed (or a recorded source) into a rolling HLS window, and talks ONVIF
//! to the camera for PTZ motion and media-source resolution.
//!
//! # Layout
//!
//! - [`camera`]: the static, validated camera list
//! - [`supervisor`]: at most one converter process per session key
//! - [`onvif`]: per-call ONVIF control sessions (PTZ, stream URIs)
//! - [`service`]: facade that resolves cameras and drives both of the above
//! - [`server`]: JSON HTTP layer and static HLS serving
//!
//! # Example
//! ```no_run
//! use camgate::{GatewayServer, ServerConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::default().cameras_path("cameras.json");
//! let server = GatewayServer::from_config(config)?;
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(())
//! # }
//! ```

pub mod camera;
pub mod error;
pub mod onvif;
pub mod server;
pub mod service;
pub mod supervisor;

pub use camera::{CameraDescriptor, CameraRegistry};
pub use error::{Error, ErrorKind, Result};
pub use onvif::{ControlConfig, DeviceControl, OnvifClient, Velocity};
pub use server::{GatewayServer, ServerConfig};
pub use service::{CameraService, PlaybackRequest};
pub use supervisor::{SessionKey, StreamSupervisor, SupervisorConfig};
