//! HTTP gateway
//!
//! JSON endpoints for camera listing, live view, PTZ and playback, plus
//! read-only serving of the streaming root.

pub mod config;
pub mod listener;
pub mod routes;

pub use config::ServerConfig;
pub use listener::GatewayServer;
pub use routes::{router, PtzRequest, PtzResponse};
