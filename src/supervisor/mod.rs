//! Stream session supervisor
//!
//! Keeps at most one RTSP → HLS converter per session key.
//!
//! ```text
//!   request ──► StreamSupervisor ──lock_key──► SessionTable
//!                    │                            ▲
//!                    │ launch                     │ remove_if(key, id)
//!                    ▼                            │
//!             ConverterLauncher ──► MonitoredProcess ──exit──┘
//! ```
//!
//! Requests for the same key are serialized; different keys proceed
//! concurrently. Each converter writes into `<stream_root>/<key>/`, which is
//! served under `<public_prefix>/<key>/`.

pub mod config;
pub mod converter;
pub mod entry;
pub mod error;
pub mod key;
pub mod manager;
pub mod process;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConverterConfig, SupervisorConfig};
pub use converter::{ConverterCommand, ConverterLauncher, ProcessLauncher};
pub use entry::{SessionInfo, StreamSession};
pub use error::SessionError;
pub use key::SessionKey;
pub use manager::StreamSupervisor;
pub use process::{MonitoredProcess, ProcessExit, ProcessMonitor, Termination};
pub use store::SessionTable;
