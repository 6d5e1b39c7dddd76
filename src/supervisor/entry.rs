//! Session entry types
//!
//! This module defines the per-session state stored in the session table.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::camera::descriptor::redact_userinfo;

use super::key::SessionKey;
use super::process::{MonitoredProcess, ProcessExit};

/// One supervised converter
#[derive(Debug)]
pub struct StreamSession {
    /// Unique id; distinguishes a replacement from the session it superseded
    pub id: u64,

    /// Table key
    pub key: SessionKey,

    /// Source the converter reads from
    pub source: String,

    /// Directory the converter writes into
    pub output_dir: PathBuf,

    /// Public path of the manifest
    pub public_path: String,

    /// Converter handle
    pub(super) process: MonitoredProcess,

    /// When the session was registered
    pub created_at: Instant,

    /// Wall-clock registration time
    pub started_at: DateTime<Utc>,
}

impl StreamSession {
    /// Create a new session entry
    pub fn new(
        id: u64,
        key: SessionKey,
        source: impl Into<String>,
        output_dir: PathBuf,
        public_path: String,
        process: MonitoredProcess,
    ) -> Self {
        Self {
            id,
            key,
            source: source.into(),
            output_dir,
            public_path,
            process,
            created_at: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Converter process id
    pub fn pid(&self) -> Option<u32> {
        self.process.pid()
    }

    /// Last exit status; `None` while running
    pub fn last_exit(&self) -> Option<ProcessExit> {
        self.process.exit_status()
    }

    /// Time since registration
    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Snapshot for reporting
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            key: self.key.to_string(),
            address: self.key.address().to_string(),
            playback: self.key.is_playback(),
            pid: self.pid(),
            source: redact_userinfo(&self.source),
            output_dir: self.output_dir.clone(),
            public_path: self.public_path.clone(),
            started_at: self.started_at,
            uptime_secs: self.uptime().as_secs(),
            running: self.last_exit().is_none(),
        }
    }
}

/// Reportable view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: u64,
    pub key: String,
    pub address: String,
    pub playback: bool,
    pub pid: Option<u32>,
    /// Source with credentials removed
    pub source: String,
    pub output_dir: PathBuf,
    pub public_path: String,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub running: bool,
}
