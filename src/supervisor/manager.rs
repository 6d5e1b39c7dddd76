//! Stream session supervisor
//!
//! Starts converters on demand and keeps at most one per session key. Live
//! sessions are reused while their converter runs; playback sessions are
//! replaced on every request. A converter that exits for any reason is
//! removed from the table, so the next request for its key starts a new one.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use crate::camera::descriptor::redact_userinfo;
use crate::camera::CameraDescriptor;

use super::config::SupervisorConfig;
use super::converter::{ConverterCommand, ConverterLauncher, ProcessLauncher};
use super::entry::{SessionInfo, StreamSession};
use super::error::SessionError;
use super::key::SessionKey;
use super::process::ProcessExit;
use super::store::SessionTable;

/// Supervisor for converter sessions
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct StreamSupervisor {
    table: Arc<SessionTable>,
    launcher: Arc<dyn ConverterLauncher>,
    config: SupervisorConfig,
}

impl StreamSupervisor {
    /// Create a supervisor that launches real converter processes
    pub fn new(config: SupervisorConfig) -> Self {
        Self::with_launcher(config, Arc::new(ProcessLauncher::new()))
    }

    /// Create a supervisor with a custom launcher
    pub fn with_launcher(config: SupervisorConfig, launcher: Arc<dyn ConverterLauncher>) -> Self {
        Self::with_table(config, launcher, Arc::new(SessionTable::new()))
    }

    /// Create a supervisor over an existing session table
    pub fn with_table(
        config: SupervisorConfig,
        launcher: Arc<dyn ConverterLauncher>,
        table: Arc<SessionTable>,
    ) -> Self {
        Self {
            table,
            launcher,
            config,
        }
    }

    /// Supervisor configuration
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Public path of the manifest for `key`
    pub fn public_path(&self, key: &SessionKey) -> String {
        format!(
            "{}/{}/{}",
            self.config.public_prefix, key, self.config.converter.manifest_name
        )
    }

    /// Output directory for `key`
    pub fn output_dir(&self, key: &SessionKey) -> PathBuf {
        self.config.stream_root.join(key.to_string())
    }

    /// Return the live session for `camera`, starting one if none is running
    ///
    /// Returns as soon as the converter is spawned; the manifest appears once
    /// the converter has written its first segment.
    pub async fn ensure_live_session(
        &self,
        camera: &CameraDescriptor,
    ) -> Result<String, SessionError> {
        let key = SessionKey::live(&camera.address);
        let _guard = self.table.lock_key(&key).await;

        if let Some(path) = self.table.public_path(&key).await {
            tracing::debug!(key = %key, "Reusing live session");
            return Ok(path);
        }

        self.start_session(key, &camera.stream_url).await
    }

    /// Start a playback session for `camera` reading from `source_uri`
    ///
    /// Any playback session already running for the camera is stopped first;
    /// it is out of the table before its replacement is registered.
    pub async fn ensure_playback_session(
        &self,
        camera: &CameraDescriptor,
        source_uri: &str,
    ) -> Result<String, SessionError> {
        let key = SessionKey::playback(&camera.address);
        let _guard = self.table.lock_key(&key).await;

        if let Some(previous) = self.table.remove(&key).await {
            tracing::info!(key = %key, id = previous.id, "Superseding playback session");
            let exit = previous.process.stop(self.config.stop_timeout).await;
            tracing::debug!(key = %key, id = previous.id, exit = %exit, "Previous converter stopped");
        }

        self.start_session(key, source_uri).await
    }

    /// Snapshot of the session under `key`
    pub async fn session(&self, key: &SessionKey) -> Option<SessionInfo> {
        self.table.info(key).await
    }

    /// Snapshot of every session
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        self.table.snapshot().await
    }

    /// Number of registered sessions
    pub async fn session_count(&self) -> usize {
        self.table.len().await
    }

    /// Stop the session under `key`
    ///
    /// Returns `false` if nothing was registered.
    pub async fn stop_session(&self, key: &SessionKey) -> bool {
        let _guard = self.table.lock_key(key).await;

        match self.table.remove(key).await {
            Some(session) => {
                let exit = session.process.stop(self.config.stop_timeout).await;
                tracing::info!(key = %key, id = session.id, exit = %exit, "Session stopped");
                true
            }
            None => false,
        }
    }

    /// Stop every registered converter
    pub async fn shutdown(&self) {
        let sessions = self.table.drain().await;
        if sessions.is_empty() {
            return;
        }

        tracing::info!(count = sessions.len(), "Stopping converter sessions");

        for session in &sessions {
            session.process.terminate();
        }
        for session in &sessions {
            let exit = session.process.stop(self.config.stop_timeout).await;
            tracing::debug!(key = %session.key, exit = %exit, "Converter stopped");
        }
    }

    /// Create the output directory, launch, register. Caller holds the key guard.
    async fn start_session(&self, key: SessionKey, source: &str) -> Result<String, SessionError> {
        let output_dir = self.output_dir(&key);

        if let Err(e) = tokio::fs::create_dir_all(&output_dir).await {
            tracing::error!(key = %key, path = %output_dir.display(), error = %e, "Failed to create output directory");
            return Err(SessionError::OutputDir {
                path: output_dir,
                source: e,
            });
        }

        let command = ConverterCommand::hls(&self.config.converter, source, &output_dir);
        let process = match self.launcher.launch(&key, &command) {
            Ok(process) => process,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to spawn converter");
                return Err(SessionError::Spawn { key, source: e });
            }
        };

        // Subscribe before registering so an immediate exit is not missed
        let exited = process.exited();
        let public_path = self.public_path(&key);
        let session = StreamSession::new(
            self.table.next_id(),
            key.clone(),
            source,
            output_dir,
            public_path.clone(),
            process,
        );
        let id = session.id;

        tracing::info!(
            key = %key,
            id = id,
            pid = ?session.pid(),
            source = %redact_userinfo(source),
            "Converter session started"
        );

        self.table.insert(session).await;
        self.watch_exit(key, id, exited);

        Ok(public_path)
    }

    fn watch_exit<F>(&self, key: SessionKey, id: u64, exited: F)
    where
        F: Future<Output = ProcessExit> + Send + 'static,
    {
        let table = Arc::clone(&self.table);

        tokio::spawn(async move {
            let exit = exited.await;

            if table.remove_if(&key, id).await.is_none() {
                tracing::debug!(key = %key, id = id, exit = %exit, "Converter exited after removal");
                return;
            }

            if exit.success() {
                tracing::info!(key = %key, id = id, "Converter exited");
            } else {
                tracing::warn!(key = %key, id = id, exit = %exit, "Converter exited abnormally");
            }
        });
    }
}
