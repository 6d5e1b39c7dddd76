//! Device control client

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::camera::CameraDescriptor;

use super::config::ControlConfig;
use super::error::ControlError;
use super::session::ControlSession;
use super::types::Velocity;

/// Control operations on a camera
///
/// Each call is independent; implementations keep no per-device state.
#[async_trait]
pub trait DeviceControl: Send + Sync {
    /// Start a continuous PTZ move lasting `timeout_secs`
    async fn move_camera(
        &self,
        camera: &CameraDescriptor,
        velocity: Velocity,
        timeout_secs: f64,
    ) -> Result<(), ControlError>;

    /// Stream URI of the media source identified by `recording_id`
    ///
    /// `start` and `end` describe the requested window; devices answer with
    /// the source URI and the window does not narrow the selection.
    async fn resolve_playback_uri(
        &self,
        camera: &CameraDescriptor,
        recording_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<String, ControlError>;
}

/// ONVIF implementation of [`DeviceControl`]
#[derive(Debug, Clone)]
pub struct OnvifClient {
    http: reqwest::Client,
    config: ControlConfig,
}

impl OnvifClient {
    /// Create a client
    pub fn new(config: ControlConfig) -> Result<Self, ControlError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ControlError::Client(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Client configuration
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Open a fresh control session with `camera`
    pub async fn open_session(&self, camera: &CameraDescriptor) -> Result<ControlSession, ControlError> {
        ControlSession::open(self.http.clone(), camera, self.config.request_timeout).await
    }
}

#[async_trait]
impl DeviceControl for OnvifClient {
    async fn move_camera(
        &self,
        camera: &CameraDescriptor,
        velocity: Velocity,
        timeout_secs: f64,
    ) -> Result<(), ControlError> {
        let session = self.open_session(camera).await?;
        session.continuous_move(velocity, timeout_secs).await?;

        tracing::info!(
            address = %camera.address,
            x = velocity.x,
            y = velocity.y,
            z = velocity.z,
            timeout_secs = timeout_secs,
            "PTZ move issued"
        );

        Ok(())
    }

    async fn resolve_playback_uri(
        &self,
        camera: &CameraDescriptor,
        recording_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<String, ControlError> {
        let session = self.open_session(camera).await?;

        let source = match session.find_source(recording_id) {
            Some(source) => source,
            None => {
                tracing::debug!(
                    address = %camera.address,
                    recording_id = recording_id,
                    sources = session.media_sources().len(),
                    "No media source matches"
                );
                return Err(ControlError::SourceNotFound(recording_id.to_string()));
            }
        };

        let uri = session.stream_uri(&source.token).await?;

        tracing::info!(
            address = %camera.address,
            recording_id = recording_id,
            profile = %source.token,
            start = %start,
            end = %end,
            "Playback source resolved"
        );

        Ok(uri)
    }
}
