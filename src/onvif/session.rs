//! Per-operation ONVIF control session
//!
//! A session is opened fresh for every control operation: capabilities and
//! profiles are fetched anew each time and nothing outlives the call.

use std::fmt;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::camera::CameraDescriptor;

use super::error::ControlError;
use super::soap::{self, SoapFault, UsernameToken};
use super::types::{Capabilities, MediaProfile, Velocity};
use super::xml;

/// Negotiated control session with one device
pub struct ControlSession {
    http: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
    timeout: Duration,
    capabilities: Capabilities,
    profiles: Vec<MediaProfile>,
}

impl fmt::Debug for ControlSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlSession")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("capabilities", &self.capabilities)
            .field("profiles", &self.profiles)
            .finish_non_exhaustive()
    }
}

impl ControlSession {
    /// Connect to `camera`: `GetCapabilities` then `GetProfiles`
    pub async fn open(
        http: reqwest::Client,
        camera: &CameraDescriptor,
        timeout: Duration,
    ) -> Result<Self, ControlError> {
        let mut session = Self {
            http,
            endpoint: camera.device_service_url(),
            username: camera.username.clone(),
            password: camera.password.clone(),
            timeout,
            capabilities: Capabilities::default(),
            profiles: Vec::new(),
        };

        let body = session
            .call(&session.endpoint, "GetCapabilities", &soap::get_capabilities())
            .await?;
        session.capabilities = Capabilities::parse(&body);

        let media = session.media_service()?.to_string();
        let body = session
            .call(&media, "GetProfiles", &soap::get_profiles())
            .await?;
        session.profiles = MediaProfile::parse_all(&body);

        if session.profiles.is_empty() {
            return Err(ControlError::Unsupported("media profiles"));
        }

        tracing::debug!(
            endpoint = %session.endpoint,
            profiles = session.profiles.len(),
            ptz = session.capabilities.ptz.is_some(),
            "Control session opened"
        );

        Ok(session)
    }

    /// Device service endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Negotiated service addresses
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Media sources, one per profile, in device order
    pub fn media_sources(&self) -> &[MediaProfile] {
        &self.profiles
    }

    /// Media source whose profile token or video source token is `id`
    pub fn find_source(&self, id: &str) -> Option<&MediaProfile> {
        self.profiles.iter().find(|p| p.matches(id))
    }

    /// Start a continuous move on the first profile
    ///
    /// The device stops on its own after `timeout_secs`.
    pub async fn continuous_move(
        &self,
        velocity: Velocity,
        timeout_secs: f64,
    ) -> Result<(), ControlError> {
        let ptz = self
            .capabilities
            .ptz
            .as_deref()
            .ok_or(ControlError::Unsupported("PTZ service"))?;
        let profile = self
            .profiles
            .first()
            .ok_or(ControlError::Unsupported("media profiles"))?;

        let body = soap::continuous_move(&profile.token, velocity, timeout_secs);
        self.call(ptz, "ContinuousMove", &body).await?;
        Ok(())
    }

    /// RTSP URI of the profile named `profile_token`
    pub async fn stream_uri(&self, profile_token: &str) -> Result<String, ControlError> {
        let media = self.media_service()?;
        let body = self
            .call(media, "GetStreamUri", &soap::get_stream_uri(profile_token))
            .await?;

        let uri = xml::element(&body, "MediaUri")
            .and_then(|el| el.child_text("Uri"))
            .or_else(|| xml::child_text(&body, "Uri"));

        uri.ok_or_else(|| ControlError::Malformed {
            action: "GetStreamUri",
            reason: "response has no Uri".into(),
        })
    }

    fn media_service(&self) -> Result<&str, ControlError> {
        self.capabilities
            .media
            .as_deref()
            .ok_or(ControlError::Unsupported("media service"))
    }

    /// One authenticated SOAP exchange
    async fn call(&self, url: &str, action: &'static str, body: &str) -> Result<String, ControlError> {
        let token = UsernameToken::generate(&self.username, &self.password);
        let envelope = soap::envelope(&token.header(), body);

        tracing::debug!(url = %url, action = action, "Sending ONVIF request");

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, soap::CONTENT_TYPE)
            .timeout(self.timeout)
            .body(envelope)
            .send()
            .await
            .map_err(|e| ControlError::from_transport(action, self.timeout, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ControlError::from_transport(action, self.timeout, e))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(url = %url, action = action, status = %status, "ONVIF credentials rejected");
            return Err(ControlError::Unauthorized { action });
        }

        if let Some(fault) = SoapFault::parse(&text) {
            if fault.is_not_authorized() {
                tracing::warn!(url = %url, action = action, "ONVIF credentials rejected");
                return Err(ControlError::Unauthorized { action });
            }
            tracing::warn!(url = %url, action = action, fault = %fault, "ONVIF request faulted");
            return Err(ControlError::Fault {
                action,
                reason: fault.to_string(),
            });
        }

        if !status.is_success() {
            tracing::warn!(url = %url, action = action, status = %status, "ONVIF request failed");
            return Err(ControlError::Fault {
                action,
                reason: format!("HTTP {}", status),
            });
        }

        Ok(text)
    }
}
