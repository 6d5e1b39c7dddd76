//! ONVIF data types

use serde::{Deserialize, Serialize};

use super::xml;

/// Pan, tilt and zoom speeds, each in `[-1.0, 1.0]` once clamped
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    /// Pan speed; negative is left
    #[serde(default)]
    pub x: f32,
    /// Tilt speed; negative is down
    #[serde(default)]
    pub y: f32,
    /// Zoom speed; negative is wide
    #[serde(default)]
    pub z: f32,
}

impl Velocity {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Each component clamped into `[-1.0, 1.0]`; NaN becomes 0
    pub fn clamped(self) -> Self {
        fn clamp(v: f32) -> f32 {
            if v.is_nan() {
                0.0
            } else {
                v.clamp(-1.0, 1.0)
            }
        }

        Self {
            x: clamp(self.x),
            y: clamp(self.y),
            z: clamp(self.z),
        }
    }
}

/// Service addresses advertised by `GetCapabilities`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Media service XAddr
    pub media: Option<String>,
    /// PTZ service XAddr
    pub ptz: Option<String>,
}

impl Capabilities {
    /// Extract service addresses from a `GetCapabilitiesResponse`
    pub fn parse(body: &str) -> Self {
        let scope = xml::element(body, "Capabilities")
            .map(|el| el.inner())
            .unwrap_or(body);

        let xaddr = |service: &str| {
            xml::element(scope, service).and_then(|el| el.child_text("XAddr"))
        };

        Self {
            media: xaddr("Media"),
            ptz: xaddr("PTZ"),
        }
    }
}

/// One media profile from `GetProfiles`
///
/// Each profile is a selectable media source: its own token and the token of
/// the video source it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaProfile {
    pub token: String,
    pub name: Option<String>,
    pub video_source_token: Option<String>,
    pub has_ptz: bool,
}

impl MediaProfile {
    /// Extract every profile from a `GetProfilesResponse`
    ///
    /// Profiles without a token cannot be addressed and are skipped.
    pub fn parse_all(body: &str) -> Vec<MediaProfile> {
        xml::elements(body, "Profiles")
            .into_iter()
            .filter_map(|profile| {
                let token = profile.attr("token").filter(|t| !t.is_empty())?;
                Some(MediaProfile {
                    token,
                    name: profile.child_text("Name"),
                    video_source_token: profile
                        .child("VideoSourceConfiguration")
                        .and_then(|vsc| vsc.child_text("SourceToken")),
                    has_ptz: profile.child("PTZConfiguration").is_some(),
                })
            })
            .collect()
    }

    /// Whether `id` names this profile or its video source
    pub fn matches(&self, id: &str) -> bool {
        self.token == id || self.video_source_token.as_deref() == Some(id)
    }
}
