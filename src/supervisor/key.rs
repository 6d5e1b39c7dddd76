//! Session key
//!
//! A session key names one supervised converter. Live and playback output for
//! the same camera are distinct keys, so both may run side by side.

use std::fmt;

/// Suffix appended to a camera address to form its playback key
pub const PLAYBACK_SUFFIX: &str = ":playback";

/// Unique identifier for a supervised session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Live view of the camera's own stream
    Live(String),
    /// Recorded media replayed from a resolved source
    Playback(String),
}

impl SessionKey {
    /// Key for a camera's live session
    pub fn live(address: impl Into<String>) -> Self {
        SessionKey::Live(address.into())
    }

    /// Key for a camera's playback session
    pub fn playback(address: impl Into<String>) -> Self {
        SessionKey::Playback(address.into())
    }

    /// Camera address this key belongs to
    pub fn address(&self) -> &str {
        match self {
            SessionKey::Live(address) | SessionKey::Playback(address) => address,
        }
    }

    /// Whether this is a playback key
    pub fn is_playback(&self) -> bool {
        matches!(self, SessionKey::Playback(_))
    }

    /// Parse the display form back into a key
    pub fn parse(raw: &str) -> Self {
        match raw.strip_suffix(PLAYBACK_SUFFIX) {
            Some(address) => SessionKey::Playback(address.to_string()),
            None => SessionKey::Live(raw.to_string()),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKey::Live(address) => write!(f, "{}", address),
            SessionKey::Playback(address) => write!(f, "{}{}", address, PLAYBACK_SUFFIX),
        }
    }
}
