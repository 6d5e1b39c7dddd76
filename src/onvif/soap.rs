//! SOAP envelopes and WS-Security
//!
//! Every request carries a WS-Security `UsernameToken` with a password
//! digest: `Base64(SHA1(nonce + created + password))`.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha1::{Digest, Sha1};

use super::types::Velocity;
use super::xml;

const NS_ENVELOPE: &str = "http://www.w3.org/2003/05/soap-envelope";
const NS_DEVICE: &str = "http://www.onvif.org/ver10/device/wsdl";
const NS_MEDIA: &str = "http://www.onvif.org/ver10/media/wsdl";
const NS_PTZ: &str = "http://www.onvif.org/ver20/ptz/wsdl";
const NS_SCHEMA: &str = "http://www.onvif.org/ver10/schema";
const NS_WSSE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
const NS_WSU: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";
const PASSWORD_DIGEST: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";
const BASE64_BINARY: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

/// `Content-Type` of a SOAP 1.2 request
pub const CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// WS-Security `UsernameToken` for one request
#[derive(Clone)]
pub struct UsernameToken {
    username: String,
    digest: String,
    nonce: String,
    created: String,
}

impl UsernameToken {
    /// Token with a fresh random nonce and the current time
    pub fn generate(username: &str, password: &str) -> Self {
        let nonce: [u8; 16] = rand::random();
        let created = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        Self::with_nonce(username, password, &nonce, &created)
    }

    /// Token for a given nonce and timestamp
    pub fn with_nonce(username: &str, password: &str, nonce: &[u8], created: &str) -> Self {
        Self {
            username: username.to_string(),
            digest: password_digest(nonce, created, password),
            nonce: STANDARD.encode(nonce),
            created: created.to_string(),
        }
    }

    /// Password digest carried in the token
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// `<s:Header>` element carrying the token
    pub fn header(&self) -> String {
        format!(
            r#"<s:Header><wsse:Security xmlns:wsse="{wsse}" xmlns:wsu="{wsu}" s:mustUnderstand="1"><wsse:UsernameToken><wsse:Username>{user}</wsse:Username><wsse:Password Type="{digest_type}">{digest}</wsse:Password><wsse:Nonce EncodingType="{nonce_type}">{nonce}</wsse:Nonce><wsu:Created>{created}</wsu:Created></wsse:UsernameToken></wsse:Security></s:Header>"#,
            wsse = NS_WSSE,
            wsu = NS_WSU,
            user = xml::escape(&self.username),
            digest_type = PASSWORD_DIGEST,
            digest = self.digest,
            nonce_type = BASE64_BINARY,
            nonce = self.nonce,
            created = self.created,
        )
    }
}

impl fmt::Debug for UsernameToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsernameToken")
            .field("username", &self.username)
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}

/// `Base64(SHA1(nonce + created + password))`
pub fn password_digest(nonce: &[u8], created: &str, password: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(nonce);
    hasher.update(created.as_bytes());
    hasher.update(password.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Wrap a header and body into a SOAP 1.2 envelope
pub fn envelope(header: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><s:Envelope xmlns:s="{env}" xmlns:tds="{device}" xmlns:trt="{media}" xmlns:tptz="{ptz}" xmlns:tt="{schema}">{header}<s:Body>{body}</s:Body></s:Envelope>"#,
        env = NS_ENVELOPE,
        device = NS_DEVICE,
        media = NS_MEDIA,
        ptz = NS_PTZ,
        schema = NS_SCHEMA,
    )
}

/// Device service: `GetCapabilities` for all categories
pub fn get_capabilities() -> String {
    "<tds:GetCapabilities><tds:Category>All</tds:Category></tds:GetCapabilities>".to_string()
}

/// Media service: `GetProfiles`
pub fn get_profiles() -> String {
    "<trt:GetProfiles/>".to_string()
}

/// Media service: `GetStreamUri` for RTP over RTSP
pub fn get_stream_uri(profile_token: &str) -> String {
    format!(
        "<trt:GetStreamUri><trt:StreamSetup><tt:Stream>RTP-Unicast</tt:Stream><tt:Transport><tt:Protocol>RTSP</tt:Protocol></tt:Transport></trt:StreamSetup><trt:ProfileToken>{}</trt:ProfileToken></trt:GetStreamUri>",
        xml::escape(profile_token)
    )
}

/// PTZ service: `ContinuousMove` that stops by itself after `timeout_secs`
pub fn continuous_move(profile_token: &str, velocity: Velocity, timeout_secs: f64) -> String {
    let v = velocity.clamped();
    format!(
        r#"<tptz:ContinuousMove><tptz:ProfileToken>{token}</tptz:ProfileToken><tptz:Velocity><tt:PanTilt x="{x}" y="{y}"/><tt:Zoom x="{z}"/></tptz:Velocity><tptz:Timeout>{timeout}</tptz:Timeout></tptz:ContinuousMove>"#,
        token = xml::escape(profile_token),
        x = v.x,
        y = v.y,
        z = v.z,
        timeout = xs_duration(timeout_secs),
    )
}

/// `xs:duration` in whole milliseconds, at least one
pub fn xs_duration(secs: f64) -> String {
    let millis = if secs.is_finite() {
        (secs * 1000.0).round().max(1.0)
    } else {
        1.0
    };
    format!("PT{}S", millis / 1000.0)
}

/// SOAP fault extracted from a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    /// Fault code (`env:Sender`, `SOAP-ENV:Client`, ...)
    pub code: String,
    /// Most specific subcode, if any
    pub subcode: Option<String>,
    /// Human-readable reason
    pub reason: String,
}

impl SoapFault {
    /// Find a fault in a response body (SOAP 1.2 or 1.1 layout)
    pub fn parse(body: &str) -> Option<SoapFault> {
        let fault = xml::element(body, "Fault")?;

        // SOAP 1.2: Code/Value, Code/Subcode/Value, Reason/Text
        if let Some(code) = fault.child("Code") {
            let subcode = code
                .child("Subcode")
                .and_then(|s| s.children("Value").last().map(|v| v.text()));
            // The first Value in document order is the top-level code
            let value = code.child_text("Value").unwrap_or_default();
            let reason = fault
                .child("Reason")
                .and_then(|r| r.child_text("Text"))
                .unwrap_or_default();

            return Some(SoapFault {
                code: value,
                subcode,
                reason,
            });
        }

        // SOAP 1.1: faultcode, faultstring
        Some(SoapFault {
            code: fault.child_text("faultcode").unwrap_or_default(),
            subcode: None,
            reason: fault.child_text("faultstring").unwrap_or_default(),
        })
    }

    /// Whether the device rejected the credentials
    pub fn is_not_authorized(&self) -> bool {
        let codes = std::iter::once(self.code.as_str()).chain(self.subcode.as_deref());
        codes
            .map(|c| c.rsplit(':').next().unwrap_or(c))
            .any(|c| c == "NotAuthorized" || c == "FailedAuthentication")
    }
}

impl fmt::Display for SoapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.subcode, self.reason.is_empty()) {
            (Some(sub), false) => write!(f, "{} ({}): {}", self.code, sub, self.reason),
            (Some(sub), true) => write!(f, "{} ({})", self.code, sub),
            (None, false) => write!(f, "{}: {}", self.code, self.reason),
            (None, true) => write!(f, "{}", self.code),
        }
    }
}
