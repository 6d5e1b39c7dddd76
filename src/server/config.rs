//! Server configuration

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::camera::ConfigError;
use crate::onvif::ControlConfig;
use crate::supervisor::SupervisorConfig;

/// Default listening port
pub const DEFAULT_PORT: u16 = 3000;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Camera list file
    pub cameras_path: PathBuf,

    /// Stream session supervisor settings
    pub supervisor: SupervisorConfig,

    /// ONVIF client settings
    pub control: ControlConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            cameras_path: PathBuf::from("cameras.json"),
            supervisor: SupervisorConfig::default(),
            control: ControlConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment
    ///
    /// | Variable               | Default       |
    /// |------------------------|---------------|
    /// | `HOST`                 | `0.0.0.0`     |
    /// | `PORT`                 | `3000`        |
    /// | `CAMERAS_CONFIG_PATH`  | required      |
    /// | `STREAM_ROOT`          | `hls_streams` |
    /// | `FFMPEG_PATH`          | `ffmpeg`      |
    /// | `CONTROL_TIMEOUT_SECS` | `10`          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let host = match lookup("HOST") {
            Some(raw) => raw
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidVar { name: "HOST", value: raw })?,
            None => config.bind_addr.ip(),
        };
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidVar { name: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };
        config.bind_addr = SocketAddr::new(host, port);

        config.cameras_path = lookup("CAMERAS_CONFIG_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingVar("CAMERAS_CONFIG_PATH"))?;

        if let Some(root) = lookup("STREAM_ROOT") {
            config.supervisor = config.supervisor.stream_root(root);
        }

        if let Some(program) = lookup("FFMPEG_PATH") {
            let converter = config.supervisor.converter.clone().program(program);
            config.supervisor = config.supervisor.converter(converter);
        }

        if let Some(raw) = lookup("CONTROL_TIMEOUT_SECS") {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidVar {
                    name: "CONTROL_TIMEOUT_SECS",
                    value: raw,
                })?;
            config.control = config.control.request_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the camera list file
    pub fn cameras_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cameras_path = path.into();
        self
    }

    /// Set supervisor settings
    pub fn supervisor(mut self, supervisor: SupervisorConfig) -> Self {
        self.supervisor = supervisor;
        self
    }

    /// Set ONVIF client settings
    pub fn control(mut self, control: ControlConfig) -> Self {
        self.control = control;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.cameras_path, PathBuf::from("cameras.json"));
        assert_eq!(config.supervisor.public_prefix, "/hls");
        assert_eq!(config.control.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_from_lookup_minimal() {
        let config = ServerConfig::from_lookup(lookup(&[(
            "CAMERAS_CONFIG_PATH",
            "/etc/camgate/cameras.json",
        )]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(
            config.cameras_path,
            PathBuf::from("/etc/camgate/cameras.json")
        );
        assert_eq!(config.supervisor.stream_root, PathBuf::from("hls_streams"));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("CAMERAS_CONFIG_PATH", "cams.json"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("STREAM_ROOT", "/var/lib/camgate/hls"),
            ("FFMPEG_PATH", "/opt/ffmpeg/bin/ffmpeg"),
            ("CONTROL_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(
            config.supervisor.stream_root,
            PathBuf::from("/var/lib/camgate/hls")
        );
        assert_eq!(
            config.supervisor.converter.program,
            PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
        );
        assert_eq!(config.control.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_from_lookup_missing_cameras_path() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "8080")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("CAMERAS_CONFIG_PATH")));
    }

    #[test]
    fn test_from_lookup_invalid_values() {
        let err = ServerConfig::from_lookup(lookup(&[
            ("CAMERAS_CONFIG_PATH", "cams.json"),
            ("PORT", "http"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name: "PORT", .. }));

        let err = ServerConfig::from_lookup(lookup(&[
            ("CAMERAS_CONFIG_PATH", "cams.json"),
            ("CONTROL_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidVar {
                name: "CONTROL_TIMEOUT_SECS",
                ..
            }
        ));
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .cameras_path("cams.json")
            .supervisor(SupervisorConfig::default().stream_root("/tmp/hls"))
            .control(ControlConfig::default().request_timeout(Duration::from_secs(2)));

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.cameras_path, PathBuf::from("cams.json"));
        assert_eq!(config.supervisor.stream_root, PathBuf::from("/tmp/hls"));
        assert_eq!(config.control.request_timeout, Duration::from_secs(2));
    }
}
