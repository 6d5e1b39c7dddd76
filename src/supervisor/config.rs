//! Supervisor configuration

use std::path::PathBuf;
use std::time::Duration;

/// Converter (ffmpeg) argument template
///
/// Defaults produce a TCP-transport RTSP pull, pass-through video, AAC audio
/// at 44.1 kHz / 64 kbps, and a 5 × 4 s rolling HLS window with old segments
/// deleted.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Converter executable
    pub program: PathBuf,

    /// RTSP lower transport
    pub rtsp_transport: String,

    /// Audio codec for re-encoding
    pub audio_codec: String,

    /// Audio sample rate in Hz
    pub audio_sample_rate: u32,

    /// Audio bitrate (ffmpeg notation)
    pub audio_bitrate: String,

    /// Target segment duration in seconds
    pub segment_duration: u32,

    /// Number of segments kept in the manifest
    pub list_size: u32,

    /// HLS muxer flags
    pub hls_flags: String,

    /// Segment filename pattern, relative to the output directory
    pub segment_pattern: String,

    /// Manifest filename, relative to the output directory
    pub manifest_name: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            rtsp_transport: "tcp".into(),
            audio_codec: "aac".into(),
            audio_sample_rate: 44_100,
            audio_bitrate: "64k".into(),
            segment_duration: 4,
            list_size: 5,
            hls_flags: "delete_segments+append_list".into(),
            segment_pattern: "segment_%03d.ts".into(),
            manifest_name: "stream.m3u8".into(),
        }
    }
}

impl ConverterConfig {
    /// Set the converter executable
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Set segment duration (at least one second)
    pub fn segment_duration(mut self, secs: u32) -> Self {
        self.segment_duration = secs.max(1);
        self
    }

    /// Set rolling window size (at least one segment)
    pub fn list_size(mut self, segments: u32) -> Self {
        self.list_size = segments.max(1);
        self
    }

    /// Set manifest filename
    pub fn manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }
}

/// Stream session supervisor configuration
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Directory holding one output directory per session key
    pub stream_root: PathBuf,

    /// URL prefix under which `stream_root` is served
    pub public_prefix: String,

    /// How long a superseded converter gets to exit before it is killed
    pub stop_timeout: Duration,

    /// Converter argument template
    pub converter: ConverterConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            stream_root: PathBuf::from("hls_streams"),
            public_prefix: "/hls".into(),
            stop_timeout: Duration::from_secs(5),
            converter: ConverterConfig::default(),
        }
    }
}

impl SupervisorConfig {
    /// Set the streaming root directory
    pub fn stream_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.stream_root = root.into();
        self
    }

    /// Set the public URL prefix (trailing slashes are dropped)
    pub fn public_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.public_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    /// Set the supersession stop timeout
    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Set the converter template
    pub fn converter(mut self, converter: ConverterConfig) -> Self {
        self.converter = converter;
        self
    }
}
