//! Converter invocation
//!
//! [`ConverterCommand`] renders the fixed ffmpeg argument template for one
//! session; a [`ConverterLauncher`] turns it into a [`MonitoredProcess`].

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use super::config::ConverterConfig;
use super::key::SessionKey;
use super::process::MonitoredProcess;

/// Fully rendered converter invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterCommand {
    /// Executable
    pub program: PathBuf,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Directory the converter writes into
    pub output_dir: PathBuf,
    /// Manifest the converter maintains
    pub manifest_path: PathBuf,
}

impl ConverterCommand {
    /// Render the RTSP → HLS template for `source` writing into `output_dir`
    pub fn hls(config: &ConverterConfig, source: &str, output_dir: &Path) -> Self {
        let segment_path = output_dir.join(&config.segment_pattern);
        let manifest_path = output_dir.join(&config.manifest_name);

        let args = vec![
            "-rtsp_transport".to_string(),
            config.rtsp_transport.clone(),
            "-i".to_string(),
            source.to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            config.audio_codec.clone(),
            "-ar".to_string(),
            config.audio_sample_rate.to_string(),
            "-b:a".to_string(),
            config.audio_bitrate.clone(),
            "-f".to_string(),
            "hls".to_string(),
            "-hls_time".to_string(),
            config.segment_duration.to_string(),
            "-hls_list_size".to_string(),
            config.list_size.to_string(),
            "-hls_flags".to_string(),
            config.hls_flags.clone(),
            "-hls_segment_filename".to_string(),
            segment_path.to_string_lossy().into_owned(),
            manifest_path.to_string_lossy().into_owned(),
        ];

        Self {
            program: config.program.clone(),
            args,
            output_dir: output_dir.to_path_buf(),
            manifest_path,
        }
    }
}

/// Starts converter processes
///
/// Implementations must not block; the returned process is monitored by the
/// supervisor from the moment this returns.
pub trait ConverterLauncher: Send + Sync {
    /// Launch the converter for `key`
    fn launch(&self, key: &SessionKey, command: &ConverterCommand) -> io::Result<MonitoredProcess>;
}

/// Launches converters as child processes
///
/// The converter's stderr is forwarded to `tracing` at debug level.
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    /// Create a new launcher
    pub fn new() -> Self {
        Self
    }
}

impl ConverterLauncher for ProcessLauncher {
    fn launch(&self, key: &SessionKey, command: &ConverterCommand) -> io::Result<MonitoredProcess> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(key.clone(), stderr));
        }

        Ok(MonitoredProcess::spawn(child))
    }
}

/// Longest stderr line forwarded in one piece; longer runs are split
pub const MAX_LOG_LINE: usize = 1024;

async fn forward_stderr<R>(key: SessionKey, stderr: R)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut line = Vec::with_capacity(256);

    loop {
        match read_log_line(&mut reader, &mut line).await {
            Ok(true) => {
                let text = String::from_utf8_lossy(&line);
                if !text.trim().is_empty() {
                    tracing::debug!(key = %key, "converter: {}", text.trim_end());
                }
            }
            Ok(false) => break,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Converter stderr closed");
                break;
            }
        }
    }
}

/// Read one log line into `line`
///
/// Lines end at `\n` or `\r` (ffmpeg's progress report rewrites itself with
/// bare carriage returns) and are cut at [`MAX_LOG_LINE`] bytes. Returns
/// `false` once the stream is exhausted.
async fn read_log_line<R>(reader: &mut R, line: &mut Vec<u8>) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(!line.is_empty());
        }

        let room = MAX_LOG_LINE - line.len();
        let window = &available[..available.len().min(room)];

        match window.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(end) => {
                line.extend_from_slice(&window[..end]);
                reader.consume(end + 1);
                return Ok(true);
            }
            None => {
                let taken = window.len();
                line.extend_from_slice(window);
                reader.consume(taken);
                if line.len() >= MAX_LOG_LINE {
                    return Ok(true);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hls_template() {
        let config = ConverterConfig::default();
        let command = ConverterCommand::hls(
            &config,
            "rtsp://10.0.0.5/live",
            Path::new("/srv/hls/10.0.0.5"),
        );

        assert_eq!(command.program, PathBuf::from("ffmpeg"));
        assert_eq!(
            command.args,
            vec![
                "-rtsp_transport",
                "tcp",
                "-i",
                "rtsp://10.0.0.5/live",
                "-c:v",
                "copy",
                "-c:a",
                "aac",
                "-ar",
                "44100",
                "-b:a",
                "64k",
                "-f",
                "hls",
                "-hls_time",
                "4",
                "-hls_list_size",
                "5",
                "-hls_flags",
                "delete_segments+append_list",
                "-hls_segment_filename",
                "/srv/hls/10.0.0.5/segment_%03d.ts",
                "/srv/hls/10.0.0.5/stream.m3u8",
            ]
        );
        assert_eq!(
            command.manifest_path,
            PathBuf::from("/srv/hls/10.0.0.5/stream.m3u8")
        );
    }

    #[test]
    fn test_template_follows_config() {
        let config = ConverterConfig::default()
            .segment_duration(2)
            .list_size(8)
            .manifest_name("index.m3u8");
        let command = ConverterCommand::hls(&config, "rtsp://cam/rec", Path::new("out"));

        let hls_time = command.args.iter().position(|a| a == "-hls_time").unwrap();
        assert_eq!(command.args[hls_time + 1], "2");
        let list_size = command.args.iter().position(|a| a == "-hls_list_size").unwrap();
        assert_eq!(command.args[list_size + 1], "8");
        assert_eq!(command.args.last().unwrap(), "out/index.m3u8");
    }

    async fn collect_lines(input: &[u8], capacity: usize) -> Vec<Vec<u8>> {
        let mut reader = BufReader::with_capacity(capacity, input);
        let mut line = Vec::new();
        let mut lines = Vec::new();
        while read_log_line(&mut reader, &mut line).await.unwrap() {
            lines.push(line.clone());
        }
        lines
    }

    #[tokio::test]
    async fn test_progress_updates_split_on_carriage_return() {
        let mut input = Vec::new();
        for frame in 0..2000 {
            input.extend_from_slice(format!("frame={} fps=25 time=00:00:{:02}.00\r", frame, frame % 60).as_bytes());
        }
        input.extend_from_slice(b"Exiting normally\n");

        let lines = collect_lines(&input, 64).await;

        assert_eq!(lines.len(), 2001);
        assert_eq!(lines[0], b"frame=0 fps=25 time=00:00:00.00");
        assert_eq!(lines[1999], b"frame=1999 fps=25 time=00:00:19.00");
        assert_eq!(lines[2000], b"Exiting normally");
        assert!(lines.iter().all(|l| l.len() <= MAX_LOG_LINE));
    }

    #[tokio::test]
    async fn test_unterminated_output_is_capped() {
        let input = vec![b'x'; MAX_LOG_LINE * 2 + 10];

        let lines = collect_lines(&input, 100).await;

        let lengths: Vec<usize> = lines.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![MAX_LOG_LINE, MAX_LOG_LINE, 10]);
    }

    #[tokio::test]
    async fn test_crlf_and_trailing_text() {
        let lines = collect_lines(b"Input #0, rtsp\r\nStream mapping:", 8).await;

        assert_eq!(
            lines,
            vec![b"Input #0, rtsp".to_vec(), Vec::new(), b"Stream mapping:".to_vec()]
        );
    }

    #[tokio::test]
    async fn test_spawn_failure_is_io_error() {
        let config = ConverterConfig::default().program("/nonexistent/camgate-ffmpeg");
        let command = ConverterCommand::hls(&config, "rtsp://cam/live", Path::new("out"));

        let result = ProcessLauncher::new().launch(&SessionKey::live("10.0.0.5"), &command);
        assert!(result.is_err());
    }
}
