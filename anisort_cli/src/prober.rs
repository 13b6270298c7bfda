//! Video resolution via `ffprobe`

use anisort_core::error::{InternalError, IoError};
use anisort_core::{MediaProber, Resolution};
use async_trait::async_trait;
use log::{debug, trace};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub struct FfprobeProber {
    program: PathBuf,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeProber {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// `Ok(None)` when ffprobe found no video stream
pub fn parse_probe_output(json: &[u8]) -> anisort_core::Result<Option<Resolution>> {
    let output: ProbeOutput = serde_json::from_slice(json)
        .map_err(|e| InternalError::tool("ffprobe", format!("unreadable output: {e}")))?;

    Ok(output.streams.into_iter().find_map(|stream| {
        match (stream.width, stream.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => {
                Some(Resolution::new(width, height))
            }
            _ => None,
        }
    }))
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> anisort_core::Result<Option<Resolution>> {
        debug!("Probing {}", path.display());
        let output = Command::new(&self.program)
            .args(["-v", "error", "-select_streams", "v:0"])
            .args(["-show_entries", "stream=width,height", "-of", "json"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| IoError::from_std(e).with_path(&self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InternalError::tool(
                "ffprobe",
                format!("{} on {}: {}", output.status, path.display(), stderr.trim()),
            )
            .into());
        }

        trace!("ffprobe output: {}", String::from_utf8_lossy(&output.stdout));
        parse_probe_output(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_stream() {
        let json = br#"{"programs": [], "streams": [{"width": 1280, "height": 720}]}"#;
        assert_eq!(
            parse_probe_output(json).unwrap(),
            Some(Resolution::new(1280, 720))
        );
    }

    #[test]
    fn test_no_streams_means_no_video() {
        assert_eq!(parse_probe_output(br#"{"streams": []}"#).unwrap(), None);
        assert_eq!(parse_probe_output(b"{}").unwrap(), None);
    }

    #[test]
    fn test_stream_without_dimensions_is_ignored() {
        let json = br#"{"streams": [{"width": 0, "height": 0}]}"#;
        assert_eq!(parse_probe_output(json).unwrap(), None);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(parse_probe_output(b"not json").is_err());
    }

    #[tokio::test]
    async fn test_missing_program_is_an_io_error() {
        let prober = FfprobeProber::new("/nonexistent/ffprobe-for-tests");
        let result = prober.probe(Path::new("/tmp/whatever.mkv")).await;
        assert!(matches!(result, Err(anisort_core::Error::Io(_))));
    }
}
