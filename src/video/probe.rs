// FFprobe wrapper for video stream metadata

use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use crate::error::{PoseTraceError, Result};
use crate::tools;

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    streams: Option<Vec<FFprobeStream>>,
    format: Option<FFprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
}

/// Metadata for the first video stream of a file
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration_ms: Option<i64>,
    pub codec: Option<String>,
}

/// Run ffprobe on a file and extract the video stream metadata
pub fn probe(path: &Path) -> Result<VideoMetadata> {
    let output = Command::new(tools::ffprobe_path())
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| PoseTraceError::FFprobe(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PoseTraceError::FFprobe(format!("ffprobe failed: {}", stderr)));
    }

    parse_probe_output(&output.stdout)
}

/// Parse the ffprobe JSON document into metadata for the first video stream
fn parse_probe_output(bytes: &[u8]) -> Result<VideoMetadata> {
    let probe_output: FFprobeOutput = serde_json::from_slice(bytes)
        .map_err(|e| PoseTraceError::FFprobe(format!("Failed to parse ffprobe output: {}", e)))?;

    let streams = probe_output.streams.unwrap_or_default();
    let video = streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| PoseTraceError::FFprobe("No video stream found".to_string()))?;

    let width = video.width.filter(|w| *w > 0).ok_or_else(|| {
        PoseTraceError::FFprobe("Video stream reports no width".to_string())
    })? as u32;
    let height = video.height.filter(|h| *h > 0).ok_or_else(|| {
        PoseTraceError::FFprobe("Video stream reports no height".to_string())
    })? as u32;

    let fps = parse_frame_rate(video.r_frame_rate.as_deref())
        .filter(|f| *f > 0.0)
        .ok_or_else(|| PoseTraceError::FFprobe("Video stream reports no frame rate".to_string()))?;

    let duration_ms = parse_duration_ms(video.duration.as_deref()).or_else(|| {
        probe_output
            .format
            .as_ref()
            .and_then(|f| parse_duration_ms(f.duration.as_deref()))
    });

    Ok(VideoMetadata {
        width,
        height,
        fps,
        duration_ms,
        codec: video.codec_name.clone(),
    })
}

/// Parse frame rate string like "30000/1001" to f64
fn parse_frame_rate(rate_str: Option<&str>) -> Option<f64> {
    let rate_str = rate_str?;
    if let Some((num, den)) = rate_str.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate_str.parse().ok()
}

/// Parse duration string to milliseconds
fn parse_duration_ms(duration_str: Option<&str>) -> Option<i64> {
    let duration_str = duration_str?;
    let seconds: f64 = duration_str.parse().ok()?;
    Some((seconds * 1000.0) as i64)
}
