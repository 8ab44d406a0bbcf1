// Posetrace Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoseTraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot open video '{path}': {reason}")]
    VideoOpen { path: String, reason: String },

    #[error("Cannot open {sink} output '{path}': {reason}")]
    SinkOpen {
        sink: &'static str,
        path: String,
        reason: String,
    },

    #[error("{sink} sink write failed: {reason}")]
    SinkWrite {
        sink: &'static str,
        reason: String,
    },

    #[error("FFprobe error: {0}")]
    FFprobe(String),

    #[error("FFmpeg error: {0}")]
    FFmpeg(String),

    #[error("Video decode error: {0}")]
    Decode(String),

    #[error("Detector error: {0}")]
    Detector(String),
}

pub type Result<T> = std::result::Result<T, PoseTraceError>;
