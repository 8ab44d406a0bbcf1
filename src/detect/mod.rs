// Detection adapter: drives the external pose detector process and maps its
// replies into landmark records. The detector is a black box -- posetrace
// never implements pose estimation itself.
//
// Protocol: one JSON config line at startup; then per frame one JSON header
// line followed by the raw RGB24 bytes on stdin, answered by one JSON reply
// line on stdout. Detector failures are fatal to the run -- pose detection
// failures are not transient, so there is no retry.

pub mod wire;

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::Serialize;

use crate::config::{Settings, SubjectPolicy};
use crate::error::{PoseTraceError, Result};
use crate::landmarks::LandmarkRecord;
use crate::tools;
use crate::video::Frame;

/// The pipeline's detection seam. Production uses `DetectorProcess`; tests
/// script this directly.
pub trait PoseDetector {
    /// Run detection for one frame, exactly once, synchronously
    fn detect(&mut self, frame: &Frame) -> Result<LandmarkRecord>;
}

/// Startup configuration sent to the detector as its first input line
#[derive(Debug, Serialize)]
struct DetectorConfig<'a> {
    model_variant: &'a str,
    min_detection_confidence: f64,
    min_presence_confidence: f64,
    min_tracking_confidence: f64,
}

/// Per-frame header preceding the raw pixel payload
#[derive(Debug, Serialize)]
struct FrameHeader {
    width: u32,
    height: u32,
    timestamp_ms: i64,
    pix_fmt: &'static str,
    bytes: usize,
}

pub struct DetectorProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    program: PathBuf,
    policy: SubjectPolicy,
}

impl DetectorProcess {
    /// Start the detector child and send its configuration line
    pub fn spawn(settings: &Settings) -> Result<DetectorProcess> {
        let program = settings
            .detector_command
            .clone()
            .unwrap_or_else(tools::detector_path);

        let mut child = Command::new(&program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                PoseTraceError::Detector(format!(
                    "Cannot start detector '{}': {}",
                    program.display(),
                    e
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PoseTraceError::Detector("Cannot open detector stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| PoseTraceError::Detector("Cannot open detector stdout".to_string()))?;

        let config = DetectorConfig {
            model_variant: settings.model_variant.as_str(),
            min_detection_confidence: settings.min_detection_confidence,
            min_presence_confidence: settings.min_presence_confidence,
            min_tracking_confidence: settings.min_tracking_confidence,
        };
        let mut line = serde_json::to_string(&config)?;
        line.push('\n');
        stdin
            .write_all(line.as_bytes())
            .map_err(|e| PoseTraceError::Detector(format!("Detector handshake failed: {}", e)))?;

        log::info!(
            "Detector started: {} (model '{}')",
            program.display(),
            settings.model_variant.as_str()
        );

        Ok(DetectorProcess {
            child,
            stdin,
            stdout,
            program,
            policy: settings.subject_policy,
        })
    }
}

impl PoseDetector for DetectorProcess {
    fn detect(&mut self, frame: &Frame) -> Result<LandmarkRecord> {
        let failed = |reason: String| PoseTraceError::Detector(reason);

        let header = FrameHeader {
            width: frame.width,
            height: frame.height,
            timestamp_ms: frame.timestamp_ms,
            pix_fmt: "rgb24",
            bytes: frame.data.len(),
        };
        let mut line = serde_json::to_string(&header)?;
        line.push('\n');

        self.stdin
            .write_all(line.as_bytes())
            .and_then(|_| self.stdin.write_all(&frame.data))
            .and_then(|_| self.stdin.flush())
            .map_err(|e| failed(format!("Cannot send frame {}: {}", frame.index, e)))?;

        let mut reply = String::new();
        let read = self
            .stdout
            .read_line(&mut reply)
            .map_err(|e| failed(format!("Cannot read reply for frame {}: {}", frame.index, e)))?;
        if read == 0 {
            return Err(failed(format!(
                "Detector '{}' exited before frame {}",
                self.program.display(),
                frame.index
            )));
        }

        let decoded: wire::DetectorReply = serde_json::from_str(reply.trim()).map_err(|e| {
            failed(format!(
                "Malformed detector reply for frame {}: {}",
                frame.index, e
            ))
        })?;

        Ok(wire::normalize(decoded, self.policy))
    }
}

impl Drop for DetectorProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
