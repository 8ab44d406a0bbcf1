// Frame source: an ffmpeg decode child emitting RGB24 rawvideo, surfaced as
// an ordered, forward-only frame sequence with a nominal timestamp clock.

use std::path::Path;

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use ffmpeg_sidecar::iter::FfmpegIterator;

use super::{probe, Frame, FrameStream, StreamInfo};
use crate::error::{PoseTraceError, Result};
use crate::tools;

pub struct VideoSource {
    child: FfmpegChild,
    events: FfmpegIterator,
    info: StreamInfo,
    /// Nominal per-frame interval, truncated to whole milliseconds
    interval_ms: i64,
    next_index: u64,
    next_timestamp_ms: i64,
    done: bool,
}

impl VideoSource {
    /// Open a video file for decoding. Fails with a resource-open error
    /// naming the path when the file is missing or has no usable video
    /// stream. Stream properties are fixed from this point on.
    pub fn open(path: &Path) -> Result<VideoSource> {
        if !path.exists() {
            return Err(PoseTraceError::VideoOpen {
                path: path.display().to_string(),
                reason: "file not found".to_string(),
            });
        }

        let meta = probe::probe(path).map_err(|e| PoseTraceError::VideoOpen {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let info = StreamInfo {
            width: meta.width,
            height: meta.height,
            fps: meta.fps,
        };

        let mut child = FfmpegCommand::new_with_path(tools::ffmpeg_path())
            .hide_banner()
            .input(&path.to_string_lossy())
            .args(["-an"])
            .rawvideo()
            .spawn()
            .map_err(|e| PoseTraceError::VideoOpen {
                path: path.display().to_string(),
                reason: format!("cannot start ffmpeg: {}", e),
            })?;

        let events = child.iter().map_err(|e| PoseTraceError::VideoOpen {
            path: path.display().to_string(),
            reason: format!("cannot read ffmpeg output: {}", e),
        })?;

        log::info!(
            "Opened video {} ({}x{} @ {:.2} fps)",
            path.display(),
            info.width,
            info.height,
            info.fps
        );

        Ok(VideoSource {
            child,
            events,
            info,
            interval_ms: (1000.0 / meta.fps) as i64,
            next_index: 0,
            next_timestamp_ms: 0,
            done: false,
        })
    }
}

impl FrameStream for VideoSource {
    fn info(&self) -> StreamInfo {
        self.info
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.done {
            return Ok(None);
        }

        while let Some(event) = self.events.next() {
            match event {
                FfmpegEvent::OutputFrame(output) => {
                    let frame = Frame {
                        index: self.next_index,
                        timestamp_ms: self.next_timestamp_ms,
                        width: output.width,
                        height: output.height,
                        data: output.data,
                    };
                    self.next_index += 1;
                    self.next_timestamp_ms += self.interval_ms;
                    return Ok(Some(frame));
                }
                FfmpegEvent::Error(message) | FfmpegEvent::Log(LogLevel::Fatal, message) => {
                    self.done = true;
                    return Err(PoseTraceError::Decode(message));
                }
                FfmpegEvent::Log(LogLevel::Error, message) => {
                    // Decoders report recoverable per-frame problems at this
                    // level; the stream usually continues.
                    log::warn!("ffmpeg: {}", message);
                }
                FfmpegEvent::Done => {
                    self.done = true;
                    return Ok(None);
                }
                _ => {}
            }
        }

        self.done = true;
        Ok(None)
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
