// Annotated-video writer: an ffmpeg encode child fed RGB24 frames over
// stdin, producing a file at the input's resolution and nominal frame rate.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ChildStdin;

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;

use super::StreamInfo;
use crate::error::{PoseTraceError, Result};
use crate::tools;

/// Map a 4-character codec tag to the ffmpeg encoder that produces it.
/// Unknown tags are reported by the caller and fall back to mpeg4.
pub fn encoder_for_fourcc(tag: &str) -> Option<&'static str> {
    match tag.to_ascii_lowercase().as_str() {
        "mp4v" => Some("mpeg4"),
        "avc1" | "h264" | "x264" => Some("libx264"),
        "hev1" | "hvc1" | "h265" => Some("libx265"),
        "mjpg" => Some("mjpeg"),
        "xvid" => Some("libxvid"),
        "vp80" => Some("libvpx"),
        "vp90" => Some("libvpx-vp9"),
        _ => None,
    }
}

pub struct VideoWriter {
    child: FfmpegChild,
    stdin: Option<ChildStdin>,
    path: PathBuf,
    frame_bytes: usize,
    finished: bool,
}

impl VideoWriter {
    /// Start the encode child. Fails if the output location cannot be
    /// created or ffmpeg cannot be started.
    pub fn create(path: &Path, info: &StreamInfo, fourcc: &str) -> Result<VideoWriter> {
        let sink_open = |reason: String| PoseTraceError::SinkOpen {
            sink: "video",
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| sink_open(e.to_string()))?;
        }

        let encoder = encoder_for_fourcc(fourcc).unwrap_or_else(|| {
            log::warn!("Unknown codec tag '{}'; encoding with mpeg4", fourcc);
            "mpeg4"
        });

        let mut child = FfmpegCommand::new_with_path(tools::ffmpeg_path())
            .hide_banner()
            .args(["-loglevel", "error"])
            .format("rawvideo")
            .pix_fmt("rgb24")
            .size(info.width, info.height)
            .rate(info.fps as f32)
            .input("-")
            .codec_video(encoder)
            .args(["-pix_fmt", "yuv420p"])
            .overwrite()
            .output(&path.to_string_lossy())
            .spawn()
            .map_err(|e| sink_open(format!("cannot start ffmpeg: {}", e)))?;

        let stdin = child
            .take_stdin()
            .ok_or_else(|| sink_open("cannot open ffmpeg stdin".to_string()))?;

        log::info!(
            "Writing annotated video to {} ({} via tag '{}')",
            path.display(),
            encoder,
            fourcc
        );

        Ok(VideoWriter {
            child,
            stdin: Some(stdin),
            path: path.to_path_buf(),
            frame_bytes: info.frame_bytes(),
            finished: false,
        })
    }

    /// Append one RGB24 frame. The buffer length must match the stream size.
    pub fn write_frame(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != self.frame_bytes {
            return Err(PoseTraceError::FFmpeg(format!(
                "Frame size mismatch: got {} bytes, expected {}",
                data.len(),
                self.frame_bytes
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| PoseTraceError::FFmpeg("Video writer already finished".to_string()))?;
        stdin
            .write_all(data)
            .map_err(|e| PoseTraceError::FFmpeg(format!("Encoder pipe write failed: {}", e)))
    }

    /// Close the input pipe and wait for the encoder to finalize the file
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        drop(self.stdin.take());

        let status = self
            .child
            .wait()
            .map_err(|e| PoseTraceError::FFmpeg(format!("Encoder wait failed: {}", e)))?;
        if !status.success() {
            return Err(PoseTraceError::FFmpeg(format!(
                "Encoder exited with {} while writing {}",
                status,
                self.path.display()
            )));
        }
        Ok(())
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        if !self.finished {
            drop(self.stdin.take());
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_for_fourcc() {
        assert_eq!(encoder_for_fourcc("mp4v"), Some("mpeg4"));
        assert_eq!(encoder_for_fourcc("MP4V"), Some("mpeg4"));
        assert_eq!(encoder_for_fourcc("avc1"), Some("libx264"));
        assert_eq!(encoder_for_fourcc("mjpg"), Some("mjpeg"));
        assert_eq!(encoder_for_fourcc("none"), None);
        assert_eq!(encoder_for_fourcc(""), None);
    }
}
