// Display sink: live preview through an ffplay window fed rawvideo over
// stdin. Window management stays inside ffplay; posetrace only observes the
// child. The user closing the window (or pressing q) exits the child, which
// this sink reports as a clean stop request -- never as an error.

use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::constants::DISPLAY_WINDOW_TITLE;
use crate::error::{PoseTraceError, Result};
use crate::tools;
use crate::video::StreamInfo;

use super::{FrameSink, SinkFlow, SinkFrame};

pub struct DisplaySink {
    child: Child,
    stdin: Option<ChildStdin>,
    stopped: bool,
}

impl DisplaySink {
    /// Open the preview window
    pub fn open(info: &StreamInfo) -> Result<DisplaySink> {
        let program = tools::ffplay_path();
        let mut child = Command::new(&program)
            .args([
                "-loglevel", "error",
                "-f", "rawvideo",
                "-pixel_format", "rgb24",
                "-video_size", &format!("{}x{}", info.width, info.height),
                "-framerate", &format!("{}", info.fps),
                "-window_title", DISPLAY_WINDOW_TITLE,
                "-i", "-",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PoseTraceError::SinkOpen {
                sink: "display",
                path: program.display().to_string(),
                reason: e.to_string(),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| PoseTraceError::SinkOpen {
            sink: "display",
            path: program.display().to_string(),
            reason: "cannot open ffplay stdin".to_string(),
        })?;

        Ok(DisplaySink {
            child,
            stdin: Some(stdin),
            stopped: false,
        })
    }

    fn release(&mut self) {
        if !self.stopped {
            self.stopped = true;
            drop(self.stdin.take());
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

impl FrameSink for DisplaySink {
    fn name(&self) -> &'static str {
        "display"
    }

    fn wants_image(&self) -> bool {
        true
    }

    fn write(&mut self, input: &SinkFrame<'_>) -> Result<SinkFlow> {
        // Poll for a user interrupt: the child exits when the window is
        // closed or q is pressed
        if let Ok(Some(_)) = self.child.try_wait() {
            log::info!("Display window closed by user");
            self.stopped = true;
            self.stdin.take();
            return Ok(SinkFlow::Stop);
        }

        let stdin = match self.stdin.as_mut() {
            Some(stdin) => stdin,
            None => return Ok(SinkFlow::Stop),
        };
        if stdin.write_all(input.image).is_err() {
            // Pipe broke under us: the window went away mid-frame
            log::info!("Display window closed by user");
            self.release();
            return Ok(SinkFlow::Stop);
        }

        Ok(SinkFlow::Continue)
    }

    fn finish(&mut self) -> Result<()> {
        self.release();
        Ok(())
    }
}

impl Drop for DisplaySink {
    fn drop(&mut self) {
        self.release();
    }
}
