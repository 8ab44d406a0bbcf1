// Annotated-video sink: hands rendered frames to the ffmpeg encode child

use std::path::Path;

use crate::error::Result;
use crate::video::{StreamInfo, VideoWriter};

use super::{FrameSink, SinkFlow, SinkFrame};

pub struct VideoSink {
    writer: VideoWriter,
}

impl VideoSink {
    /// Start the encoder. Fails at construction when the output stream
    /// cannot be opened.
    pub fn create(path: &Path, info: &StreamInfo, fourcc: &str) -> Result<VideoSink> {
        Ok(VideoSink {
            writer: VideoWriter::create(path, info, fourcc)?,
        })
    }
}

impl FrameSink for VideoSink {
    fn name(&self) -> &'static str {
        "video"
    }

    fn wants_image(&self) -> bool {
        true
    }

    fn write(&mut self, input: &SinkFrame<'_>) -> Result<SinkFlow> {
        self.writer.write_frame(input.image)?;
        Ok(SinkFlow::Continue)
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.finish()
    }
}
