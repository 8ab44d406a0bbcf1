// Video I/O: stream metadata discovery (ffprobe), frame decode (ffmpeg
// rawvideo out), and annotated-video encode (ffmpeg rawvideo in).

pub mod probe;
pub mod source;
pub mod writer;

pub use source::VideoSource;
pub use writer::VideoWriter;

use crate::error::Result;

/// Stream properties discovered at open time; constant for the life of a source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl StreamInfo {
    /// Size of one RGB24 frame in bytes
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// One decoded RGB24 frame plus its ordinal index and nominal timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub timestamp_ms: i64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Ordered, forward-only frame supply. Implemented by `VideoSource` and by
/// scripted streams in tests.
pub trait FrameStream {
    fn info(&self) -> StreamInfo;
    /// Next frame in order, or `None` at end of stream. Not restartable.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}
