// Sink fan-out: routes each frame's (image, record) pair to the active
// sinks. Each sink decides whether it is active from the settings snapshot
// at construction time and exclusively owns its output handle.

pub mod csv;
pub mod display;
pub mod video;

use crate::config::Settings;
use crate::error::Result;
use crate::landmarks::LandmarkRecord;
use crate::video::{Frame, StreamInfo};

/// Per-frame sink verdict. `Stop` is a clean early-termination request
/// (user interrupt), not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFlow {
    Continue,
    Stop,
}

/// Everything a sink may consume for one frame. `image` carries the skeleton
/// overlay when any active sink asked for a rendered frame, and the raw
/// decoded pixels otherwise.
pub struct SinkFrame<'a> {
    pub frame: &'a Frame,
    pub record: &'a LandmarkRecord,
    pub image: &'a [u8],
}

pub trait FrameSink {
    fn name(&self) -> &'static str;

    /// Whether this sink consumes rendered pixels (drives the once-per-frame
    /// skeleton draw)
    fn wants_image(&self) -> bool;

    fn write(&mut self, input: &SinkFrame<'_>) -> Result<SinkFlow>;

    /// Flush and close the output. Called once on clean termination; error
    /// paths rely on Drop for release.
    fn finish(&mut self) -> Result<()>;
}

/// The set of active sinks for one run, in fixed dispatch order
pub struct SinkSet {
    sinks: Vec<Box<dyn FrameSink>>,
}

impl SinkSet {
    /// Construct every sink the snapshot activates: display, annotated
    /// video, CSV, in dispatch order.
    pub fn from_settings(settings: &Settings, info: &StreamInfo) -> Result<SinkSet> {
        let mut sinks: Vec<Box<dyn FrameSink>> = Vec::new();

        if settings.display_results {
            sinks.push(Box::new(display::DisplaySink::open(info)?));
        }
        if settings.save_video {
            sinks.push(Box::new(video::VideoSink::create(
                &settings.video_path,
                info,
                &settings.video_fourcc,
            )?));
        }
        if settings.save_coordinates {
            sinks.push(Box::new(csv::CsvSink::create(&settings.coords_path)?));
        }

        if sinks.is_empty() {
            log::warn!("No sinks are active; frames will be processed and discarded");
        }

        Ok(SinkSet { sinks })
    }

    /// Assemble a sink set directly (tests and embedders)
    pub fn new(sinks: Vec<Box<dyn FrameSink>>) -> SinkSet {
        SinkSet { sinks }
    }

    pub fn wants_image(&self) -> bool {
        self.sinks.iter().any(|s| s.wants_image())
    }

    /// Fan one frame out to every sink. Every sink sees every frame; a
    /// `Stop` request is reported only after the full fan-out so the frame's
    /// row/image reaches all outputs before termination.
    pub fn dispatch(
        &mut self,
        frame: &Frame,
        record: &LandmarkRecord,
        image: &[u8],
    ) -> Result<SinkFlow> {
        let input = SinkFrame {
            frame,
            record,
            image,
        };
        let mut flow = SinkFlow::Continue;
        for sink in &mut self.sinks {
            if sink.write(&input)? == SinkFlow::Stop {
                log::info!("{} sink requested stop at frame {}", sink.name(), frame.index);
                flow = SinkFlow::Stop;
            }
        }
        Ok(flow)
    }

    /// Finish every sink, reporting the first failure after attempting all
    pub fn finish(&mut self) -> Result<()> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.finish() {
                log::error!("{} sink failed to finish: {}", sink.name(), e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
