// Pipeline controller: owns the frame loop and the lifecycle of the source,
// the detector, and every sink.
//
// State machine: Idle -> Running -> {Completed | Interrupted | Failed}.
// The source is opened before any sink is constructed, so a missing input
// never touches an output. Every terminal state releases every acquired
// resource: the clean paths flush through finish(), the failure path
// unwinds through the Drop impls of the source/detector/sinks.

use crate::config::Settings;
use crate::detect::{DetectorProcess, PoseDetector};
use crate::error::Result;
use crate::render;
use crate::sinks::{SinkFlow, SinkSet};
use crate::video::{FrameStream, VideoSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Interrupted,
    Failed,
}

/// Why the run ended (failures propagate as errors instead)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Source exhaustion
    Completed,
    /// User interrupt from the display sink
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub termination: Termination,
}

/// Run the pipeline described by the settings snapshot over its input video
pub fn run(settings: &Settings) -> Result<RunSummary> {
    let mut source = VideoSource::open(&settings.input_video_path)?;
    let mut detector = DetectorProcess::spawn(settings)?;
    let mut sinks = SinkSet::from_settings(settings, &source.info())?;
    run_frames(&mut source, &mut detector, &mut sinks)
}

/// Drive the frame loop over an already-opened source, detector, and sink
/// set. Split out from `run` so the loop can be exercised with scripted
/// collaborators.
pub fn run_frames(
    source: &mut dyn FrameStream,
    detector: &mut dyn PoseDetector,
    sinks: &mut SinkSet,
) -> Result<RunSummary> {
    log::info!("Pipeline: {:?} -> {:?}", RunState::Idle, RunState::Running);

    match process_frames(source, detector, sinks) {
        Ok((frames_processed, interrupted)) => {
            if let Err(e) = sinks.finish() {
                log::error!(
                    "Pipeline: {:?} -> {:?}: {}",
                    RunState::Running,
                    RunState::Failed,
                    e
                );
                return Err(e);
            }
            let termination = if interrupted {
                Termination::Interrupted
            } else {
                Termination::Completed
            };
            let state = match termination {
                Termination::Completed => RunState::Completed,
                Termination::Interrupted => RunState::Interrupted,
            };
            log::info!(
                "Pipeline: {:?} -> {:?} after {} frames",
                RunState::Running,
                state,
                frames_processed
            );
            Ok(RunSummary {
                frames_processed,
                termination,
            })
        }
        Err(e) => {
            log::error!(
                "Pipeline: {:?} -> {:?}: {}",
                RunState::Running,
                RunState::Failed,
                e
            );
            Err(e)
        }
    }
}

/// The per-frame loop: decode, detect, render once if any sink wants an
/// image, fan out, check the cooperative stop flag. Returns the frame count
/// and whether a sink requested the stop.
fn process_frames(
    source: &mut dyn FrameStream,
    detector: &mut dyn PoseDetector,
    sinks: &mut SinkSet,
) -> Result<(u64, bool)> {
    let wants_image = sinks.wants_image();
    let mut frames_processed = 0u64;

    loop {
        let frame = match source.next_frame()? {
            Some(frame) => frame,
            None => return Ok((frames_processed, false)),
        };

        let record = detector.detect(&frame)?;

        let rendered;
        let image: &[u8] = if wants_image {
            let mut buffer = frame.data.clone();
            render::draw_skeleton(&mut buffer, frame.width, frame.height, &record);
            rendered = buffer;
            &rendered
        } else {
            &frame.data
        };

        frames_processed += 1;
        if sinks.dispatch(&frame, &record, image)? == SinkFlow::Stop {
            return Ok((frames_processed, true));
        }

        if frames_processed % 300 == 0 {
            log::debug!("Processed {} frames", frames_processed);
        }
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
