// CSV sink: one header row at construction, one row per frame.
//
// Absent records emit an explicit empty field for every coordinate column --
// this is what distinguishes "no detection" from "detected at the origin" in
// the time series. Present values use fixed 6-decimal formatting.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::constants::COORD_DECIMALS;
use crate::error::{PoseTraceError, Result};
use crate::landmarks::{LandmarkRecord, JOINT_COUNT};

use super::{FrameSink, SinkFlow, SinkFrame};

/// The fixed header: frame_id, then four columns per joint in joint order
pub fn header_row() -> String {
    let mut fields = Vec::with_capacity(1 + JOINT_COUNT * 4);
    fields.push("frame_id".to_string());
    for i in 0..JOINT_COUNT {
        fields.push(format!("landmark_{}_x", i));
        fields.push(format!("landmark_{}_y", i));
        fields.push(format!("landmark_{}_z", i));
        fields.push(format!("landmark_{}_visibility", i));
    }
    fields.join(",")
}

/// One data row. The frame_id column carries the frame's nominal timestamp
/// in milliseconds. A joint with no data contributes four empty fields.
pub fn format_row(timestamp_ms: i64, record: &LandmarkRecord) -> String {
    let mut fields = Vec::with_capacity(1 + JOINT_COUNT * 4);
    fields.push(timestamp_ms.to_string());

    match record {
        LandmarkRecord::Absent => {
            for _ in 0..JOINT_COUNT * 4 {
                fields.push(String::new());
            }
        }
        LandmarkRecord::Present(landmarks) => {
            for point in landmarks.iter() {
                match point {
                    Some(p) => {
                        fields.push(format!("{:.*}", COORD_DECIMALS, p.x));
                        fields.push(format!("{:.*}", COORD_DECIMALS, p.y));
                        fields.push(format!("{:.*}", COORD_DECIMALS, p.z));
                        fields.push(format!("{:.*}", COORD_DECIMALS, p.visibility));
                    }
                    None => {
                        for _ in 0..4 {
                            fields.push(String::new());
                        }
                    }
                }
            }
        }
    }

    fields.join(",")
}

pub struct CsvSink {
    writer: BufWriter<File>,
    path: PathBuf,
    rows: u64,
}

impl CsvSink {
    /// Open the output file and write the header row
    pub fn create(path: &Path) -> Result<CsvSink> {
        let sink_open = |reason: String| PoseTraceError::SinkOpen {
            sink: "csv",
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| sink_open(e.to_string()))?;
        }

        let file = File::create(path).map_err(|e| sink_open(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", header_row()).map_err(|e| sink_open(e.to_string()))?;

        log::info!("Writing coordinates to {}", path.display());

        Ok(CsvSink {
            writer,
            path: path.to_path_buf(),
            rows: 0,
        })
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }
}

impl FrameSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn wants_image(&self) -> bool {
        false
    }

    fn write(&mut self, input: &SinkFrame<'_>) -> Result<SinkFlow> {
        let row = format_row(input.frame.timestamp_ms, input.record);
        writeln!(self.writer, "{}", row).map_err(|e| PoseTraceError::SinkWrite {
            sink: "csv",
            reason: e.to_string(),
        })?;
        self.rows += 1;
        Ok(SinkFlow::Continue)
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| PoseTraceError::SinkWrite {
            sink: "csv",
            reason: format!("flush of {} failed: {}", self.path.display(), e),
        })?;
        log::debug!("CSV sink closed after {} rows", self.rows);
        Ok(())
    }
}
