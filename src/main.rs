// Posetrace CLI binary

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use posetrace::config::{self, Settings};
use posetrace::pipeline::{self, Termination};
use posetrace::video::probe;
use posetrace::tools;

#[derive(Parser)]
#[command(name = "posetrace")]
#[command(about = "Extract per-frame pose coordinates from a video", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pose extraction pipeline over the configured input video
    Run {
        /// Load settings from a named profile (e.g. "default", "low_res_fast")
        #[arg(long, default_value = "default")]
        profile: String,

        /// Input video filename, placed in the raw data directory
        #[arg(long)]
        input_video: Option<String>,

        /// Detector model variant: lite, full, or heavy
        #[arg(long)]
        model_variant: Option<String>,

        /// Minimum person-detection confidence (0..1)
        #[arg(long)]
        min_detection_confidence: Option<f64>,

        /// Subject selection when several people are reported: first, best_presence
        #[arg(long)]
        subject_policy: Option<String>,

        /// Do not display real-time results in a window
        #[arg(long)]
        no_display: bool,

        /// Do not save processed coordinates to CSV
        #[arg(long)]
        no_save_coords: bool,

        /// Save the annotated video with the skeleton overlay
        #[arg(long)]
        save_video: bool,

        /// Project root (defaults to the current directory)
        #[arg(long)]
        base_dir: Option<PathBuf>,
    },

    /// Print the stream metadata discovered for a video file
    Probe {
        /// Video file to inspect
        path: PathBuf,
    },

    /// Report resolved external tool paths and availability
    Doctor,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            profile,
            input_video,
            model_variant,
            min_detection_confidence,
            subject_policy,
            no_display,
            no_save_coords,
            save_video,
            base_dir,
        } => cmd_run(
            profile,
            input_video,
            model_variant,
            min_detection_confidence,
            subject_policy,
            no_display,
            no_save_coords,
            save_video,
            base_dir,
        ),
        Commands::Probe { path } => cmd_probe(path),
        Commands::Doctor => cmd_doctor(),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    profile: String,
    input_video: Option<String>,
    model_variant: Option<String>,
    min_detection_confidence: Option<f64>,
    subject_policy: Option<String>,
    no_display: bool,
    no_save_coords: bool,
    save_video: bool,
    base_dir: Option<PathBuf>,
) -> Result<()> {
    let base_dir = match base_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    // Command-line values become the highest-precedence overlay; only flags
    // that were actually passed appear in it
    let mut overrides = Map::new();
    if let Some(name) = input_video {
        let filename = Path::new(&name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or(name);
        overrides.insert("input_video_filename".to_string(), filename.into());
    }
    if let Some(variant) = model_variant {
        overrides.insert("model_variant".to_string(), variant.into());
    }
    if let Some(confidence) = min_detection_confidence {
        overrides.insert("min_detection_confidence".to_string(), confidence.into());
    }
    if let Some(policy) = subject_policy {
        overrides.insert("subject_policy".to_string(), policy.into());
    }
    if no_display {
        overrides.insert("display_results".to_string(), Value::Bool(false));
    }
    if no_save_coords {
        overrides.insert("save_coordinates".to_string(), Value::Bool(false));
    }
    if save_video {
        overrides.insert("save_video".to_string(), Value::Bool(true));
    }

    let settings = config::resolve(&base_dir, &profile, overrides);
    print_settings_banner(&settings);

    // Pre-flight: a missing input file skips the run; it is not a pipeline
    // failure
    if !settings.input_video_path.exists() {
        // Make the hint actionable on a fresh checkout
        let _ = std::fs::create_dir_all(&settings.raw_data_dir);
        eprintln!(
            "Input video '{}' not found.",
            settings.input_video_path.display()
        );
        eprintln!(
            "Place the file under '{}' or pass --input-video.",
            settings.raw_data_dir.display()
        );
        return Ok(());
    }

    let started = chrono::Local::now();
    let summary = pipeline::run(&settings)?;
    let elapsed = chrono::Local::now() - started;

    println!();
    match summary.termination {
        Termination::Completed => println!(
            "Processing complete: {} frames in {:.1}s",
            summary.frames_processed,
            elapsed.num_milliseconds() as f64 / 1000.0
        ),
        Termination::Interrupted => println!(
            "Interrupted by user after {} frames",
            summary.frames_processed
        ),
    }
    if settings.save_coordinates {
        println!("Coordinates saved to {}", settings.coords_path.display());
    }
    if settings.save_video {
        println!("Annotated video saved to {}", settings.video_path.display());
    }

    Ok(())
}

fn print_settings_banner(settings: &Settings) {
    println!("--- posetrace ---");
    println!("Input video:      {}", settings.input_video_path.display());
    println!("Coordinates:      {}", settings.coords_path.display());
    println!("Model variant:    {}", settings.model_variant.as_str());
    println!("Display:          {}", settings.display_results);
    println!("Save coordinates: {}", settings.save_coordinates);
    println!("Save video:       {}", settings.save_video);
    println!("-----------------");
}

fn cmd_probe(path: PathBuf) -> Result<()> {
    let meta = probe::probe(&path)?;

    println!("{}", path.display());
    println!("  resolution: {}x{}", meta.width, meta.height);
    println!("  frame rate: {:.3} fps", meta.fps);
    if let Some(codec) = &meta.codec {
        println!("  codec:      {}", codec);
    }
    if let Some(duration_ms) = meta.duration_ms {
        println!("  duration:   {:.2}s", duration_ms as f64 / 1000.0);
    }

    Ok(())
}

fn cmd_doctor() -> Result<()> {
    println!("External tools:");
    let mut all_ok = true;
    for status in tools::check_tools() {
        let state = if status.available { "ok" } else { "MISSING" };
        let version = status.version.unwrap_or_default();
        println!(
            "  {:<14} {:<8} {} {}",
            status.name,
            state,
            status.path.display(),
            version
        );
        all_ok &= status.available;
    }

    if !all_ok {
        println!();
        println!("Missing tools can be provided next to the executable or via");
        println!("POSETRACE_FFMPEG_PATH / POSETRACE_FFPROBE_PATH / POSETRACE_FFPLAY_PATH /");
        println!("POSETRACE_DETECTOR_PATH environment overrides.");
    }

    Ok(())
}
