// Posetrace Constants
// Default settings values and fixed pipeline parameters.

// Default directory layout (relative to the working directory)
pub const RAW_DATA_DIR: &str = "data/raw";
pub const PROCESSED_DATA_DIR: &str = "data/processed";
pub const OUTPUT_DIR: &str = "output";
pub const PROFILES_DIR: &str = "config/profiles";

// Default artifact filenames
pub const DEFAULT_INPUT_VIDEO: &str = "input_video.mp4";
pub const DEFAULT_COORDS_FILENAME: &str = "pose_coordinates.csv";
pub const DEFAULT_VIDEO_FILENAME: &str = "output_pose_video.mp4";

// Default detector parameters
pub const DEFAULT_MODEL_VARIANT: &str = "lite";
pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_MIN_PRESENCE_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_MIN_TRACKING_CONFIDENCE: f64 = 0.5;

// Output video codec tag (FourCC), mapped to an ffmpeg encoder at open time
pub const DEFAULT_VIDEO_FOURCC: &str = "mp4v";

// CSV formatting
pub const COORD_DECIMALS: usize = 6;

// Skeleton overlay colors (RGB)
pub const CONNECTION_COLOR: [u8; 3] = [0, 255, 0];
pub const JOINT_COLOR: [u8; 3] = [255, 64, 64];
pub const JOINT_RADIUS: i64 = 3;

// External tool env-var overrides (see tools.rs for resolution order)
pub const ENV_FFMPEG_PATH: &str = "POSETRACE_FFMPEG_PATH";
pub const ENV_FFPROBE_PATH: &str = "POSETRACE_FFPROBE_PATH";
pub const ENV_FFPLAY_PATH: &str = "POSETRACE_FFPLAY_PATH";
pub const ENV_DETECTOR_PATH: &str = "POSETRACE_DETECTOR_PATH";

// Default detector sidecar binary name
pub const DETECTOR_BINARY: &str = "pose-detector";

// Display window title
pub const DISPLAY_WINDOW_TITLE: &str = "posetrace";
