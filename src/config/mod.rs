// Settings resolution: built-in defaults, overlaid by a named JSON profile,
// overlaid by explicit overrides. The result is one immutable snapshot that
// every pipeline component reads by reference; nothing here is global or
// mutated after resolution.
//
// Profile problems never abort a run: a missing or malformed profile logs a
// warning and resolution falls back to the next-lower precedence level.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::constants;

/// Detector model variant (capability-defined sizes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
    Lite,
    Full,
    Heavy,
}

impl ModelVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Lite => "lite",
            ModelVariant::Full => "full",
            ModelVariant::Heavy => "heavy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lite" => Some(ModelVariant::Lite),
            "full" => Some(ModelVariant::Full),
            "heavy" => Some(ModelVariant::Heavy),
            _ => None,
        }
    }
}

/// Which person to keep when the capability reports more than one.
/// The capability's own contract does not define an ordering, so this is a
/// policy choice rather than an assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectPolicy {
    /// Keep the first person in report order
    First,
    /// Keep the person with the highest mean joint visibility
    BestPresence,
}

impl SubjectPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectPolicy::First => "first",
            SubjectPolicy::BestPresence => "best_presence",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "first" => Some(SubjectPolicy::First),
            "best_presence" => Some(SubjectPolicy::BestPresence),
            _ => None,
        }
    }
}

/// Immutable settings snapshot for one pipeline run
#[derive(Debug, Clone)]
pub struct Settings {
    pub raw_data_dir: PathBuf,
    pub processed_data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub profiles_dir: PathBuf,

    pub input_video_filename: String,
    pub input_video_path: PathBuf,

    pub model_variant: ModelVariant,
    pub min_detection_confidence: f64,
    pub min_presence_confidence: f64,
    pub min_tracking_confidence: f64,
    pub subject_policy: SubjectPolicy,
    /// Explicit detector binary override; tools.rs resolution applies when None
    pub detector_command: Option<PathBuf>,

    pub display_results: bool,

    pub save_coordinates: bool,
    pub coords_filename: String,
    pub coords_path: PathBuf,

    pub save_video: bool,
    pub video_filename: String,
    pub video_path: PathBuf,
    pub video_fourcc: String,

    /// Unknown profile/override keys, kept verbatim (forward-compatible)
    pub extra: BTreeMap<String, Value>,
}

/// Resolve settings for a run rooted at `base_dir`.
/// Precedence, lowest to highest: built-in defaults, then the named profile
/// file `<base_dir>/config/profiles/<name>.json` (if present and valid),
/// then `overrides`.
pub fn resolve(base_dir: &Path, profile_name: &str, overrides: Map<String, Value>) -> Settings {
    let mut merged = defaults_map();

    let profiles_dir = base_dir.join(constants::PROFILES_DIR);
    if let Some(profile) = load_profile(&profiles_dir, profile_name) {
        overlay(&mut merged, profile);
    }
    overlay(&mut merged, overrides);

    finalize(base_dir, profiles_dir, merged)
}

/// Built-in defaults as an overlay map
fn defaults_map() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("raw_data_dir".into(), constants::RAW_DATA_DIR.into());
    map.insert(
        "processed_data_dir".into(),
        constants::PROCESSED_DATA_DIR.into(),
    );
    map.insert("output_dir".into(), constants::OUTPUT_DIR.into());
    map.insert(
        "input_video_filename".into(),
        constants::DEFAULT_INPUT_VIDEO.into(),
    );
    map.insert(
        "model_variant".into(),
        constants::DEFAULT_MODEL_VARIANT.into(),
    );
    map.insert(
        "min_detection_confidence".into(),
        constants::DEFAULT_MIN_DETECTION_CONFIDENCE.into(),
    );
    map.insert(
        "min_presence_confidence".into(),
        constants::DEFAULT_MIN_PRESENCE_CONFIDENCE.into(),
    );
    map.insert(
        "min_tracking_confidence".into(),
        constants::DEFAULT_MIN_TRACKING_CONFIDENCE.into(),
    );
    map.insert("subject_policy".into(), "first".into());
    map.insert("display_results".into(), true.into());
    map.insert("save_coordinates".into(), true.into());
    map.insert(
        "coords_filename".into(),
        constants::DEFAULT_COORDS_FILENAME.into(),
    );
    map.insert("save_video".into(), false.into());
    map.insert(
        "video_filename".into(),
        constants::DEFAULT_VIDEO_FILENAME.into(),
    );
    map.insert("video_fourcc".into(), constants::DEFAULT_VIDEO_FOURCC.into());
    map
}

/// Load a named profile. Missing or invalid profiles degrade to the
/// lower-precedence values with a warning; they never fail the run.
fn load_profile(profiles_dir: &Path, name: &str) -> Option<Map<String, Value>> {
    let path = profiles_dir.join(format!("{}.json", name));
    if !path.exists() {
        log::warn!(
            "Configuration profile '{}' not found at {}; using defaults",
            name,
            path.display()
        );
        return None;
    }

    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("Cannot read profile '{}': {}; using defaults", name, e);
            return None;
        }
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            log::warn!(
                "Profile '{}' is not a JSON object; using defaults",
                name
            );
            None
        }
        Err(e) => {
            log::warn!("Profile '{}' is malformed: {}; using defaults", name, e);
            None
        }
    }
}

/// Apply a higher-precedence overlay onto `base`
fn overlay(base: &mut Map<String, Value>, layer: Map<String, Value>) {
    for (key, value) in layer {
        base.insert(key, value);
    }
}

/// Interpret the merged map into the typed snapshot.
/// Directory keys are interpreted first; filename keys then recompute their
/// artifact's full path as (directory + filename). An explicit `*_path` key
/// wins over the recomputation. Keys this build does not know are kept
/// verbatim in `extra`.
fn finalize(base_dir: &Path, profiles_dir: PathBuf, mut map: Map<String, Value>) -> Settings {
    let raw_data_dir = take_dir(&mut map, "raw_data_dir", base_dir, constants::RAW_DATA_DIR);
    let processed_data_dir = take_dir(
        &mut map,
        "processed_data_dir",
        base_dir,
        constants::PROCESSED_DATA_DIR,
    );
    let output_dir = take_dir(&mut map, "output_dir", base_dir, constants::OUTPUT_DIR);

    let input_video_filename = take_string(&mut map, "input_video_filename");
    let input_video_path = take_path(&mut map, "input_video_path", base_dir)
        .unwrap_or_else(|| raw_data_dir.join(&input_video_filename));

    let coords_filename = take_string(&mut map, "coords_filename");
    let coords_path = take_path(&mut map, "coords_path", base_dir)
        .unwrap_or_else(|| processed_data_dir.join(&coords_filename));

    let video_filename = take_string(&mut map, "video_filename");
    let video_path = take_path(&mut map, "video_path", base_dir)
        .unwrap_or_else(|| output_dir.join(&video_filename));

    let model_variant = {
        let raw = take_string(&mut map, "model_variant");
        ModelVariant::parse(&raw).unwrap_or_else(|| {
            log::warn!(
                "Unknown model variant '{}'; using '{}'",
                raw,
                constants::DEFAULT_MODEL_VARIANT
            );
            ModelVariant::Lite
        })
    };

    let subject_policy = {
        let raw = take_string(&mut map, "subject_policy");
        SubjectPolicy::parse(&raw).unwrap_or_else(|| {
            log::warn!("Unknown subject policy '{}'; using 'first'", raw);
            SubjectPolicy::First
        })
    };

    let detector_command = take_path(&mut map, "detector_command", base_dir);

    let settings = Settings {
        raw_data_dir,
        processed_data_dir,
        output_dir,
        profiles_dir,
        input_video_filename,
        input_video_path,
        model_variant,
        min_detection_confidence: take_f64(&mut map, "min_detection_confidence"),
        min_presence_confidence: take_f64(&mut map, "min_presence_confidence"),
        min_tracking_confidence: take_f64(&mut map, "min_tracking_confidence"),
        subject_policy,
        detector_command,
        display_results: take_bool(&mut map, "display_results"),
        save_coordinates: take_bool(&mut map, "save_coordinates"),
        coords_filename,
        coords_path,
        save_video: take_bool(&mut map, "save_video"),
        video_filename,
        video_path,
        video_fourcc: take_string(&mut map, "video_fourcc"),
        extra: map.into_iter().collect(),
    };

    log::debug!("Resolved settings: {:?}", settings);
    settings
}

// --- typed extraction helpers ---
//
// The merged map always carries a default for every known key, so the
// fallbacks below only fire when an overlay supplied the wrong JSON type;
// those are warned about and the default re-applied by the caller's merge
// order (defaults are the lowest layer and hence already consumed).

fn take_string(map: &mut Map<String, Value>, key: &str) -> String {
    match map.remove(key) {
        Some(Value::String(s)) => s,
        Some(other) => {
            log::warn!("Setting '{}' must be a string, got {}; ignoring", key, other);
            defaults_map()
                .remove(key)
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_default()
        }
        None => String::new(),
    }
}

fn take_bool(map: &mut Map<String, Value>, key: &str) -> bool {
    match map.remove(key) {
        Some(Value::Bool(b)) => b,
        Some(other) => {
            log::warn!("Setting '{}' must be a boolean, got {}; ignoring", key, other);
            defaults_map()
                .remove(key)
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
        }
        None => false,
    }
}

fn take_f64(map: &mut Map<String, Value>, key: &str) -> f64 {
    match map.remove(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(other) => {
            log::warn!("Setting '{}' must be a number, got {}; ignoring", key, other);
            defaults_map()
                .remove(key)
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0)
        }
        None => 0.0,
    }
}

/// Take an optional path value; relative values resolve against `base_dir`
fn take_path(map: &mut Map<String, Value>, key: &str, base_dir: &Path) -> Option<PathBuf> {
    match map.remove(key) {
        Some(Value::String(s)) => {
            let p = PathBuf::from(s);
            Some(if p.is_absolute() { p } else { base_dir.join(p) })
        }
        Some(other) => {
            log::warn!("Setting '{}' must be a path string, got {}; ignoring", key, other);
            None
        }
        None => None,
    }
}

/// Take a directory value, falling back to `default` under `base_dir`
fn take_dir(map: &mut Map<String, Value>, key: &str, base_dir: &Path, default: &str) -> PathBuf {
    take_path(map, key, base_dir).unwrap_or_else(|| base_dir.join(default))
}
