// External tool resolver for ffmpeg/ffprobe/ffplay and the pose detector
//
// Posetrace policy: external tools may be bundled next to the executable.
// Resolution order:
// 1) Environment variable override (POSETRACE_FFMPEG_PATH, etc.)
// 2) Sidecar next to the executable
// 3) bin/ subdirectory next to the executable
// 4) PATH fallback (dev-only convenience)

use std::env;
use std::path::PathBuf;
use std::process::Command;

use regex::Regex;

use crate::constants::{
    DETECTOR_BINARY, ENV_DETECTOR_PATH, ENV_FFMPEG_PATH, ENV_FFPLAY_PATH, ENV_FFPROBE_PATH,
};

/// Get the directory containing the current executable
fn exe_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
}

/// Resolve a bundled sidecar tool path.
fn resolve_tool(env_key: &str, default_name: &str) -> PathBuf {
    // 1) Check environment variable override
    if let Ok(v) = env::var(env_key) {
        let p = PathBuf::from(&v);
        if p.exists() {
            return p;
        }
    }

    // Add .exe on Windows
    let mut filename = default_name.to_string();
    if cfg!(windows) && !filename.to_lowercase().ends_with(".exe") {
        filename.push_str(".exe");
    }

    // 2) Check sidecar next to executable
    if let Some(dir) = exe_dir() {
        let candidate = dir.join(&filename);
        if candidate.exists() {
            return candidate;
        }

        // 3) Also check bin/ subdirectory (common bundling pattern)
        let bin_candidate = dir.join("bin").join(&filename);
        if bin_candidate.exists() {
            return bin_candidate;
        }
    }

    // 4) Fall back to PATH (dev-only convenience)
    PathBuf::from(default_name)
}

/// Get path to ffmpeg binary
pub fn ffmpeg_path() -> PathBuf {
    resolve_tool(ENV_FFMPEG_PATH, "ffmpeg")
}

/// Get path to ffprobe binary
pub fn ffprobe_path() -> PathBuf {
    resolve_tool(ENV_FFPROBE_PATH, "ffprobe")
}

/// Get path to ffplay binary
pub fn ffplay_path() -> PathBuf {
    resolve_tool(ENV_FFPLAY_PATH, "ffplay")
}

/// Get path to the external pose detector binary
pub fn detector_path() -> PathBuf {
    resolve_tool(ENV_DETECTOR_PATH, DETECTOR_BINARY)
}

/// Check if a tool is available at the resolved path
pub fn is_tool_available(tool: &str) -> bool {
    let path = match tool {
        "ffmpeg" => ffmpeg_path(),
        "ffprobe" => ffprobe_path(),
        "ffplay" => ffplay_path(),
        "pose-detector" => detector_path(),
        _ => return false,
    };

    // If path exists as a file, it's available
    if path.exists() {
        return true;
    }

    // Otherwise try running it (for PATH fallback)
    Command::new(&path)
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Availability/version report for one external tool
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: &'static str,
    pub path: PathBuf,
    pub available: bool,
    pub version: Option<String>,
}

/// Probe every external tool for the `doctor` report
pub fn check_tools() -> Vec<ToolStatus> {
    [
        ("ffmpeg", ffmpeg_path()),
        ("ffprobe", ffprobe_path()),
        ("ffplay", ffplay_path()),
        ("pose-detector", detector_path()),
    ]
    .into_iter()
    .map(|(name, path)| {
        let version = tool_version(&path);
        ToolStatus {
            name,
            available: version.is_some() || path.exists(),
            path,
            version,
        }
    })
    .collect()
}

/// Run `<tool> -version` and pull the version token out of the first line
fn tool_version(path: &PathBuf) -> Option<String> {
    let output = Command::new(path).arg("-version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    parse_version_line(&text)
}

/// Parse "ffmpeg version 6.1.1 ..." style banners
fn parse_version_line(text: &str) -> Option<String> {
    let re = Regex::new(r"version\s+(\S+)").ok()?;
    re.captures(text.lines().next()?)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_tool_fallback() {
        // Without env var set, should return the default name for PATH lookup
        let path = resolve_tool("POSETRACE_TEST_NONEXISTENT", "testcmd");
        assert_eq!(path, PathBuf::from("testcmd"));
    }

    #[test]
    fn test_env_override() {
        // Set a temp env var pointing to an existing file
        let temp_dir = std::env::temp_dir();
        let temp_file = temp_dir.join("posetrace_test_tool");
        std::fs::write(&temp_file, "test").ok();

        std::env::set_var("POSETRACE_TEST_TOOL", temp_file.to_str().unwrap());
        let path = resolve_tool("POSETRACE_TEST_TOOL", "default");
        assert_eq!(path, temp_file);

        // Cleanup
        std::env::remove_var("POSETRACE_TEST_TOOL");
        std::fs::remove_file(&temp_file).ok();
    }

    #[test]
    fn test_parse_version_line() {
        let banner = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023\nbuilt with gcc";
        assert_eq!(parse_version_line(banner), Some("6.1.1-3ubuntu5".to_string()));
        assert_eq!(parse_version_line("no version here"), None);
    }
}
