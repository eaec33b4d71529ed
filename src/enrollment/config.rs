//! Configuration types for enrollment and recognition.
//!
//! Loads settings from config.json at startup. Provides the backend address,
//! capture pacing, JPEG qualities and the video source selection.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<EnrollmentConfig> = OnceLock::new();

/// Number of reference photos captured per student.
pub const PHOTOS_PER_STUDENT: u8 = 10;

fn default_fps() -> u32 {
    30
}

fn default_camera_width() -> u32 {
    640
}

fn default_camera_height() -> u32 {
    480
}

/// Which frame producer feeds the surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VideoSourceConfig {
    /// Physical capture device, by platform index
    Camera {
        #[serde(default)]
        index: u32,
        #[serde(default = "default_camera_width")]
        width: u32,
        #[serde(default = "default_camera_height")]
        height: u32,
        #[serde(default = "default_fps")]
        fps: u32,
    },
    /// Synthetic moving gradient
    TestPattern {
        #[serde(default = "default_fps")]
        fps: u32,
    },
    /// Replays the images in `path` (defaults to `<exe_dir>/resources/frames`)
    Directory {
        #[serde(default)]
        path: Option<PathBuf>,
        #[serde(default = "default_fps")]
        fps: u32,
    },
}

impl Default for VideoSourceConfig {
    fn default() -> Self {
        VideoSourceConfig::Camera {
            index: 0,
            width: default_camera_width(),
            height: default_camera_height(),
            fps: default_fps(),
        }
    }
}

/// Complete kiosk configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrollmentConfig {
    /// Base URL of the photo storage / recognition backend
    pub backend_url: String,
    /// Timeout for each backend request (milliseconds)
    pub request_timeout_ms: u64,
    /// Pause before each of the ten captures (milliseconds)
    pub capture_delay_ms: u64,
    /// JPEG quality for enrollment photos (1-100)
    pub capture_jpeg_quality: u8,
    /// JPEG quality for recognition frames (1-100)
    pub recognition_jpeg_quality: u8,
    /// Time between recognition requests (milliseconds)
    pub recognition_interval_ms: u64,
    /// Time between surface redraws (milliseconds)
    pub render_interval_ms: u64,
    /// Surface width in pixels
    pub surface_width: u32,
    /// Surface height in pixels
    pub surface_height: u32,
    /// Frame producer
    pub video_source: VideoSourceConfig,
    /// Draw the student name into the submitted photos, not only on screen
    pub burn_caption: bool,
    /// Play a click on each capture (needs the `shutter-sound` feature, on by default)
    pub shutter_sound: bool,
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_ms: 10_000,
            capture_delay_ms: 500,
            capture_jpeg_quality: 80,
            recognition_jpeg_quality: 50,
            recognition_interval_ms: 3000,
            render_interval_ms: 33,
            surface_width: 640,
            surface_height: 480,
            video_source: VideoSourceConfig::default(),
            burn_caption: true,
            shutter_sound: true,
        }
    }
}

impl EnrollmentConfig {
    pub fn capture_delay(&self) -> Duration {
        Duration::from_millis(self.capture_delay_ms)
    }

    pub fn recognition_interval(&self) -> Duration {
        Duration::from_millis(self.recognition_interval_ms.max(1))
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Loads configuration from `path`, falling back to defaults when the file is
/// missing or cannot be parsed.
pub fn load_config_from(config_path: &Path) -> EnrollmentConfig {
    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    EnrollmentConfig::default()
}

/// Initializes the global configuration from `<exe_dir>/config.json`.
/// Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config_from(&crate::paths::get_config_path()));
}

/// Returns the global configuration, or defaults if `init_config` was never called.
pub fn get_config() -> &'static EnrollmentConfig {
    CONFIG.get_or_init(EnrollmentConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json"));
        assert_eq!(config, EnrollmentConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "backend_url": "http://kiosk:8080", "recognition_interval_ms": 2000 }"#,
        )
        .unwrap();

        let config = load_config_from(&path);
        assert_eq!(config.backend_url, "http://kiosk:8080");
        assert_eq!(config.recognition_interval(), Duration::from_secs(2));
        assert_eq!(config.capture_delay_ms, 500);
        assert_eq!(config.capture_jpeg_quality, 80);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_config_from(&path), EnrollmentConfig::default());
    }

    #[test]
    fn test_camera_source_selects_device_index() {
        let camera: VideoSourceConfig =
            serde_json::from_str(r#"{ "kind": "camera", "index": 2 }"#).unwrap();
        assert_eq!(
            camera,
            VideoSourceConfig::Camera {
                index: 2,
                width: 640,
                height: 480,
                fps: 30
            }
        );
    }

    #[test]
    fn test_video_source_variants() {
        let pattern: VideoSourceConfig =
            serde_json::from_str(r#"{ "kind": "test_pattern" }"#).unwrap();
        assert_eq!(pattern, VideoSourceConfig::TestPattern { fps: 30 });

        let directory: VideoSourceConfig =
            serde_json::from_str(r#"{ "kind": "directory", "path": "/tmp/frames", "fps": 5 }"#)
                .unwrap();
        assert_eq!(
            directory,
            VideoSourceConfig::Directory {
                path: Some(PathBuf::from("/tmp/frames")),
                fps: 5
            }
        );
    }

    #[test]
    fn test_default_config_file_parses() {
        let contents = include_str!("../../config.json");
        let config: EnrollmentConfig = serde_json::from_str(contents).unwrap();
        assert_eq!(config.recognition_jpeg_quality, 50);
        assert_eq!(config.video_source, VideoSourceConfig::default());
        assert!(config.burn_caption);
        assert!(config.shutter_sound);
    }
}
