//! Live video sources for the enrollment kiosk.
//!
//! This module provides:
//! - The `VideoSource` trait and the `StreamHandle` it returns
//! - The live camera source (`CameraSource`)
//! - A synthetic test pattern source (`TestPatternSource`)
//! - A directory replay source (`DirectorySource`)
//! - `open_source` to build the configured source

pub mod device;
pub mod directory;
pub mod pattern;
pub mod source;

pub use device::CameraSource;
pub use directory::DirectorySource;
pub use pattern::TestPatternSource;
pub use source::{CameraError, FrameSlot, StreamHandle, VideoSource};

use crate::enrollment::config::VideoSourceConfig;

/// Builds the video source selected in the configuration.
pub fn open_source(config: &VideoSourceConfig) -> Box<dyn VideoSource> {
    match config {
        VideoSourceConfig::Camera {
            index,
            width,
            height,
            fps,
        } => Box::new(CameraSource::new(*index, *width, *height, *fps)),
        VideoSourceConfig::TestPattern { fps } => Box::new(TestPatternSource::new(*fps)),
        VideoSourceConfig::Directory { path, fps } => {
            let dir = path.clone().unwrap_or_else(crate::paths::get_frames_dir);
            Box::new(DirectorySource::new(dir, *fps))
        }
    }
}

/// Converts a frames-per-second value into a playback interval.
pub(crate) fn frame_interval(fps: u32) -> std::time::Duration {
    std::time::Duration::from_millis(1000 / u64::from(fps.clamp(1, 120)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_source_follows_config() {
        let camera = open_source(&VideoSourceConfig::default());
        assert!(camera.describe().starts_with("camera #0"));

        let pattern = open_source(&VideoSourceConfig::TestPattern { fps: 12 });
        assert_eq!(pattern.describe(), "test pattern @ 12 fps");
    }

    #[test]
    fn test_frame_interval_clamps() {
        assert_eq!(frame_interval(0).as_millis(), 1000);
        assert_eq!(frame_interval(25).as_millis(), 40);
        assert_eq!(frame_interval(1000).as_millis(), 8);
    }
}
