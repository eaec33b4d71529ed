//! Synthetic video source producing a moving gradient.
//!
//! Used when no capture hardware is configured, and by tests.

use image::{Rgba, RgbaImage};

use super::source::{CameraError, FrameSlot, StreamHandle, VideoSource};
use crate::schedule::Recurring;

const PATTERN_WIDTH: u32 = 320;
const PATTERN_HEIGHT: u32 = 240;

/// Generates a gradient whose blue channel cycles over time.
pub struct TestPatternSource {
    fps: u32,
}

impl TestPatternSource {
    pub fn new(fps: u32) -> Self {
        Self { fps }
    }
}

/// Renders frame number `tick` of the pattern.
pub fn pattern_frame(tick: u64) -> RgbaImage {
    let blue = ((tick * 4) % 256) as u8;
    RgbaImage::from_fn(PATTERN_WIDTH, PATTERN_HEIGHT, |x, y| {
        let r = (x * 255 / PATTERN_WIDTH) as u8;
        let g = (y * 255 / PATTERN_HEIGHT) as u8;
        Rgba([r, g, blue, 255])
    })
}

impl VideoSource for TestPatternSource {
    fn start(&mut self) -> Result<StreamHandle, CameraError> {
        let slot = FrameSlot::new();
        // First frame is available immediately so capture can start right away
        slot.publish(pattern_frame(0));

        let feed = slot.clone();
        let mut tick: u64 = 0;
        let playback = Recurring::spawn("video-pattern", super::frame_interval(self.fps), move || {
            tick = tick.wrapping_add(1);
            feed.publish(pattern_frame(tick));
        })
        .map_err(|e| CameraError::NoDevice(e.to_string()))?;

        crate::log(&format!("Video source started: {}", self.describe()));
        Ok(StreamHandle::new(slot, Some(playback.into())))
    }

    fn describe(&self) -> String {
        format!("test pattern @ {} fps", self.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_frame_changes_over_time() {
        let first = pattern_frame(0);
        let later = pattern_frame(10);
        assert_eq!(first.dimensions(), (PATTERN_WIDTH, PATTERN_HEIGHT));
        assert_ne!(first.get_pixel(0, 0), later.get_pixel(0, 0));
    }

    #[test]
    fn test_start_is_playing_immediately() {
        let mut source = TestPatternSource::new(30);
        let handle = source.start().unwrap();
        assert!(handle.is_playing());
        assert!(handle.frames().latest().is_some());
        handle.stop();
    }
}
