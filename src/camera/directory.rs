//! Video source that replays still images from a directory.
//!
//! Frames are loaded once at start and cycled in file-name order, which lets
//! the kiosk run against a recorded feed instead of capture hardware.

use image::RgbaImage;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::source::{CameraError, FrameSlot, StreamHandle, VideoSource};
use crate::schedule::Recurring;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Replays the images found in a directory as a looping stream.
pub struct DirectorySource {
    dir: PathBuf,
    fps: u32,
}

impl DirectorySource {
    pub fn new(dir: PathBuf, fps: u32) -> Self {
        Self { dir, fps }
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Loads every readable image in `dir`, sorted by file name.
///
/// Files that fail to decode are skipped with a log line.
pub fn load_frames(dir: &Path) -> Result<Vec<RgbaImage>, CameraError> {
    let entries = fs::read_dir(dir).map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => {
            CameraError::PermissionDenied(format!("{}: {}", dir.display(), e))
        }
        _ => CameraError::NoDevice(format!("{}: {}", dir.display(), e)),
    })?;

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_frame_file(path))
        .collect();
    paths.sort();

    let mut frames = Vec::with_capacity(paths.len());
    for path in &paths {
        match image::open(path) {
            Ok(img) => frames.push(img.to_rgba8()),
            Err(e) => crate::log(&format!("Skipping frame {}: {}", path.display(), e)),
        }
    }

    if frames.is_empty() {
        return Err(CameraError::NoDevice(format!(
            "no frames found in {}",
            dir.display()
        )));
    }

    Ok(frames)
}

impl VideoSource for DirectorySource {
    fn start(&mut self) -> Result<StreamHandle, CameraError> {
        let frames = load_frames(&self.dir)?;
        let frame_count = frames.len();

        let slot = FrameSlot::new();
        slot.publish(frames[0].clone());

        let feed = slot.clone();
        let mut index = 0usize;
        let playback =
            Recurring::spawn("video-directory", super::frame_interval(self.fps), move || {
                index = (index + 1) % frames.len();
                feed.publish(frames[index].clone());
            })
            .map_err(|e| CameraError::NoDevice(e.to_string()))?;

        crate::log(&format!(
            "Video source started: {} ({} frames)",
            self.describe(),
            frame_count
        ));
        Ok(StreamHandle::new(slot, Some(playback.into())))
    }

    fn describe(&self) -> String {
        format!("directory {} @ {} fps", self.dir.display(), self.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    fn write_frame(dir: &Path, name: &str, shade: u8) {
        let img = RgbaImage::from_pixel(8, 6, Rgba([shade, shade, shade, 255]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_missing_directory_is_no_device() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        let mut source = DirectorySource::new(missing, 10);
        match source.start() {
            Err(CameraError::NoDevice(_)) => {}
            other => panic!("expected NoDevice, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_directory_is_no_device() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let result = load_frames(dir.path());
        assert!(matches!(result, Err(CameraError::NoDevice(_))));
    }

    #[test]
    fn test_frames_load_in_name_order() {
        let dir = tempdir().unwrap();
        write_frame(dir.path(), "b.png", 200);
        write_frame(dir.path(), "a.png", 10);

        let frames = load_frames(dir.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].get_pixel(0, 0)[0], 10);
        assert_eq!(frames[1].get_pixel(0, 0)[0], 200);
    }

    #[test]
    fn test_start_publishes_first_frame() {
        let dir = tempdir().unwrap();
        write_frame(dir.path(), "001.png", 42);

        let mut source = DirectorySource::new(dir.path().to_path_buf(), 30);
        let handle = source.start().unwrap();

        assert!(handle.is_playing());
        let frame = handle.frames().latest().unwrap();
        assert_eq!(frame.dimensions(), (8, 6));
        handle.stop();
    }
}
