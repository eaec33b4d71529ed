//! Live camera source backed by the platform capture API.
//!
//! The device handle is not `Send`, so the camera is opened, read and closed on
//! one dedicated thread. `start` waits for that thread to report whether the
//! device opened before returning.

use super::source::{CameraError, StreamHandle, VideoSource};

/// Opens camera `index` and publishes its frames until stopped.
pub struct CameraSource {
    index: u32,
    width: u32,
    height: u32,
    fps: u32,
}

impl CameraSource {
    pub fn new(index: u32, width: u32, height: u32, fps: u32) -> Self {
        Self {
            index,
            width,
            height,
            fps,
        }
    }
}

/// Maps a device open error to the operator-facing camera error.
#[cfg(any(feature = "camera", test))]
pub fn classify_open_error(message: String) -> CameraError {
    const PERMISSION_HINTS: [&str; 4] = ["permission", "denied", "not authorized", "unauthorized"];

    let lower = message.to_lowercase();
    if PERMISSION_HINTS.iter().any(|hint| lower.contains(hint)) {
        CameraError::PermissionDenied(message)
    } else {
        CameraError::NoDevice(message)
    }
}

#[cfg(feature = "camera")]
mod native {
    use image::{DynamicImage, RgbImage};
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{
        ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
        Resolution,
    };
    use nokhwa::Camera;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::sync_channel;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::super::source::{CameraError, FeedWorker, FrameSlot, StreamHandle};
    use super::{classify_open_error, CameraSource};

    const RETRY_DELAY: Duration = Duration::from_millis(100);
    /// Consecutive read failures between two log lines
    const FAILURE_LOG_EVERY: u32 = 50;

    /// Lists the capture devices the platform reports.
    pub fn list_devices() -> Result<Vec<String>, CameraError> {
        let devices =
            nokhwa::query(ApiBackend::Auto).map_err(|e| classify_open_error(e.to_string()))?;

        Ok(devices
            .into_iter()
            .map(|info| format!("{}: {}", info.index(), info.human_name()))
            .collect())
    }

    fn open_camera(source: &CameraSource) -> Result<Camera, CameraError> {
        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(source.width, source.height),
                FrameFormat::MJPEG,
                source.fps,
            ),
        ));

        let mut camera = Camera::new(CameraIndex::Index(source.index), format)
            .map_err(|e| classify_open_error(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| classify_open_error(e.to_string()))?;

        let resolution = camera.resolution();
        crate::log(&format!(
            "Camera {} opened: {}x{} @ {} fps",
            source.index,
            resolution.width(),
            resolution.height(),
            camera.frame_rate()
        ));
        Ok(camera)
    }

    fn read_loop(camera: &mut Camera, feed: &FrameSlot, stop: &AtomicBool) {
        let mut failures: u32 = 0;

        while !stop.load(Ordering::SeqCst) {
            let decoded = camera
                .frame()
                .and_then(|buffer| buffer.decode_image::<RgbFormat>());

            match decoded {
                Ok(decoded) => {
                    failures = 0;
                    let (width, height) = (decoded.width(), decoded.height());
                    match RgbImage::from_raw(width, height, decoded.into_raw()) {
                        Some(rgb) => feed.publish(DynamicImage::ImageRgb8(rgb).to_rgba8()),
                        None => crate::log("Camera frame has an unexpected buffer size"),
                    }
                }
                Err(e) => {
                    if failures % FAILURE_LOG_EVERY == 0 {
                        crate::log(&format!("Camera read failed: {}", e));
                    }
                    failures = failures.wrapping_add(1);
                    thread::sleep(RETRY_DELAY);
                }
            }
        }

        if let Err(e) = camera.stop_stream() {
            crate::log(&format!("Failed to close camera stream: {}", e));
        }
    }

    pub fn start(source: &CameraSource) -> Result<StreamHandle, CameraError> {
        let slot = FrameSlot::new();
        let feed = slot.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let (ready_sender, ready_receiver) = sync_channel::<Result<(), CameraError>>(1);
        let request = CameraSource::new(source.index, source.width, source.height, source.fps);

        let handle = thread::Builder::new()
            .name("video-camera".to_string())
            .spawn(move || {
                let mut camera = match open_camera(&request) {
                    Ok(camera) => {
                        let _ = ready_sender.send(Ok(()));
                        camera
                    }
                    Err(e) => {
                        let _ = ready_sender.send(Err(e));
                        return;
                    }
                };
                read_loop(&mut camera, &feed, &worker_stop);
            })
            .map_err(|e| CameraError::NoDevice(e.to_string()))?;

        let opened = ready_receiver.recv().unwrap_or_else(|_| {
            Err(CameraError::NoDevice(
                "camera thread exited before opening the device".to_string(),
            ))
        });
        if let Err(e) = opened {
            let _ = handle.join();
            match list_devices() {
                Ok(devices) => crate::log(&format!("Available cameras: {:?}", devices)),
                Err(query_error) => crate::log(&format!("Camera query failed: {}", query_error)),
            }
            return Err(e);
        }

        let worker = FeedWorker::new("video-camera", stop, handle);
        Ok(StreamHandle::new(slot, Some(worker.into())))
    }
}

impl VideoSource for CameraSource {
    #[cfg(feature = "camera")]
    fn start(&mut self) -> Result<StreamHandle, CameraError> {
        let stream = native::start(self)?;
        crate::log(&format!("Video source started: {}", self.describe()));
        Ok(stream)
    }

    #[cfg(not(feature = "camera"))]
    fn start(&mut self) -> Result<StreamHandle, CameraError> {
        Err(CameraError::NoDevice(
            "built without the camera feature".to_string(),
        ))
    }

    fn describe(&self) -> String {
        format!(
            "camera #{} ({}x{} @ {} fps)",
            self.index, self.width, self.height, self.fps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_errors_are_classified() {
        let denied = classify_open_error("Could not open device: Permission denied (os error 13)".into());
        assert!(matches!(denied, CameraError::PermissionDenied(_)));

        let macos = classify_open_error("Camera access not authorized".into());
        assert!(matches!(macos, CameraError::PermissionDenied(_)));
    }

    #[test]
    fn test_other_open_errors_mean_no_device() {
        let missing = classify_open_error("Could not find device at index 3".into());
        assert_eq!(
            missing,
            CameraError::NoDevice("Could not find device at index 3".to_string())
        );
    }

    #[test]
    fn test_describe_names_device() {
        let source = CameraSource::new(1, 640, 480, 30);
        assert_eq!(source.describe(), "camera #1 (640x480 @ 30 fps)");
    }
}
