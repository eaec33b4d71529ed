//! Video source contract shared by all frame producers.

use image::RgbaImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use thiserror::Error;

use crate::schedule::Recurring;

/// Reasons a video source cannot deliver frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The operating system refused access to the device
    #[error("camera access denied: {0}")]
    PermissionDenied(String),
    /// No device (or no frames) available
    #[error("no camera available: {0}")]
    NoDevice(String),
    /// The stream is attached but has not produced a frame yet
    #[error("camera stream is not playing yet")]
    NotPlaying,
}

impl CameraError {
    /// Message shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            CameraError::PermissionDenied(_) | CameraError::NoDevice(_) => {
                "Erro ao acessar a câmera. Verifique as permissões.".to_string()
            }
            CameraError::NotPlaying => "A câmera ainda não está transmitindo.".to_string(),
        }
    }
}

/// Most recent frame produced by a video source.
///
/// Cloning shares the same slot: the playback task writes, the renderer reads.
#[derive(Clone, Default)]
pub struct FrameSlot {
    frame: Arc<Mutex<Option<RgbaImage>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current frame.
    pub fn publish(&self, frame: RgbaImage) {
        let mut slot = self.frame.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(frame);
    }

    /// Returns a copy of the current frame, if any has been published.
    pub fn latest(&self) -> Option<RgbaImage> {
        self.frame
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Returns true once at least one frame has been published.
    pub fn has_frame(&self) -> bool {
        self.frame
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}

/// Dedicated thread that owns a capture device and feeds a `FrameSlot`.
///
/// Used for devices that must stay on the thread that opened them. Dropping the
/// worker raises its stop flag and joins it.
pub struct FeedWorker {
    name: String,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FeedWorker {
    /// Wraps a running thread that polls `stop` between frames.
    pub fn new(name: &str, stop: Arc<AtomicBool>, handle: JoinHandle<()>) -> Self {
        Self {
            name: name.to_string(),
            stop,
            handle: Some(handle),
        }
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                crate::log(&format!("{} thread panicked", self.name));
            }
        }
    }
}

impl Drop for FeedWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The task keeping a stream's slot fed.
pub enum Playback {
    /// Frame produced on a fixed tick
    Periodic(Recurring),
    /// Device read in a blocking loop on its own thread
    Worker(FeedWorker),
}

impl From<Recurring> for Playback {
    fn from(task: Recurring) -> Self {
        Playback::Periodic(task)
    }
}

impl From<FeedWorker> for Playback {
    fn from(worker: FeedWorker) -> Self {
        Playback::Worker(worker)
    }
}

/// An attached, playing stream. Dropping it stops playback.
pub struct StreamHandle {
    slot: FrameSlot,
    playback: Option<Playback>,
}

impl StreamHandle {
    /// Wraps a slot and the task that keeps it fed.
    pub fn new(slot: FrameSlot, playback: Option<Playback>) -> Self {
        Self { slot, playback }
    }

    /// Returns the shared frame slot fed by this stream.
    pub fn frames(&self) -> FrameSlot {
        self.slot.clone()
    }

    /// Returns true once the stream has delivered a frame.
    pub fn is_playing(&self) -> bool {
        self.slot.has_frame()
    }

    /// Stops playback. The last frame stays in the slot.
    pub fn stop(mut self) {
        match self.playback.take() {
            Some(Playback::Periodic(task)) => task.stop(),
            Some(Playback::Worker(worker)) => drop(worker),
            None => {}
        }
    }
}

/// A producer of live frames.
pub trait VideoSource: Send {
    /// Acquires the device and starts playback.
    ///
    /// No retry happens here; callers may call `start` again after a failure.
    fn start(&mut self) -> Result<StreamHandle, CameraError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}
