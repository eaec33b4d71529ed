//! Enrollment controller - wires the session to the video source, renderer,
//! capture sequencer and recognition poller.
//!
//! The presentation layer calls into the controller from the UI thread. Capture
//! sequences run on their own thread; rendering and polling run as recurring
//! tasks. Every background task is owned here and stopped on shutdown.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use super::config::EnrollmentConfig;
use super::error::EnrollmentError;
use super::sequencer::{CaptureOutcome, CaptureSequencer};
use super::session::{lock_session, Mode, Session, SharedSession};
use super::shutter::{default_shutter, ShutterCue};
use crate::backend::{HttpBackend, PhotoBackend};
use crate::camera::{open_source, CameraError, StreamHandle, VideoSource};
use crate::recognition::RecognitionPoller;
use crate::render::{render_once, start_renderer, Surface};
use crate::schedule::Recurring;

/// A capture sequence running on its own thread.
struct CaptureWorker {
    handle: JoinHandle<CaptureOutcome>,
    cancel: Arc<AtomicBool>,
}

pub struct Controller {
    config: EnrollmentConfig,
    session: SharedSession,
    surface: Surface,
    source: Box<dyn VideoSource>,
    backend: Arc<dyn PhotoBackend>,
    shutter: Arc<dyn ShutterCue>,
    stream: Option<StreamHandle>,
    renderer: Option<Recurring>,
    poller: Option<Recurring>,
    capture: Option<CaptureWorker>,
    last_outcome: Option<CaptureOutcome>,
}

impl Controller {
    pub fn new(
        config: EnrollmentConfig,
        source: Box<dyn VideoSource>,
        backend: Arc<dyn PhotoBackend>,
        shutter: Arc<dyn ShutterCue>,
    ) -> Self {
        let surface = Surface::new(config.surface_width, config.surface_height)
            .with_burned_caption(config.burn_caption);
        Self {
            config,
            session: Arc::new(Mutex::new(Session::new())),
            surface,
            source,
            backend,
            shutter,
            stream: None,
            renderer: None,
            poller: None,
            capture: None,
            last_outcome: None,
        }
    }

    /// Builds a controller with the HTTP backend and the configured video source.
    pub fn from_config(config: &EnrollmentConfig) -> Result<Self> {
        let backend = HttpBackend::new(&config.backend_url, config.request_timeout())?;
        crate::log(&format!("Backend: {}", backend.base_url()));

        Ok(Self::new(
            config.clone(),
            open_source(&config.video_source),
            Arc::new(backend),
            default_shutter(config.shutter_sound),
        ))
    }

    /// Copy of the current session state.
    pub fn snapshot(&self) -> Session {
        lock_session(&self.session).clone()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn config(&self) -> &EnrollmentConfig {
        &self.config
    }

    /// Idle → Collecting: validates the count, attaches the camera and starts
    /// rendering. The session stays idle if either step fails.
    pub fn start_enrollment(&mut self, count_input: &str) -> Result<(), EnrollmentError> {
        if lock_session(&self.session).mode() != Mode::Idle {
            return Err(EnrollmentError::transition(
                "start enrollment",
                "enrollment already started",
            ));
        }

        let total = Session::parse_count(count_input)?;

        let stream = match self.source.start() {
            Ok(stream) => stream,
            Err(e) => {
                crate::log(&format!(
                    "Failed to start video source ({}): {}",
                    self.source.describe(),
                    e
                ));
                return Err(e.into());
            }
        };

        let renderer = start_renderer(
            stream.frames(),
            self.surface.clone(),
            Arc::clone(&self.session),
            self.config.render_interval(),
        )
        .map_err(|e| EnrollmentError::Worker(e.to_string()))?;

        lock_session(&self.session).enter_collecting(total)?;
        // Draw right away so capture does not wait for the first render tick
        render_once(&stream.frames(), &self.surface, &self.session);

        crate::log(&format!("Enrollment started: {} students", total));
        self.stream = Some(stream);
        self.renderer = Some(renderer);
        Ok(())
    }

    /// Updates the name field.
    pub fn set_student_name(&self, name: &str) {
        lock_session(&self.session).set_student_name(name);
    }

    /// Starts a capture sequence for the current student on a worker thread.
    pub fn start_capture(&mut self) -> Result<(), EnrollmentError> {
        self.poll_capture();
        if self.capture.is_some() {
            return Err(EnrollmentError::transition(
                "capture",
                "a capture sequence is already running",
            ));
        }

        let playing = self.stream.as_ref().is_some_and(StreamHandle::is_playing);
        if !playing || !self.surface.has_frame() {
            return Err(CameraError::NotPlaying.into());
        }

        let sequencer = CaptureSequencer::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.shutter),
            self.surface.clone(),
            self.config.capture_delay(),
            self.config.capture_jpeg_quality,
        );
        let job = CaptureSequencer::begin(&self.session)?;
        let cancel = sequencer.cancel_flag();
        let session = Arc::clone(&self.session);

        let spawned = thread::Builder::new()
            .name("capture-sequence".to_string())
            .spawn(move || sequencer.run(job, &session));

        match spawned {
            Ok(handle) => {
                self.last_outcome = None;
                self.capture = Some(CaptureWorker { handle, cancel });
                Ok(())
            }
            Err(e) => {
                lock_session(&self.session).finish_capture();
                Err(EnrollmentError::Worker(e.to_string()))
            }
        }
    }

    /// Collects a finished capture sequence without blocking.
    pub fn poll_capture(&mut self) -> Option<&CaptureOutcome> {
        if self
            .capture
            .as_ref()
            .is_some_and(|worker| worker.handle.is_finished())
        {
            self.join_capture();
        }
        self.last_outcome.as_ref()
    }

    /// Blocks until the running capture sequence (if any) ends.
    pub fn wait_for_capture(&mut self) -> Option<&CaptureOutcome> {
        self.join_capture();
        self.last_outcome.as_ref()
    }

    fn join_capture(&mut self) {
        if let Some(worker) = self.capture.take() {
            match worker.handle.join() {
                Ok(outcome) => {
                    if let CaptureOutcome::Complete { student_name, next } = &outcome {
                        crate::log(&format!(
                            "Capture complete for {}, offering {:?}",
                            student_name, next
                        ));
                    }
                    self.last_outcome = Some(outcome);
                }
                Err(_) => {
                    crate::log("Capture sequence thread panicked");
                    lock_session(&self.session).finish_capture();
                }
            }
        }
    }

    /// Outcome of the most recent capture sequence of the current student.
    pub fn last_outcome(&self) -> Option<&CaptureOutcome> {
        self.last_outcome.as_ref()
    }

    /// Collecting → Collecting for the next student.
    pub fn advance_student(&mut self) -> Result<(), EnrollmentError> {
        self.poll_capture();
        let mut session = lock_session(&self.session);
        session.advance_student()?;
        crate::log(&format!(
            "Advanced to student {}/{}",
            session.current_student(),
            session.total_students()
        ));
        self.last_outcome = None;
        Ok(())
    }

    /// Collecting → Recognizing and starts the poller.
    pub fn begin_recognition(&mut self) -> Result<(), EnrollmentError> {
        self.poll_capture();
        lock_session(&self.session).begin_recognition()?;
        self.last_outcome = None;

        let poller = RecognitionPoller::new(
            Arc::clone(&self.backend),
            self.surface.clone(),
            self.config.recognition_jpeg_quality,
        );
        let task = poller
            .start(Arc::clone(&self.session), self.config.recognition_interval())
            .map_err(|e| EnrollmentError::Worker(e.to_string()))?;

        crate::log("Recognition started");
        self.poller = Some(task);
        Ok(())
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(Recurring::is_running)
    }

    /// Cancels the recognition poller (recognition view torn down).
    pub fn stop_recognition(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
            crate::log("Recognition stopped");
        }
    }

    /// Stops every background task. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(worker) = &self.capture {
            worker.cancel.store(true, Ordering::SeqCst);
        }
        self.join_capture();
        self.stop_recognition();

        if let Some(renderer) = self.renderer.take() {
            renderer.stop();
        }
        if let Some(stream) = self.stream.take() {
            stream.stop();
            crate::log("Video source stopped");
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown();
    }
}
