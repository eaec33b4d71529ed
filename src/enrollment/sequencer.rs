//! Capture sequencer: takes the ten reference photos of one student.
//!
//! Each step waits the capture delay, plays the shutter cue, encodes the surface
//! and submits the photo. Submission failures are logged and counted but never
//! stop the sequence: completing the quota wins over guaranteeing every upload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::config::PHOTOS_PER_STUDENT;
use super::error::EnrollmentError;
use super::session::{lock_session, CaptureJob, Mode, OfferedAction, Session};
use super::shutter::ShutterCue;
use crate::backend::PhotoBackend;
use crate::render::Surface;

/// How a capture sequence ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// All photos of the student are taken; `next` is the trigger now offered
    Complete {
        student_name: String,
        next: OfferedAction,
    },
    /// Stopped early (shutdown or mode change); can be resumed later
    Interrupted { photos_taken: u8 },
}

/// What happened to one photo on its way to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhotoDelivery {
    Saved,
    Rejected,
    Failed,
    /// Encoding failed; nothing was sent
    NotSent,
}

pub struct CaptureSequencer {
    backend: Arc<dyn PhotoBackend>,
    shutter: Arc<dyn ShutterCue>,
    surface: Surface,
    delay: Duration,
    jpeg_quality: u8,
    cancel: Arc<AtomicBool>,
}

impl CaptureSequencer {
    pub fn new(
        backend: Arc<dyn PhotoBackend>,
        shutter: Arc<dyn ShutterCue>,
        surface: Surface,
        delay: Duration,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            backend,
            shutter,
            surface,
            delay,
            jpeg_quality,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that interrupts a running sequence before its next photo.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Marks the sequence as running in the session (disables the trigger).
    pub fn begin(session: &Mutex<Session>) -> Result<CaptureJob, EnrollmentError> {
        let mut session = lock_session(session);
        let job = session.begin_capture()?;
        crate::log(&format!(
            "Student {}/{}: capturing photos for {} from photo {}",
            session.current_student(),
            session.total_students(),
            job.student_name,
            job.start_index + 1
        ));
        Ok(job)
    }

    /// Begins and runs a full sequence on the calling thread.
    pub fn capture_all(&self, session: &Mutex<Session>) -> Result<CaptureOutcome, EnrollmentError> {
        let job = Self::begin(session)?;
        Ok(self.run(job, session))
    }

    fn should_stop(&self, session: &Mutex<Session>) -> bool {
        self.cancel.load(Ordering::SeqCst) || lock_session(session).mode() != Mode::Collecting
    }

    /// Runs a sequence started with [`CaptureSequencer::begin`].
    pub fn run(&self, job: CaptureJob, session: &Mutex<Session>) -> CaptureOutcome {
        for index in job.start_index..PHOTOS_PER_STUDENT {
            if self.should_stop(session) {
                break;
            }

            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            if self.should_stop(session) {
                break;
            }

            self.shutter.play();
            let delivery = self.submit_photo(&job.student_name, index);

            let mut session = lock_session(session);
            let stats = session.stats_mut();
            match delivery {
                PhotoDelivery::Saved => stats.photos_submitted += 1,
                PhotoDelivery::Rejected => {
                    stats.photos_submitted += 1;
                    stats.photos_rejected += 1;
                }
                PhotoDelivery::Failed => {
                    stats.photos_submitted += 1;
                    stats.photos_failed += 1;
                }
                PhotoDelivery::NotSent => stats.photos_failed += 1,
            }
            let taken = session.record_photo();
            crate::log(&format!(
                "{}: photo {}/{} ({:?})",
                job.student_name, taken, PHOTOS_PER_STUDENT, delivery
            ));
        }

        let mut session = lock_session(session);
        session.finish_capture();

        if session.is_student_complete() {
            let next = session
                .offered_action()
                .unwrap_or(OfferedAction::BeginRecognition);
            crate::log(&format!(
                "Photos for {} complete, next: {:?}",
                job.student_name, next
            ));
            CaptureOutcome::Complete {
                student_name: job.student_name,
                next,
            }
        } else {
            crate::log(&format!(
                "Capture for {} interrupted at {}/{}",
                job.student_name,
                session.photos_taken(),
                PHOTOS_PER_STUDENT
            ));
            CaptureOutcome::Interrupted {
                photos_taken: session.photos_taken(),
            }
        }
    }

    /// Encodes the surface and sends it. Never fails: problems are logged.
    fn submit_photo(&self, student_name: &str, index: u8) -> PhotoDelivery {
        let sample = match self.surface.encode_jpeg(self.jpeg_quality) {
            Ok(sample) => sample,
            Err(e) => {
                crate::log(&format!("Failed to encode photo {}: {}", index + 1, e));
                return PhotoDelivery::NotSent;
            }
        };

        match self.backend.save_photo(&sample, student_name) {
            Ok(response) if response.is_rejected() => {
                crate::log(&format!(
                    "Photo {} rejected by backend: {}",
                    index + 1,
                    response.mensagem.as_deref().unwrap_or("no message")
                ));
                PhotoDelivery::Rejected
            }
            Ok(_) => PhotoDelivery::Saved,
            Err(e) => {
                crate::log(&format!("Failed to save photo {}: {:#}", index + 1, e));
                PhotoDelivery::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::SavePhotoResponse;
    use crate::backend::RecognitionResponse;
    use crate::render::FrameSample;
    use anyhow::{anyhow, Result};
    use image::RgbaImage;
    use std::sync::atomic::AtomicU32;

    /// Records every save call; fails or rejects on request.
    #[derive(Default)]
    struct RecordingBackend {
        names: Mutex<Vec<String>>,
        samples: Mutex<Vec<FrameSample>>,
        fail: bool,
        reject: bool,
    }

    impl PhotoBackend for RecordingBackend {
        fn save_photo(&self, sample: &FrameSample, student_name: &str) -> Result<SavePhotoResponse> {
            self.names.lock().unwrap().push(student_name.to_string());
            self.samples.lock().unwrap().push(sample.clone());
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            let status = if self.reject { "erro" } else { "sucesso" };
            Ok(SavePhotoResponse {
                status: Some(status.to_string()),
                mensagem: None,
            })
        }

        fn recognize(&self, _sample: &FrameSample) -> Result<RecognitionResponse> {
            Err(anyhow!("not used"))
        }
    }

    #[derive(Default)]
    struct CountingShutter {
        plays: AtomicU32,
    }

    impl ShutterCue for CountingShutter {
        fn play(&self) {
            self.plays.fetch_add(1, Ordering::SeqCst);
        }

        fn describe(&self) -> &'static str {
            "counting"
        }
    }

    fn surface() -> Surface {
        let surface = Surface::new(32, 24);
        surface.draw(&RgbaImage::new(32, 24), None);
        surface
    }

    fn session(total: &str, name: &str) -> Mutex<Session> {
        let mut session = Session::new();
        session.start_collecting(total).unwrap();
        session.set_student_name(name);
        Mutex::new(session)
    }

    fn sequencer(backend: Arc<RecordingBackend>, shutter: Arc<CountingShutter>) -> CaptureSequencer {
        CaptureSequencer::new(backend, shutter, surface(), Duration::ZERO, 80)
    }

    #[test]
    fn test_single_student_full_sequence() {
        let backend = Arc::new(RecordingBackend::default());
        let shutter = Arc::new(CountingShutter::default());
        let session = session("1", "Ana Silva");

        let outcome = sequencer(Arc::clone(&backend), Arc::clone(&shutter))
            .capture_all(&session)
            .unwrap();

        assert_eq!(
            outcome,
            CaptureOutcome::Complete {
                student_name: "Ana Silva".to_string(),
                next: OfferedAction::BeginRecognition,
            }
        );
        let names = backend.names.lock().unwrap();
        assert_eq!(names.len(), 10);
        assert!(names.iter().all(|name| name == "Ana Silva"));
        assert_eq!(shutter.plays.load(Ordering::SeqCst), 10);

        let session = session.lock().unwrap();
        assert_eq!(session.photos_taken(), 10);
        assert!(!session.is_capturing());
        assert_eq!(
            session.offered_action(),
            Some(OfferedAction::BeginRecognition)
        );
    }

    #[test]
    fn test_failures_do_not_stop_the_quota() {
        let backend = Arc::new(RecordingBackend {
            fail: true,
            ..Default::default()
        });
        let session = session("2", "Ana");

        let outcome = sequencer(Arc::clone(&backend), Arc::default())
            .capture_all(&session)
            .unwrap();

        assert!(matches!(
            outcome,
            CaptureOutcome::Complete {
                next: OfferedAction::AdvanceStudent,
                ..
            }
        ));
        assert_eq!(backend.names.lock().unwrap().len(), 10);

        let session = session.lock().unwrap();
        assert_eq!(session.photos_taken(), 10);
        assert_eq!(session.stats().photos_failed, 10);
        assert_eq!(
            session.offered_action(),
            Some(OfferedAction::AdvanceStudent)
        );
    }

    #[test]
    fn test_unencodable_surface_sends_nothing() {
        let backend = Arc::new(RecordingBackend::default());
        let session = session("1", "Ana");
        // Wider than a JPEG frame may be
        let surface = Surface::new(70_000, 1);
        let sequencer = CaptureSequencer::new(
            backend.clone(),
            Arc::new(CountingShutter::default()),
            surface,
            Duration::ZERO,
            80,
        );

        sequencer.capture_all(&session).unwrap();

        assert!(backend.names.lock().unwrap().is_empty());
        let session = session.lock().unwrap();
        assert_eq!(session.photos_taken(), 10);
        assert_eq!(session.stats().photos_submitted, 0);
        assert_eq!(session.stats().photos_failed, 10);
    }

    #[test]
    fn test_rejections_are_counted() {
        let backend = Arc::new(RecordingBackend {
            reject: true,
            ..Default::default()
        });
        let session = session("1", "Ana");

        sequencer(backend, Arc::default())
            .capture_all(&session)
            .unwrap();

        let session = session.lock().unwrap();
        assert_eq!(session.stats().photos_rejected, 10);
        assert_eq!(session.stats().photos_failed, 0);
        assert!(session.stats().has_photo_losses());
    }

    #[test]
    fn test_resumes_partial_sequence() {
        let backend = Arc::new(RecordingBackend::default());
        let session = session("1", "Ana");
        {
            let mut session = session.lock().unwrap();
            session.begin_capture().unwrap();
            for _ in 0..4 {
                session.record_photo();
            }
            session.finish_capture();
        }

        sequencer(Arc::clone(&backend), Arc::default())
            .capture_all(&session)
            .unwrap();

        assert_eq!(backend.names.lock().unwrap().len(), 6);
        assert_eq!(session.lock().unwrap().photos_taken(), 10);
    }

    #[test]
    fn test_invalid_name_is_refused() {
        let backend = Arc::new(RecordingBackend::default());
        let session = session("1", "123");

        let result = sequencer(Arc::clone(&backend), Arc::default()).capture_all(&session);

        assert!(matches!(result, Err(EnrollmentError::InvalidName(_))));
        assert!(backend.names.lock().unwrap().is_empty());
        assert!(!session.lock().unwrap().is_capturing());
    }

    #[test]
    fn test_cancel_interrupts_sequence() {
        let backend = Arc::new(RecordingBackend::default());
        let session = session("1", "Ana");
        let sequencer = sequencer(Arc::clone(&backend), Arc::default());

        sequencer.cancel_flag().store(true, Ordering::SeqCst);
        let outcome = sequencer.capture_all(&session).unwrap();

        assert_eq!(outcome, CaptureOutcome::Interrupted { photos_taken: 0 });
        assert!(backend.names.lock().unwrap().is_empty());
        let session = session.lock().unwrap();
        assert!(!session.is_capturing());
        assert!(session.can_capture());
    }

    #[test]
    fn test_submitted_photos_are_jpeg_data_urls() {
        let backend = Arc::new(RecordingBackend::default());
        let session = session("1", "Ana");

        sequencer(Arc::clone(&backend), Arc::default())
            .capture_all(&session)
            .unwrap();

        let samples = backend.samples.lock().unwrap();
        assert!(samples
            .iter()
            .all(|sample| sample.data_url().starts_with("data:image/jpeg;base64,")));
    }
}
