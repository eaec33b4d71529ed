//! Enrollment state machine.
//!
//! The session sequences through: Idle → Collecting (once per student) → Recognizing.
//! All state lives in one `Session`; components receive it explicitly and change
//! it only through the transition methods below.

use std::sync::{Arc, Mutex, MutexGuard};

use super::config::PHOTOS_PER_STUDENT;
use super::error::EnrollmentError;
use super::validation::{parse_student_count, validate_name, ValidationState};

pub const RECOGNITION_NOT_STARTED: &str = "Reconhecimento não iniciado";

/// Session shared between the UI thread and the worker threads.
pub type SharedSession = Arc<Mutex<Session>>;

/// Locks a shared session, recovering the state if a worker panicked while holding it.
pub fn lock_session(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(|e| e.into_inner())
}

/// Workflow modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Waiting for the student count (initial state)
    Idle,
    /// Capturing reference photos for the current student
    Collecting,
    /// Enrollment finished, polling the recognizer
    Recognizing,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Idle => write!(f, "Idle"),
            Mode::Collecting => write!(f, "Collecting"),
            Mode::Recognizing => write!(f, "Recognizing"),
        }
    }
}

impl Mode {
    /// Operator-facing description.
    pub fn description(&self) -> &'static str {
        match self {
            Mode::Idle => "Aguardando",
            Mode::Collecting => "Coletando fotos",
            Mode::Recognizing => "Reconhecendo",
        }
    }
}

/// The trigger currently shown to the operator in `Collecting` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferedAction {
    /// "Tirar foto" (enabled or not per `Session::can_capture`)
    Capture,
    /// "Próximo aluno"
    AdvanceStudent,
    /// "Iniciar reconhecimento"
    BeginRecognition,
}

/// Aggregate counters for backend submissions.
///
/// Individual failures never stop the workflow; these counters let the operator
/// notice silent data loss.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionStats {
    /// Photos sent to the storage endpoint (including rejected ones)
    pub photos_submitted: u32,
    /// Photos answered with a non-success status
    pub photos_rejected: u32,
    /// Photos lost before an answer (encode, transport or decode failure)
    pub photos_failed: u32,
    /// Recognition requests sent
    pub recognition_requests: u32,
    /// Recognition ticks without an answer (encode, transport or decode failure)
    pub recognition_failures: u32,
}

impl SubmissionStats {
    /// Returns true if any photo may be missing on the backend.
    pub fn has_photo_losses(&self) -> bool {
        self.photos_rejected > 0 || self.photos_failed > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "Fotos enviadas: {} (recusadas: {}, falhas: {}) | Reconhecimentos: {} (falhas: {})",
            self.photos_submitted,
            self.photos_rejected,
            self.photos_failed,
            self.recognition_requests,
            self.recognition_failures
        )
    }
}

/// Snapshot handed to the capture sequencer when a sequence starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureJob {
    /// Name submitted with every photo of this sequence
    pub student_name: String,
    /// First photo index to take (resumes a partial sequence)
    pub start_index: u8,
}

/// Enrollment and recognition state.
#[derive(Debug, Clone)]
pub struct Session {
    mode: Mode,
    /// 1-based, 0 while idle
    current_student: u32,
    total_students: u32,
    student_name: String,
    photos_taken: u8,
    capturing: bool,
    recognition_status: String,
    stats: SubmissionStats,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            mode: Mode::Idle,
            current_student: 0,
            total_students: 0,
            student_name: String::new(),
            photos_taken: 0,
            capturing: false,
            recognition_status: RECOGNITION_NOT_STARTED.to_string(),
            stats: SubmissionStats::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn current_student(&self) -> u32 {
        self.current_student
    }

    pub fn total_students(&self) -> u32 {
        self.total_students
    }

    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    pub fn photos_taken(&self) -> u8 {
        self.photos_taken
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn recognition_status(&self) -> &str {
        &self.recognition_status
    }

    pub fn stats(&self) -> &SubmissionStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut SubmissionStats {
        &mut self.stats
    }

    /// Validates the typed student count without changing the session.
    pub fn parse_count(input: &str) -> Result<u32, EnrollmentError> {
        parse_student_count(input)
            .ok_or_else(|| EnrollmentError::InvalidStudentCount(input.to_string()))
    }

    /// Idle → Collecting from operator input. Invalid input leaves the session idle.
    pub fn start_collecting(&mut self, input: &str) -> Result<(), EnrollmentError> {
        let total = Self::parse_count(input)?;
        self.enter_collecting(total)
    }

    /// Idle → Collecting with an already validated count.
    pub fn enter_collecting(&mut self, total_students: u32) -> Result<(), EnrollmentError> {
        if self.mode != Mode::Idle {
            return Err(EnrollmentError::transition(
                "start collecting",
                format!("session is already {}", self.mode),
            ));
        }
        if total_students == 0 {
            return Err(EnrollmentError::InvalidStudentCount("0".to_string()));
        }

        self.total_students = total_students;
        self.current_student = 1;
        self.photos_taken = 0;
        self.capturing = false;
        self.student_name.clear();
        self.mode = Mode::Collecting;
        Ok(())
    }

    /// Replaces the name field content.
    pub fn set_student_name(&mut self, name: &str) {
        self.student_name = name.to_string();
    }

    /// Validation of the current name field.
    pub fn validation(&self) -> ValidationState {
        validate_name(&self.student_name)
    }

    /// Whether the capture trigger is enabled.
    pub fn can_capture(&self) -> bool {
        self.mode == Mode::Collecting
            && !self.capturing
            && self.photos_taken < PHOTOS_PER_STUDENT
            && self.validation().valid
    }

    /// Marks a capture sequence as running and snapshots what it needs.
    pub fn begin_capture(&mut self) -> Result<CaptureJob, EnrollmentError> {
        if self.mode != Mode::Collecting {
            return Err(EnrollmentError::transition(
                "capture",
                format!("session is {}", self.mode),
            ));
        }
        if self.capturing {
            return Err(EnrollmentError::transition(
                "capture",
                "a capture sequence is already running",
            ));
        }
        if self.photos_taken >= PHOTOS_PER_STUDENT {
            return Err(EnrollmentError::transition(
                "capture",
                "all photos for this student are taken",
            ));
        }
        let validation = self.validation();
        if !validation.valid {
            return Err(EnrollmentError::InvalidName(validation.message));
        }

        self.capturing = true;
        Ok(CaptureJob {
            student_name: self.student_name.trim().to_string(),
            start_index: self.photos_taken,
        })
    }

    /// Counts one captured photo. Returns the new count (never above ten).
    pub fn record_photo(&mut self) -> u8 {
        if self.photos_taken < PHOTOS_PER_STUDENT {
            self.photos_taken += 1;
        }
        self.photos_taken
    }

    /// Marks the running capture sequence as finished.
    pub fn finish_capture(&mut self) {
        self.capturing = false;
    }

    /// Returns true once all photos of the current student are taken.
    pub fn is_student_complete(&self) -> bool {
        self.photos_taken == PHOTOS_PER_STUDENT
    }

    /// Returns true if the current student is the last one.
    pub fn is_last_student(&self) -> bool {
        self.current_student == self.total_students
    }

    /// Which trigger is visible in `Collecting` mode. `None` in other modes.
    pub fn offered_action(&self) -> Option<OfferedAction> {
        if self.mode != Mode::Collecting {
            return None;
        }
        if !self.is_student_complete() || self.capturing {
            return Some(OfferedAction::Capture);
        }
        if self.is_last_student() {
            Some(OfferedAction::BeginRecognition)
        } else {
            Some(OfferedAction::AdvanceStudent)
        }
    }

    /// Collecting → Collecting for the next student.
    pub fn advance_student(&mut self) -> Result<(), EnrollmentError> {
        if self.offered_action() != Some(OfferedAction::AdvanceStudent) {
            return Err(EnrollmentError::transition(
                "advance to next student",
                format!(
                    "student {}/{} has {}/{} photos",
                    self.current_student,
                    self.total_students,
                    self.photos_taken,
                    PHOTOS_PER_STUDENT
                ),
            ));
        }

        self.student_name.clear();
        self.photos_taken = 0;
        self.recognition_status = RECOGNITION_NOT_STARTED.to_string();
        self.current_student += 1;
        Ok(())
    }

    /// Collecting → Recognizing after the last student.
    pub fn begin_recognition(&mut self) -> Result<(), EnrollmentError> {
        if self.offered_action() != Some(OfferedAction::BeginRecognition) {
            return Err(EnrollmentError::transition(
                "begin recognition",
                format!(
                    "student {}/{} has {}/{} photos",
                    self.current_student,
                    self.total_students,
                    self.photos_taken,
                    PHOTOS_PER_STUDENT
                ),
            ));
        }

        self.mode = Mode::Recognizing;
        Ok(())
    }

    pub fn set_recognition_status(&mut self, status: String) {
        self.recognition_status = status;
    }

    /// Progress line, e.g. `Fotos tiradas: 3/10`.
    pub fn progress_text(&self) -> String {
        format!("Fotos tiradas: {}/{}", self.photos_taken, PHOTOS_PER_STUDENT)
    }

    /// Completion notice for the current student, once all photos are taken.
    pub fn completion_notice(&self) -> Option<String> {
        if self.mode == Mode::Collecting && self.is_student_complete() && !self.capturing {
            Some(format!(
                "Fotos do aluno {} completas!",
                self.student_name.trim()
            ))
        } else {
            None
        }
    }

    /// Returns a progress string for display and logs.
    pub fn progress_string(&self) -> String {
        match self.mode {
            Mode::Idle => Mode::Idle.description().to_string(),
            Mode::Collecting => format!(
                "Aluno {}/{} - {} ({}/{})",
                self.current_student,
                self.total_students,
                self.mode.description(),
                self.photos_taken,
                PHOTOS_PER_STUDENT
            ),
            Mode::Recognizing => format!(
                "{} ({} alunos cadastrados)",
                self.mode.description(),
                self.total_students
            ),
        }
    }
}
