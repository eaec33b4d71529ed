//! Recognition poller: periodically submits the live surface to the recognizer.
//!
//! A failed tick is logged and counted; the next tick runs as usual.

use anyhow::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backend::{PhotoBackend, RecognitionResponse};
use crate::enrollment::session::{lock_session, Mode, Session, SharedSession};
use crate::render::Surface;
use crate::schedule::Recurring;

pub const MSG_NOT_RECOGNIZED: &str = "Nenhum aluno reconhecido.";

/// Status line for one recognizer answer. Only `status` decides the branch.
pub fn status_message(response: &RecognitionResponse) -> String {
    if response.is_success() {
        let name = response.aluno.as_deref().unwrap_or("desconhecido");
        format!("O aluno {} está na frente da câmera.", name)
    } else {
        MSG_NOT_RECOGNIZED.to_string()
    }
}

/// Result of a single poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session is not in `Recognizing` mode; nothing was sent
    Skipped,
    /// The status line was updated
    Updated(String),
    /// Encoding or the request failed; the status line is unchanged
    Failed,
}

pub struct RecognitionPoller {
    backend: Arc<dyn PhotoBackend>,
    surface: Surface,
    jpeg_quality: u8,
}

impl RecognitionPoller {
    pub fn new(backend: Arc<dyn PhotoBackend>, surface: Surface, jpeg_quality: u8) -> Self {
        Self {
            backend,
            surface,
            jpeg_quality,
        }
    }

    /// Sends one frame and updates the session status line.
    pub fn tick(&self, session: &Mutex<Session>) -> TickOutcome {
        if lock_session(session).mode() != Mode::Recognizing {
            return TickOutcome::Skipped;
        }

        let response = match self.surface.encode_jpeg(self.jpeg_quality) {
            Ok(sample) => {
                lock_session(session).stats_mut().recognition_requests += 1;
                self.backend.recognize(&sample)
            }
            Err(e) => Err(e),
        };

        let mut session = lock_session(session);
        match response {
            Ok(response) => {
                if let Some(confidence) = response.confianca {
                    crate::log(&format!(
                        "Recognition: {} ({:?}, confidence {:.0})",
                        response.status, response.aluno, confidence
                    ));
                }
                if let (false, Some(message)) = (response.is_success(), &response.mensagem) {
                    crate::log(&format!("Recognizer: {}", message));
                }
                let message = status_message(&response);
                session.set_recognition_status(message.clone());
                TickOutcome::Updated(message)
            }
            Err(e) => {
                session.stats_mut().recognition_failures += 1;
                crate::log(&format!("Recognition request failed: {:#}", e));
                TickOutcome::Failed
            }
        }
    }

    /// Starts polling every `interval`. Stop or drop the handle to end it.
    pub fn start(self, session: SharedSession, interval: Duration) -> Result<Recurring> {
        crate::log(&format!(
            "Recognition polling every {} ms",
            interval.as_millis()
        ));

        Recurring::spawn("recognition-poller", interval, move || {
            self.tick(&session);
        })
    }
}
