//! Errors the presentation layer reports to the operator.

use thiserror::Error;

use crate::camera::CameraError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrollmentError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error("invalid student count: {0:?}")]
    InvalidStudentCount(String),
    #[error("invalid student name: {0}")]
    InvalidName(String),
    #[error("failed to start background task: {0}")]
    Worker(String),
    #[error("{action} is not allowed: {reason}")]
    InvalidTransition {
        action: &'static str,
        reason: String,
    },
}

impl EnrollmentError {
    pub(crate) fn transition(action: &'static str, reason: impl Into<String>) -> Self {
        EnrollmentError::InvalidTransition {
            action,
            reason: reason.into(),
        }
    }

    /// Message shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            EnrollmentError::Camera(e) => e.user_message(),
            EnrollmentError::InvalidStudentCount(_) => {
                "Por favor, insira um número válido de alunos.".to_string()
            }
            EnrollmentError::InvalidName(message) => message.clone(),
            EnrollmentError::Worker(_) | EnrollmentError::InvalidTransition { .. } => {
                self.to_string()
            }
        }
    }
}
