//! Student name and student count validation.

use regex::Regex;
use std::sync::OnceLock;

pub const MSG_NAME_EMPTY: &str = "Por favor, insira o nome do aluno.";
pub const MSG_NAME_INVALID: &str = "O nome do aluno deve conter apenas letras e espaços.";

static NAME_PATTERN: OnceLock<Regex> = OnceLock::new();

fn name_pattern() -> &'static Regex {
    NAME_PATTERN.get_or_init(|| Regex::new(r"^[\p{L}\s]+$").expect("valid name pattern"))
}

/// Result of validating the name field. Never stored, always recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationState {
    pub valid: bool,
    /// Empty when valid
    pub message: String,
}

impl ValidationState {
    fn ok() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            valid: false,
            message: message.to_string(),
        }
    }
}

/// Validates a student name: trimmed, non-empty, letters and whitespace only.
pub fn validate_name(name: &str) -> ValidationState {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        ValidationState::error(MSG_NAME_EMPTY)
    } else if !name_pattern().is_match(trimmed) {
        ValidationState::error(MSG_NAME_INVALID)
    } else {
        ValidationState::ok()
    }
}

/// Parses the student count typed by the operator. Only positive integers pass.
pub fn parse_student_count(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|count| *count >= 1)
}
