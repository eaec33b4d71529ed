//! GUI application state management.
//!
//! Tracks user input values and messages for display. Workflow state lives in
//! the enrollment `Session`; this only holds what the widgets edit.

/// Actions requested by the widgets during one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    StartEnrollment,
    NameChanged,
    Capture,
    AdvanceStudent,
    BeginRecognition,
}

/// GUI application state.
#[derive(Debug, Default)]
pub struct GuiState {
    /// Student count field (free text, validated on submit)
    pub count_input: String,
    /// Student name field
    pub name_input: String,
    /// Last error reported by an action (camera, count, transition)
    pub error_message: Option<String>,
    /// Surface frame counter of the uploaded texture
    pub texture_frame: u64,
    /// Caption drawn with the uploaded frame
    pub feed_caption: Option<String>,
}

impl GuiState {
    pub fn set_error(&mut self, message: String) {
        crate::log(&format!("GUI: {}", message));
        self.error_message = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_roundtrip() {
        let mut state = GuiState::default();
        assert!(state.error_message.is_none());

        state.set_error("Erro ao acessar a câmera.".to_string());
        assert_eq!(
            state.error_message.as_deref(),
            Some("Erro ao acessar a câmera.")
        );

        state.clear_error();
        assert!(state.error_message.is_none());
    }
}
