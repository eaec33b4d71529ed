//! Frame renderer: copies the live video frame onto the surface on every tick.

use anyhow::Result;
use std::sync::Mutex;
use std::time::Duration;

use super::surface::Surface;
use crate::camera::FrameSlot;
use crate::enrollment::session::{lock_session, Mode, Session, SharedSession};
use crate::schedule::Recurring;

/// Draws the latest frame once.
///
/// In `Collecting` mode the current student name becomes the caption; in every
/// other mode the caption is cleared. Returns false when the stream has not
/// produced a frame yet.
pub fn render_once(frames: &FrameSlot, surface: &Surface, session: &Mutex<Session>) -> bool {
    let Some(frame) = frames.latest() else {
        return false;
    };

    let caption = {
        let session = lock_session(session);
        match session.mode() {
            Mode::Collecting => Some(session.student_name().to_string()),
            Mode::Idle | Mode::Recognizing => None,
        }
    };

    surface.draw(&frame, caption.as_deref());
    true
}

/// Starts the recurring render task. Stop or drop the returned handle to end it.
pub fn start_renderer(
    frames: FrameSlot,
    surface: Surface,
    session: SharedSession,
    interval: Duration,
) -> Result<Recurring> {
    crate::log(&format!(
        "Render loop starting ({} ms interval)",
        interval.as_millis()
    ));

    Recurring::spawn("render-loop", interval, move || {
        render_once(&frames, &surface, &session);
    })
}
