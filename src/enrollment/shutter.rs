//! Shutter sound cue played on each capture.
//!
//! Playback is fire-and-forget: a cue that fails to play never delays or
//! aborts the capture sequence.

use std::sync::Arc;

/// Audible feedback for one capture.
pub trait ShutterCue: Send + Sync {
    /// Starts the cue and returns immediately.
    fn play(&self);

    /// Short name for logs.
    fn describe(&self) -> &'static str;
}

/// Cue that does nothing (no audio backend, or sound disabled in config).
pub struct SilentShutter;

impl ShutterCue for SilentShutter {
    fn play(&self) {}

    fn describe(&self) -> &'static str {
        "silent"
    }
}

/// Builds the shutter cue selected by configuration and cargo features.
pub fn default_shutter(enabled: bool) -> Arc<dyn ShutterCue> {
    if !enabled {
        return Arc::new(SilentShutter);
    }
    let cue = audible_shutter();
    crate::log(&format!("Shutter cue: {}", cue.describe()));
    cue
}

#[cfg(feature = "shutter-sound")]
fn audible_shutter() -> Arc<dyn ShutterCue> {
    Arc::new(sound::RodioShutter::default())
}

#[cfg(not(feature = "shutter-sound"))]
fn audible_shutter() -> Arc<dyn ShutterCue> {
    crate::log("Shutter sound requested but built without the shutter-sound feature");
    Arc::new(SilentShutter)
}

#[cfg(feature = "shutter-sound")]
mod sound {
    use rodio::source::{SineWave, Source};
    use rodio::{OutputStreamBuilder, Sink};
    use std::thread;
    use std::time::Duration;

    use super::ShutterCue;

    /// Short synthesized click played through the default output device.
    pub struct RodioShutter {
        volume: f32,
    }

    impl Default for RodioShutter {
        fn default() -> Self {
            Self { volume: 0.3 }
        }
    }

    impl ShutterCue for RodioShutter {
        fn play(&self) {
            let volume = self.volume;
            // OutputStream is not Send, so it lives entirely on the playback thread
            thread::spawn(move || {
                if let Err(e) = play_click_blocking(volume) {
                    crate::log(&format!("Failed to play shutter sound: {}", e));
                }
            });
        }

        fn describe(&self) -> &'static str {
            "rodio click"
        }
    }

    fn play_click_blocking(volume: f32) -> Result<(), String> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| format!("Failed to open audio output: {e}"))?;

        let sink = Sink::connect_new(stream.mixer());
        sink.set_volume(volume);
        sink.append(SineWave::new(1760.0).take_duration(Duration::from_millis(40)));
        sink.append(SineWave::new(880.0).take_duration(Duration::from_millis(30)));
        sink.sleep_until_end();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_cue_is_silent() {
        let cue = default_shutter(false);
        assert_eq!(cue.describe(), "silent");
        cue.play();
    }

    #[cfg(feature = "shutter-sound")]
    #[test]
    fn test_enabled_cue_plays_through_rodio() {
        let cue = default_shutter(true);
        assert_eq!(cue.describe(), "rodio click");
    }

    #[cfg(not(feature = "shutter-sound"))]
    #[test]
    fn test_enabled_cue_without_audio_backend_is_silent() {
        assert_eq!(default_shutter(true).describe(), "silent");
    }
}
