//! Student enrollment workflow.
//!
//! This module provides:
//! - The enrollment state machine (`Session`) and name validation
//! - The timed ten-photo capture sequencer
//! - The controller that owns every background task
//! - Configuration loaded from config.json

pub mod config;
pub mod controller;
pub mod error;
pub mod sequencer;
pub mod session;
pub mod shutter;
pub mod validation;

pub use config::{get_config, init_config, PHOTOS_PER_STUDENT};
pub use controller::Controller;
pub use sequencer::CaptureOutcome;
pub use session::{Mode, OfferedAction, Session};
