//! Drawing the live feed.
//!
//! This module provides:
//! - The shared drawable `Surface` and JPEG `FrameSample` encoding
//! - Caption rasterization for enrollment photos
//! - The recurring frame renderer (`start_renderer`)

pub mod caption;
pub mod renderer;
pub mod surface;

pub use renderer::{render_once, start_renderer};
pub use surface::{FrameSample, Surface};
