//! Rasterizes the student caption into surface pixels.
//!
//! White 20 px text, left-aligned 10 px from the edge with its baseline 20 px
//! above the bottom, drawn with the sans-serif face egui ships.

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::sync::OnceLock;

const CAPTION_PX: f32 = 20.0;
const CAPTION_LEFT: f32 = 10.0;
const CAPTION_BASELINE_FROM_BOTTOM: f32 = 20.0;

static CAPTION_FONT: OnceLock<Option<FontArc>> = OnceLock::new();

fn caption_font() -> Option<&'static FontArc> {
    CAPTION_FONT
        .get_or_init(|| match FontArc::try_from_slice(epaint_default_fonts::UBUNTU_LIGHT) {
            Ok(font) => Some(font),
            Err(e) => {
                crate::log(&format!("Caption font unavailable: {}", e));
                None
            }
        })
        .as_ref()
}

fn blend_white(pixel: &mut Rgba<u8>, coverage: f32) {
    let alpha = coverage.clamp(0.0, 1.0);
    for channel in pixel.0.iter_mut().take(3) {
        let value = f32::from(*channel) * (1.0 - alpha) + 255.0 * alpha;
        *channel = value.round() as u8;
    }
}

/// Draws `text` onto `pixels`. Glyphs falling outside the image are clipped.
pub fn burn_caption(pixels: &mut RgbaImage, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let Some(font) = caption_font() else {
        return;
    };

    let (width, height) = pixels.dimensions();
    let scale = PxScale::from(CAPTION_PX);
    let scaled = font.as_scaled(scale);
    let baseline = height as f32 - CAPTION_BASELINE_FROM_BOTTOM;

    let mut caret = CAPTION_LEFT;
    let mut previous: Option<GlyphId> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(previous) = previous {
            caret += scaled.kern(previous, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, baseline));
        caret += scaled.h_advance(id);
        previous = Some(id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let x = bounds.min.x as i64 + i64::from(gx);
            let y = bounds.min.y as i64 + i64::from(gy);
            if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                return;
            }
            blend_white(pixels.get_pixel_mut(x as u32, y as u32), coverage);
        });
    }
}
