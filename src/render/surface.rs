//! The drawable surface shared by the renderer, the capture sequencer and the
//! recognition poller.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::sync::{Arc, Mutex, MutexGuard};

use super::caption::burn_caption;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// One JPEG still taken from the surface, as a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSample {
    data_url: String,
}

impl FrameSample {
    /// Wraps raw JPEG bytes into a data URL.
    pub fn from_jpeg_bytes(bytes: &[u8]) -> Self {
        Self {
            data_url: format!("{}{}", DATA_URL_PREFIX, STANDARD.encode(bytes)),
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

struct SurfaceState {
    pixels: RgbaImage,
    caption: Option<String>,
    caption_in_pixels: bool,
    frames_drawn: u64,
}

/// What the presentation layer needs to paint one frame.
#[derive(Clone)]
pub struct SurfaceSnapshot {
    pub pixels: RgbaImage,
    pub caption: Option<String>,
    /// The caption is already part of `pixels`
    pub caption_in_pixels: bool,
    pub frames_drawn: u64,
}

/// Fixed-size RGBA canvas. Cloning shares the same canvas.
#[derive(Clone)]
pub struct Surface {
    state: Arc<Mutex<SurfaceState>>,
}

impl Surface {
    /// Creates a black surface of the given size. Captions are drawn into the
    /// pixels, so encoded photos carry them.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(SurfaceState {
                pixels: RgbaImage::new(width.max(1), height.max(1)),
                caption: None,
                caption_in_pixels: true,
                frames_drawn: 0,
            })),
        }
    }

    /// Chooses whether captions are drawn into the pixels or left to the
    /// presentation layer as an overlay.
    pub fn with_burned_caption(self, enabled: bool) -> Self {
        self.lock().caption_in_pixels = enabled;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.lock().pixels.dimensions()
    }

    /// Copies `frame` onto the surface, scaling it to the surface size, and
    /// replaces the caption.
    pub fn draw(&self, frame: &RgbaImage, caption: Option<&str>) {
        let (width, height) = self.dimensions();
        let mut scaled = if frame.dimensions() == (width, height) {
            frame.clone()
        } else {
            imageops::resize(frame, width, height, FilterType::Triangle)
        };

        let burn = self.lock().caption_in_pixels;
        if let (true, Some(text)) = (burn, caption) {
            burn_caption(&mut scaled, text);
        }

        let mut state = self.lock();
        state.pixels = scaled;
        state.caption = caption.map(str::to_string);
        state.frames_drawn += 1;
    }

    /// Returns true once a video frame has been drawn.
    pub fn has_frame(&self) -> bool {
        self.lock().frames_drawn > 0
    }

    pub fn frames_drawn(&self) -> u64 {
        self.lock().frames_drawn
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        let state = self.lock();
        SurfaceSnapshot {
            pixels: state.pixels.clone(),
            caption: state.caption.clone(),
            caption_in_pixels: state.caption_in_pixels,
            frames_drawn: state.frames_drawn,
        }
    }

    /// Encodes the current surface content as a JPEG data URL.
    ///
    /// `quality` is clamped to 1..=100. A caption is part of the result only
    /// when it was drawn into the pixels.
    pub fn encode_jpeg(&self, quality: u8) -> Result<FrameSample> {
        // Copy out so the renderer is not blocked while encoding
        let pixels = self.lock().pixels.clone();
        let rgb = DynamicImage::ImageRgba8(pixels).to_rgb8();

        let mut bytes = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
        encoder
            .encode_image(&rgb)
            .context("Failed to encode surface as JPEG")?;

        Ok(FrameSample::from_jpeg_bytes(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn jpeg_bytes(sample: &FrameSample) -> Result<Vec<u8>> {
        let payload = sample
            .data_url()
            .strip_prefix(DATA_URL_PREFIX)
            .context("Frame sample is not a JPEG data URL")?;
        STANDARD
            .decode(payload)
            .context("Frame sample payload is not valid base64")
    }

    #[test]
    fn test_new_surface_has_no_frame() {
        let surface = Surface::new(64, 48);
        assert_eq!(surface.dimensions(), (64, 48));
        assert!(!surface.has_frame());
        assert!(surface.snapshot().caption.is_none());
    }

    #[test]
    fn test_draw_scales_to_surface_size() {
        let surface = Surface::new(64, 48);
        let frame = RgbaImage::from_pixel(16, 12, Rgba([255, 0, 0, 255]));

        surface.draw(&frame, Some("Ana Silva"));

        let snapshot = surface.snapshot();
        assert_eq!(snapshot.pixels.dimensions(), (64, 48));
        assert_eq!(snapshot.pixels.get_pixel(32, 24)[0], 255);
        assert_eq!(snapshot.caption.as_deref(), Some("Ana Silva"));
        assert_eq!(snapshot.frames_drawn, 1);
    }

    #[test]
    fn test_draw_without_caption_clears_it() {
        let surface = Surface::new(8, 8);
        let frame = RgbaImage::new(8, 8);

        surface.draw(&frame, Some("Ana"));
        surface.draw(&frame, None);

        assert!(surface.snapshot().caption.is_none());
        assert_eq!(surface.frames_drawn(), 2);
    }

    #[test]
    fn test_encode_jpeg_produces_decodable_data_url() {
        let surface = Surface::new(32, 24);
        surface.draw(&RgbaImage::from_pixel(32, 24, Rgba([10, 200, 30, 255])), None);

        let sample = surface.encode_jpeg(80).unwrap();
        assert!(sample.data_url().starts_with("data:image/jpeg;base64,"));

        let bytes = jpeg_bytes(&sample).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn test_captioned_photo_differs_from_plain_one() {
        let surface = Surface::new(320, 240);
        let frame = RgbaImage::from_pixel(320, 240, Rgba([0, 0, 0, 255]));

        surface.draw(&frame, None);
        let plain = surface.encode_jpeg(80).unwrap();
        surface.draw(&frame, Some("Ana Silva"));
        let captioned = surface.encode_jpeg(80).unwrap();

        assert_ne!(plain, captioned);
        assert!(surface.snapshot().caption_in_pixels);
    }

    #[test]
    fn test_overlay_only_caption_keeps_pixels_clean() {
        let surface = Surface::new(320, 240).with_burned_caption(false);
        let frame = RgbaImage::from_pixel(320, 240, Rgba([0, 0, 0, 255]));

        surface.draw(&frame, None);
        let plain = surface.encode_jpeg(80).unwrap();
        surface.draw(&frame, Some("Ana Silva"));
        let captioned = surface.encode_jpeg(80).unwrap();

        assert_eq!(plain, captioned);
        let snapshot = surface.snapshot();
        assert_eq!(snapshot.caption.as_deref(), Some("Ana Silva"));
        assert!(!snapshot.caption_in_pixels);
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let surface = Surface::new(64, 64);
        let noisy = RgbaImage::from_fn(64, 64, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x * y) % 256) as u8, 255])
        });
        surface.draw(&noisy, None);

        let high = jpeg_bytes(&surface.encode_jpeg(95).unwrap()).unwrap();
        let low = jpeg_bytes(&surface.encode_jpeg(10).unwrap()).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_jpeg_bytes_rejects_other_urls() {
        let sample = FrameSample {
            data_url: "data:image/png;base64,AAAA".to_string(),
        };
        assert!(jpeg_bytes(&sample).is_err());
    }
}
