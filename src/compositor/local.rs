//! Local compositing: framed artworks pasted side by side on the wall.
//!
//! Pure CPU work. Callers run [`render_local`] on the blocking pool.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

use super::CompositeError;
use crate::core::config::CompositorConfig;

/// Tunables for one render.
#[derive(Debug, Clone, Copy)]
pub struct LocalSettings {
    pub max_wall_width: u32,
    pub height_ratio: f32,
    pub border_px: u32,
    pub jpeg_quality: u8,
}

impl From<&CompositorConfig> for LocalSettings {
    fn from(c: &CompositorConfig) -> Self {
        Self {
            max_wall_width: c.max_wall_width,
            height_ratio: c.artwork_height_ratio,
            border_px: c.border_px,
            jpeg_quality: c.jpeg_quality,
        }
    }
}

/// Encoded JPEG plus placement counts.
#[derive(Debug)]
pub struct LocalRender {
    pub bytes: Vec<u8>,
    pub placed: usize,
    pub skipped: usize,
}

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Horizontal distance between slot centres for `n` artworks.
pub fn slot_spacing(wall_width: u32, n: usize) -> u32 {
    let slots = u32::try_from(n).unwrap_or(u32::MAX).saturating_add(1);
    wall_width / slots
}

/// Centre x of slot `i` (0-based).
pub fn slot_center_x(spacing: u32, i: usize) -> i64 {
    i64::from(spacing) * (i as i64 + 1)
}

/// Artwork height in pixels for a wall of `wall_height`.
pub fn target_height(wall_height: u32, ratio: f32) -> u32 {
    (f64::from(wall_height) * f64::from(ratio)).floor() as u32
}

/// Width that keeps the artwork's aspect ratio at `height`.
pub fn scaled_width(art_width: u32, art_height: u32, height: u32) -> u32 {
    if art_height == 0 {
        return 0;
    }
    let aspect = f64::from(art_width) / f64::from(art_height);
    (f64::from(height) * aspect).floor() as u32
}

// ── Render ────────────────────────────────────────────────────────────────────

/// Paste every fetched artwork onto the wall and encode as JPEG.
///
/// `artworks` holds one entry per ranked artwork in rank order; `None` marks
/// one whose download already failed. Slots are laid out for the full list so
/// a skipped artwork leaves its slot empty. Fetched bytes that do not decode,
/// or that scale to nothing, fail the whole render with `Decode`.
pub fn render_local(
    wall_bytes: &[u8],
    artworks: &[Option<Vec<u8>>],
    settings: LocalSettings,
) -> Result<LocalRender, CompositeError> {
    let mut wall = image::load_from_memory(wall_bytes)
        .map_err(|e| CompositeError::Decode(format!("wall: {e}")))?
        .to_rgb8();

    if wall.width() > settings.max_wall_width {
        let max = settings.max_wall_width;
        wall = DynamicImage::ImageRgb8(wall)
            .resize(max, max, FilterType::Lanczos3)
            .to_rgb8();
        debug!(width = wall.width(), height = wall.height(), "wall downscaled");
    }

    let (wall_w, wall_h) = wall.dimensions();
    let spacing = slot_spacing(wall_w, artworks.len());
    let height = target_height(wall_h, settings.height_ratio);
    let border = i64::from(settings.border_px);
    let top = (i64::from(wall_h) - i64::from(height)) / 2;

    let mut placed = 0;
    let mut skipped = 0;

    for (i, entry) in artworks.iter().enumerate() {
        let Some(bytes) = entry else {
            skipped += 1;
            continue;
        };
        let art = image::load_from_memory(bytes)
            .map_err(|e| CompositeError::Decode(format!("artwork {i}: {e}")))?
            .to_rgb8();

        let width = scaled_width(art.width(), art.height(), height);
        if width == 0 || height == 0 {
            return Err(CompositeError::Decode(format!(
                "artwork {i}: resizes to {width}x{height}"
            )));
        }

        let resized = imageops::resize(&art, width, height, FilterType::Lanczos3);
        let mut frame = RgbImage::from_pixel(
            width + 2 * settings.border_px,
            height + 2 * settings.border_px,
            Rgb([255, 255, 255]),
        );
        imageops::replace(&mut frame, &resized, border, border);

        let left = slot_center_x(spacing, i) - i64::from(width / 2);
        imageops::replace(&mut wall, &frame, left - border, top - border);
        placed += 1;
    }

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, settings.jpeg_quality)
        .encode_image(&wall)
        .map_err(|e| CompositeError::Encode(e.to_string()))?;

    Ok(LocalRender { bytes, placed, skipped })
}
