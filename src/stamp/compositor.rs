// Composites the resized stamp and its caption onto a rendered page at the
// placement chosen by the locator. Coordinates stay in raster pixels; the
// PDF writer owns the translation to user-space points.

use std::path::Path;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use tracing::warn;

use super::{Caption, StampCache};
use crate::error::Result;
use crate::locator::StampPlan;

/// Font file expected inside the configured fonts directory.
const FONT_FILE: &str = "OpenSans-Regular.ttf";
/// Caption glyph height relative to the stamp side.
const CAPTION_SCALE: f32 = 0.12;

pub struct Compositor {
    stamp: StampCache,
    font: Option<FontVec>,
}

impl Compositor {
    /// Load the stamp image and, when a fonts directory is configured, the
    /// caption font. A missing or unreadable font downgrades to stamping
    /// without a caption rather than failing the job.
    pub fn new(stamp_path: &Path, fonts_dir: Option<&Path>) -> Result<Self> {
        let stamp = StampCache::load(stamp_path)?;
        let font = fonts_dir.and_then(|dir| {
            let path = dir.join(FONT_FILE);
            match std::fs::read(&path) {
                Ok(bytes) => match FontVec::try_from_vec(bytes) {
                    Ok(font) => Some(font),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "caption font unreadable, stamping without caption");
                        None
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "caption font missing, stamping without caption");
                    None
                }
            }
        });
        Ok(Self { stamp, font })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(stamp: StampCache, font: Option<FontVec>) -> Self {
        Self { stamp, font }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw the stamp at exactly `plan.size x plan.size` pixels at
    /// `(plan.x, plan.y)`, alpha preserved, then the caption lines centered
    /// below it. Caption glyphs reaching past the page edge are clipped.
    pub fn apply(&self, page: &mut RgbaImage, plan: &StampPlan, caption: &Caption) {
        let stamp = self.stamp.at_size(plan.size);
        image::imageops::overlay(page, &*stamp, plan.x as i64, plan.y as i64);

        let Some(font) = &self.font else {
            return;
        };

        let px = (plan.size as f32 * CAPTION_SCALE).max(8.0);
        let scale = PxScale::from(px);
        let line_height = font.as_scaled(scale).height().ceil() as u32;
        let gap = (px * 0.25).ceil() as u32;
        let center_x = plan.x + plan.size / 2;

        let black = Rgba([0u8, 0, 0, 255]);
        let header_y = plan.y + plan.size + gap;
        let number_y = header_y + line_height + gap / 2;

        for (text, y) in [(&caption.header, header_y), (&caption.number, number_y)] {
            let width = text_width(font, scale, text);
            let x = center_x.saturating_sub((width / 2.0) as u32);
            draw_text_mut(page, black, x as i32, y as i32, scale, font, text);
        }
    }
}

/// Advance-width of a string at the given scale, without kerning.
fn text_width(font: &FontVec, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    text.chars()
        .map(|c| scaled.h_advance(font.glyph_id(c)))
        .sum()
}
