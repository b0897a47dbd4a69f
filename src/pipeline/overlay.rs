// Debug overlay renderer: the locator's masks and the chosen placement
// blended over the page. Red marks text, blue images, magenta matrix codes,
// green the stamp square.

use std::path::Path;

use image::{DynamicImage, Rgba, RgbaImage, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::info;

use crate::error::{Result, StampwiseError};
use crate::locator::DebugEvent;
use crate::locator::mask::Mask;

const TEXT_COLOR: [u8; 3] = [255, 0, 0];
const IMAGE_COLOR: [u8; 3] = [0, 0, 255];
const QR_COLOR: [u8; 3] = [255, 0, 255];
const PLACEMENT_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const FRAME_THICKNESS: u32 = 3;

/// Render the overlay image for one debug event.
pub fn render_overlay(base: &RgbImage, event: &DebugEvent<'_>) -> RgbaImage {
    let mut canvas = DynamicImage::ImageRgb8(base.clone()).to_rgba8();

    tint(&mut canvas, event.text_mask, TEXT_COLOR);
    tint(&mut canvas, event.image_mask, IMAGE_COLOR);
    tint(&mut canvas, event.qr_mask, QR_COLOR);

    let p = event.placement;
    fill_square(&mut canvas, p.x, p.y, p.size);
    for t in 0..FRAME_THICKNESS {
        let inner = p.size.saturating_sub(2 * t);
        if inner == 0 {
            break;
        }
        let rect = Rect::at((p.x + t) as i32, (p.y + t) as i32).of_size(inner, inner);
        draw_hollow_rect_mut(&mut canvas, rect, PLACEMENT_COLOR);
    }

    canvas
}

/// Render and save the overlay PNG, logging the per-mask overlap breakdown.
pub fn write_overlay(base: &RgbImage, event: &DebugEvent<'_>, path: &Path) -> Result<()> {
    let canvas = render_overlay(base, event);
    canvas
        .save(path)
        .map_err(|e| StampwiseError::composite(format!("overlay save failed: {e}")))?;

    info!(
        path = %path.display(),
        total = format!("{:.1}%", event.union_overlap * 100.0),
        text = format!("{:.1}%", event.text_overlap * 100.0),
        image = format!("{:.1}%", event.image_overlap * 100.0),
        qr = format!("{:.1}%", event.qr_overlap * 100.0),
        "debug overlay written"
    );
    Ok(())
}

/// Blend 30% of `color` into every forbidden pixel of the mask.
fn tint(canvas: &mut RgbaImage, mask: &Mask, color: [u8; 3]) {
    let w = canvas.width().min(mask.width());
    let h = canvas.height().min(mask.height());
    for y in 0..h {
        for x in 0..w {
            if !mask.is_forbidden(x, y) {
                continue;
            }
            let p = canvas.get_pixel_mut(x, y);
            for c in 0..3 {
                p.0[c] = ((p.0[c] as u32 * 7 + color[c] as u32 * 3) / 10) as u8;
            }
        }
    }
}

/// Light green wash over the chosen square so it reads through the masks.
fn fill_square(canvas: &mut RgbaImage, x: u32, y: u32, size: u32) {
    let x2 = (x + size).min(canvas.width());
    let y2 = (y + size).min(canvas.height());
    for yy in y..y2 {
        for xx in x..x2 {
            let p = canvas.get_pixel_mut(xx, yy);
            p.0[0] = (p.0[0] as u32 * 8 / 10) as u8;
            p.0[1] = ((p.0[1] as u32 * 8 + 255 * 2) / 10) as u8;
            p.0[2] = (p.0[2] as u32 * 8 / 10) as u8;
        }
    }
}
