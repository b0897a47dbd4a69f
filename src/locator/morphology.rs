// Rectangular-kernel binary morphology, separable into a horizontal and a
// vertical pass. Pixels outside the image are treated as free.

use super::mask::{FORBIDDEN, Mask};

/// Dilate with a `kw x kh` rectangular kernel anchored at its center.
///
/// A pixel becomes forbidden when any forbidden pixel of the input lies in
/// the window `[x - kw/2, x + (kw - 1) / 2] x [y - kh/2, y + (kh - 1) / 2]`.
pub fn dilate(mask: &Mask, kw: u32, kh: u32) -> Mask {
    let horizontal = pass_rows(mask, kw, false);
    pass_cols(&horizontal, kh, false)
}

/// Erode with a `kw x kh` rectangular kernel anchored at its center.
///
/// A pixel stays forbidden only when the whole window is forbidden. Windows
/// reaching past the image border can never be fully forbidden, so shapes
/// shrink at the edges.
pub fn erode(mask: &Mask, kw: u32, kh: u32) -> Mask {
    let horizontal = pass_rows(mask, kw, true);
    pass_cols(&horizontal, kh, true)
}

/// Opening: erosion followed by dilation. Removes runs shorter than the
/// kernel while keeping longer structures at their original extent.
pub fn open(mask: &Mask, kw: u32, kh: u32) -> Mask {
    dilate(&erode(mask, kw, kh), kw, kh)
}

/// Closing: dilation followed by erosion. Bridges gaps narrower than the
/// kernel, merging nearby blobs into one.
pub fn close(mask: &Mask, kw: u32, kh: u32) -> Mask {
    erode(&dilate(mask, kw, kh), kw, kh)
}

/// One-dimensional pass along rows. `erode = false` sets the output when the
/// window contains any forbidden pixel; `erode = true` requires the full
/// in-bounds window (of width `k`) to be forbidden.
fn pass_rows(mask: &Mask, k: u32, erode: bool) -> Mask {
    if k <= 1 {
        return mask.clone();
    }
    let (w, h) = (mask.width(), mask.height());
    let mut out = Mask::empty(w, h);
    let left = (k / 2) as i64;
    let right = ((k - 1) / 2) as i64;

    let mut prefix = vec![0u32; w as usize + 1];
    for y in 0..h {
        for x in 0..w {
            prefix[x as usize + 1] =
                prefix[x as usize] + u32::from(mask.is_forbidden(x, y));
        }
        for x in 0..w {
            let lo = (x as i64 - left).max(0) as usize;
            let hi = ((x as i64 + right + 1).min(w as i64)) as usize;
            let count = prefix[hi] - prefix[lo];
            let set = if erode {
                count == k && (x as i64 - left >= 0) && (x as i64 + right < w as i64)
            } else {
                count > 0
            };
            if set {
                out.as_image_mut().put_pixel(x, y, image::Luma([FORBIDDEN]));
            }
        }
    }
    out
}

/// One-dimensional pass along columns, mirroring `pass_rows`.
fn pass_cols(mask: &Mask, k: u32, erode: bool) -> Mask {
    if k <= 1 {
        return mask.clone();
    }
    let (w, h) = (mask.width(), mask.height());
    let mut out = Mask::empty(w, h);
    let top = (k / 2) as i64;
    let bottom = ((k - 1) / 2) as i64;

    let mut prefix = vec![0u32; h as usize + 1];
    for x in 0..w {
        for y in 0..h {
            prefix[y as usize + 1] =
                prefix[y as usize] + u32::from(mask.is_forbidden(x, y));
        }
        for y in 0..h {
            let lo = (y as i64 - top).max(0) as usize;
            let hi = ((y as i64 + bottom + 1).min(h as i64)) as usize;
            let count = prefix[hi] - prefix[lo];
            let set = if erode {
                count == k && (y as i64 - top >= 0) && (y as i64 + bottom < h as i64)
            } else {
                count > 0
            };
            if set {
                out.as_image_mut().put_pixel(x, y, image::Luma([FORBIDDEN]));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dilate_grows_a_point() {
        let mut mask = Mask::empty(11, 11);
        mask.set_forbidden(5, 5);

        let grown = dilate(&mask, 3, 3);
        assert_eq!(grown.count_forbidden(), 9);
        assert!(grown.is_forbidden(4, 4));
        assert!(grown.is_forbidden(6, 6));
        assert!(!grown.is_forbidden(3, 5));
    }

    #[test]
    fn dilate_is_directional() {
        let mut mask = Mask::empty(20, 20);
        mask.set_forbidden(10, 10);

        let wide = dilate(&mask, 7, 1);
        assert!(wide.is_forbidden(7, 10));
        assert!(wide.is_forbidden(13, 10));
        assert!(!wide.is_forbidden(10, 9), "no vertical growth");
        assert_eq!(wide.count_forbidden(), 7);
    }

    #[test]
    fn erode_removes_thin_runs() {
        let mut mask = Mask::empty(20, 5);
        mask.fill_rect(2, 2, 10, 1);

        let eroded = erode(&mask, 3, 1);
        // A 1-px-tall run survives a 3x1 erosion but loses its endpoints.
        assert_eq!(eroded.count_forbidden(), 8);
        assert!(!eroded.is_forbidden(2, 2));
        assert!(eroded.is_forbidden(3, 2));
    }

    #[test]
    fn close_bridges_small_gaps() {
        let mut mask = Mask::empty(30, 5);
        // Two runs separated by a 4-px gap, like glyphs within a word.
        mask.fill_rect(2, 2, 6, 1);
        mask.fill_rect(12, 2, 6, 1);

        let closed = close(&mask, 9, 1);
        for x in 8..12 {
            assert!(closed.is_forbidden(x, 2), "gap at x={x} should be bridged");
        }
    }

    #[test]
    fn open_drops_isolated_specks() {
        let mut mask = Mask::empty(30, 30);
        mask.set_forbidden(5, 5);
        mask.fill_rect(10, 10, 12, 12);

        let opened = open(&mask, 5, 5);
        assert!(!opened.is_forbidden(5, 5), "speck removed");
        assert!(opened.is_forbidden(15, 15), "large blob kept");
    }

    #[test]
    fn unit_kernel_is_identity() {
        let mut mask = Mask::empty(8, 8);
        mask.fill_rect(1, 1, 3, 3);
        assert_eq!(dilate(&mask, 1, 1), mask);
        assert_eq!(erode(&mask, 1, 1), mask);
    }
}
