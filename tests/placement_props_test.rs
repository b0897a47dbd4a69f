// Property harness: random mask configurations (rectangles and thin lines)
// must always yield in-bounds, deterministic, exactly-recounted placements,
// and mask growth must never lower the overlap of a fixed square.

use stampwise::locator::content::ContentMasks;
use stampwise::locator::mask::{IntegralMask, Mask};
use stampwise::locator::{LocatorOptions, locate_in_masks, scale_len};

const PAGE_W: u32 = 500;
const PAGE_H: u32 = 400;

/// Deterministic xorshift64* generator so every run sees the same cases.
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Rng(seed.max(1))
    }

    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn range(&mut self, lo: u32, hi: u32) -> u32 {
        lo + (self.next() % u64::from(hi - lo)) as u32
    }
}

fn random_masks(rng: &mut Rng) -> ContentMasks {
    let mut text = Mask::empty(PAGE_W, PAGE_H);
    let mut image = Mask::empty(PAGE_W, PAGE_H);

    for _ in 0..rng.range(3, 10) {
        let w = rng.range(20, 120);
        let h = rng.range(20, 120);
        let x = rng.range(0, PAGE_W - w);
        let y = rng.range(0, PAGE_H - h);
        text.fill_rect(x, y, w, h);
    }
    for _ in 0..rng.range(1, 5) {
        let y = rng.range(0, PAGE_H - 2);
        image.fill_rect(0, y, PAGE_W, 2);
    }

    ContentMasks {
        text,
        image,
        qr: Mask::empty(PAGE_W, PAGE_H),
    }
}

fn default_opts() -> LocatorOptions {
    LocatorOptions::default()
}

#[test]
fn test_random_masks_always_place_within_bounds() {
    for seed in 1..=25u64 {
        let masks = random_masks(&mut Rng::new(seed));
        let p = locate_in_masks(&masks, &default_opts())
            .unwrap_or_else(|e| panic!("seed {seed}: page large enough, got {e}"));

        let margin = scale_len(40, 200);
        assert!(p.x >= margin && p.y >= margin, "seed {seed}: margin");
        assert!(p.x + p.size + margin <= PAGE_W, "seed {seed}: right bound");
        assert!(p.y + p.size + margin <= PAGE_H, "seed {seed}: bottom bound");
        assert!(
            (0.0..=1.0).contains(&p.overlap_fraction),
            "seed {seed}: overlap in unit range"
        );
    }
}

#[test]
fn test_random_masks_are_recounted_exactly() {
    for seed in 1..=25u64 {
        let masks = random_masks(&mut Rng::new(seed));
        let p = locate_in_masks(&masks, &default_opts()).expect("placement");

        let union = masks.union();
        let mut naive = 0u64;
        for y in p.y..p.y + p.size {
            for x in p.x..p.x + p.size {
                if union.is_forbidden(x, y) {
                    naive += 1;
                }
            }
        }
        let naive_fraction = naive as f64 / (p.size as f64 * p.size as f64);
        assert!(
            (naive_fraction - p.overlap_fraction).abs() < 1e-12,
            "seed {seed}: naive {naive_fraction} vs {}",
            p.overlap_fraction
        );
    }
}

#[test]
fn test_random_masks_place_deterministically() {
    for seed in 1..=25u64 {
        let masks = random_masks(&mut Rng::new(seed));
        let a = locate_in_masks(&masks, &default_opts()).expect("first");
        let b = locate_in_masks(&masks, &default_opts()).expect("second");
        assert_eq!(a, b, "seed {seed}");
    }
}

#[test]
fn test_mask_growth_is_monotone_for_fixed_squares() {
    for seed in 1..=25u64 {
        let mut rng = Rng::new(seed);
        let masks = random_masks(&mut rng);
        let mut grown = masks.union();
        for _ in 0..rng.range(1, 6) {
            let w = rng.range(10, 80);
            let h = rng.range(10, 80);
            let x = rng.range(0, PAGE_W - w);
            let y = rng.range(0, PAGE_H - h);
            grown.fill_rect(x, y, w, h);
        }

        let before = IntegralMask::build(&masks.union());
        let after = IntegralMask::build(&grown);

        for &size in &[90u32, 140, 220] {
            let mut y = 40;
            while y + size + 40 <= PAGE_H {
                let mut x = 40;
                while x + size + 40 <= PAGE_W {
                    assert!(
                        after.square_fraction(x, y, size) >= before.square_fraction(x, y, size),
                        "seed {seed}: growth lowered overlap at ({x},{y},{size})"
                    );
                    x += 64;
                }
                y += 64;
            }
        }
    }
}
