// Stamp assets: the resized-stamp cache and the piece-number caption.

pub mod compositor;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use image::RgbaImage;
use image::imageops::FilterType;

use crate::error::{Result, StampwiseError};

/// Caption drawn under the stamp: a fixed header line and the piece number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub header: String,
    pub number: String,
}

impl Caption {
    /// `"Pièce n°"` over `"{prefix}-{number}"`; the dash is dropped when the
    /// prefix is empty.
    pub fn new(prefix: &str, number: u32) -> Self {
        let number = if prefix.is_empty() {
            number.to_string()
        } else {
            format!("{prefix}-{number}")
        };
        Self {
            header: "Pièce n°".to_string(),
            number,
        }
    }
}

/// The stamp image plus its resized variants, cached by side length.
/// Shared read-only across page workers; the cache map takes a lock, the
/// locator core never does.
pub struct StampCache {
    source: RgbaImage,
    resized: Mutex<HashMap<u32, Arc<RgbaImage>>>,
}

impl StampCache {
    pub fn load(path: &Path) -> Result<Self> {
        let source = image::open(path)
            .map_err(|e| {
                StampwiseError::composite(format!("cannot load stamp {}: {e}", path.display()))
            })?
            .to_rgba8();
        if source.width() == 0 || source.height() == 0 {
            return Err(StampwiseError::composite(format!(
                "stamp {} is zero-sized",
                path.display()
            )));
        }
        Ok(Self {
            source,
            resized: Mutex::new(HashMap::new()),
        })
    }

    #[cfg(test)]
    pub(crate) fn from_image(source: RgbaImage) -> Self {
        Self {
            source,
            resized: Mutex::new(HashMap::new()),
        }
    }

    /// The stamp scaled to exactly `size x size` pixels.
    pub fn at_size(&self, size: u32) -> Arc<RgbaImage> {
        let mut cache = self.resized.lock().expect("stamp cache poisoned");
        cache
            .entry(size)
            .or_insert_with(|| {
                Arc::new(image::imageops::resize(
                    &self.source,
                    size,
                    size,
                    FilterType::Lanczos3,
                ))
            })
            .clone()
    }
}
