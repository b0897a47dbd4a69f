use thiserror::Error;

#[derive(Debug, Error)]
pub enum StampwiseError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    #[error("Page too small: {width}x{height} px cannot hold a {min_side} px stamp zone")]
    PageTooSmall {
        width: u32,
        height: u32,
        /// Smallest stamp size plus twice the page margin, in working-DPI pixels.
        min_side: u32,
    },

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Composite error: {0}")]
    CompositeError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StampwiseError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_raster(msg: impl Into<String>) -> Self {
        Self::InvalidRaster(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::RenderError(msg.into())
    }

    pub fn composite(msg: impl Into<String>) -> Self {
        Self::CompositeError(msg.into())
    }

    pub fn pdf_write(msg: impl Into<String>) -> Self {
        Self::PdfWriteError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, StampwiseError>;
