use crate::error::DenoiseError;
use image::GrayImage;
use serde::Serialize;
use std::fmt;

/// Side length of the square neighborhood a filter looks at.
///
/// Always odd and within `1..=MAX`, so every window has a center pixel.
/// A size of 1 is a valid no-op window. Windows wider than the image are
/// fine; edges are replicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WindowSize(u32);

impl WindowSize {
    /// Window size used when none is requested
    pub const DEFAULT: WindowSize = WindowSize(3);
    /// Largest accepted side length; per-pixel cost grows with the side
    pub const MAX: u32 = 255;

    pub fn new(size: u32) -> Result<Self, DenoiseError> {
        if size == 0 || size % 2 == 0 || size > Self::MAX {
            return Err(DenoiseError::InvalidWindowSize(size));
        }
        Ok(Self(size))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Distance from the center pixel to the window edge (`imageproc` radius)
    pub fn radius(&self) -> u32 {
        self.0 / 2
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.0, self.0)
    }
}

/// Trait that all restoration filters must implement
pub trait Denoiser: Send + Sync {
    /// Returns the filter identifier (e.g., "mean", "switching")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the filter
    fn description(&self) -> &'static str;

    /// Restore a grayscale image, returning a new image of the same shape
    fn apply(&self, image: &GrayImage, window: WindowSize) -> Result<GrayImage, DenoiseError>;
}

/// Reject images with a zero dimension before any filtering work starts
pub fn ensure_non_empty(image: &GrayImage) -> Result<(), DenoiseError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DenoiseError::InvalidDimensions { width, height });
    }
    Ok(())
}
