use crate::error::DenoiseError;
use crate::filter::{ensure_non_empty, Denoiser, WindowSize};
use image::GrayImage;
use imageproc::filter::median_filter;

/// Standard median filter
/// Replaces every pixel with the median of its window
pub struct MedianFilter;

/// Median of every pixel's window, with edge pixels replicated past the border.
///
/// This is the neighborhood primitive shared by the standard and switching
/// filters, so both see identical values at the image edges.
pub fn neighborhood_median(image: &GrayImage, window: WindowSize) -> GrayImage {
    median_filter(image, window.radius(), window.radius())
}

impl Denoiser for MedianFilter {
    fn name(&self) -> &'static str {
        "median"
    }

    fn description(&self) -> &'static str {
        "Standard median filter applied to every pixel"
    }

    fn apply(&self, image: &GrayImage, window: WindowSize) -> Result<GrayImage, DenoiseError> {
        ensure_non_empty(image)?;
        Ok(neighborhood_median(image, window))
    }
}
