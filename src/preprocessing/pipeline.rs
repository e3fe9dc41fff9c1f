use crate::error::DenoiseError;
use image::{DynamicImage, GrayImage};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use super::steps;

/// Side length of the evaluation image when no size is requested
pub const DEFAULT_SIDE: u32 = 512;

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Preprocessed image (not serialized)
    #[serde(skip)]
    pub image: GrayImage,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Preprocessing pipeline: grayscale, then an optional fixed-size resize
#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    target: Option<(u32, u32)>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::resized(DEFAULT_SIDE, DEFAULT_SIDE)
    }
}

impl Pipeline {
    /// Grayscale and resize to `width` x `height`
    pub fn resized(width: u32, height: u32) -> Self {
        Self {
            target: Some((width, height)),
        }
    }

    /// Grayscale only, keeping the native resolution
    pub fn native() -> Self {
        Self { target: None }
    }

    /// Decode an image file and run it through the pipeline
    pub fn load(&self, path: &Path) -> Result<PreprocessingResult, DenoiseError> {
        let image = image::open(path).map_err(|e| {
            DenoiseError::ImageDecode(format!("{}: {}", path.display(), e))
        })?;
        self.process(image)
    }

    /// Decode an in-memory image and run it through the pipeline
    pub fn load_from_memory(&self, bytes: &[u8]) -> Result<PreprocessingResult, DenoiseError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| DenoiseError::ImageDecode(e.to_string()))?;
        self.process(image)
    }

    /// Process an image according to the configured target size
    pub fn process(&self, image: DynamicImage) -> Result<PreprocessingResult, DenoiseError> {
        let start = Instant::now();
        let mut steps_timing = Vec::new();

        let mut img = self.run_step("grayscale", &mut steps_timing, || {
            steps::grayscale::apply(image)
        })?;

        if let Some((width, height)) = self.target {
            img = self.run_step("resize", &mut steps_timing, || {
                steps::resize::apply(img, width, height)
            })?;
        }

        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(DenoiseError::InvalidDimensions { width, height });
        }

        Ok(PreprocessingResult {
            image: img,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: steps_timing,
        })
    }

    fn run_step<F>(
        &self,
        name: &str,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<GrayImage, DenoiseError>
    where
        F: FnOnce() -> Result<GrayImage, DenoiseError>,
    {
        let step_start = Instant::now();
        let result = step_fn()?;
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_default_pipeline_normalizes_to_512_gray() {
        let img = RgbImage::from_pixel(200, 100, Rgb([10, 200, 30]));
        let result = Pipeline::default()
            .process(DynamicImage::ImageRgb8(img))
            .unwrap();

        assert_eq!(result.image.dimensions(), (512, 512));
        let names: Vec<&str> = result.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["grayscale", "resize"]);
    }

    #[test]
    fn test_native_pipeline_keeps_size() {
        let img = RgbImage::new(37, 21);
        let result = Pipeline::native()
            .process(DynamicImage::ImageRgb8(img))
            .unwrap();

        assert_eq!(result.image.dimensions(), (37, 21));
        assert_eq!(result.steps.len(), 1);
    }

    #[test]
    fn test_pipeline_rejects_empty_image() {
        let img = RgbImage::new(0, 0);
        let result = Pipeline::native().process(DynamicImage::ImageRgb8(img));
        assert!(matches!(
            result,
            Err(DenoiseError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_load_from_memory_rejects_garbage() {
        let result = Pipeline::default().load_from_memory(b"not an image");
        assert!(matches!(result, Err(DenoiseError::ImageDecode(_))));
    }
}
