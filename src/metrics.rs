//! Fidelity metrics between a reference image and a restored one

use crate::error::DenoiseError;
use image::GrayImage;
use serde::Serialize;

/// Peak intensity of an 8-bit sample
const MAX_VALUE: f64 = 255.0;

/// MSE and PSNR of one restored image against its reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quality {
    pub mse: f64,
    /// PSNR in dB; infinite for identical images (serialized as `null`)
    pub psnr: f64,
}

impl Quality {
    pub fn measure(original: &GrayImage, restored: &GrayImage) -> Result<Self, DenoiseError> {
        let mse = mse(original, restored)?;
        Ok(Self {
            mse,
            psnr: psnr_from_mse(mse),
        })
    }
}

/// Mean squared error over all pixels
pub fn mse(original: &GrayImage, restored: &GrayImage) -> Result<f64, DenoiseError> {
    if original.dimensions() != restored.dimensions() {
        return Err(DenoiseError::DimensionMismatch {
            expected: original.dimensions(),
            actual: restored.dimensions(),
        });
    }
    let (width, height) = original.dimensions();
    if width == 0 || height == 0 {
        return Err(DenoiseError::InvalidDimensions { width, height });
    }

    let sum: f64 = original
        .as_raw()
        .iter()
        .zip(restored.as_raw())
        .map(|(&a, &b)| {
            let diff = a as f64 - b as f64;
            diff * diff
        })
        .sum();

    Ok(sum / original.as_raw().len() as f64)
}

/// Peak signal-to-noise ratio in dB
fn psnr_from_mse(mse: f64) -> f64 {
    if mse == 0.0 {
        return f64::INFINITY;
    }
    10.0 * (MAX_VALUE * MAX_VALUE / mse).log10()
}
