use crate::error::DenoiseError;
use crate::filter::{ensure_non_empty, Denoiser, WindowSize};
use image::{GrayImage, Luma};

/// Linear averaging (box) filter
///
/// Every pixel becomes the unweighted mean of its window, noise or not,
/// rounded to the nearest integer.
pub struct MeanFilter;

impl Denoiser for MeanFilter {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn description(&self) -> &'static str {
        "Box filter: unweighted mean over the square window"
    }

    fn apply(&self, image: &GrayImage, window: WindowSize) -> Result<GrayImage, DenoiseError> {
        ensure_non_empty(image)?;
        Ok(box_mean(image, window))
    }
}

/// Rounded window mean with edge pixels repeated past the border
///
/// Sums are kept exact through both passes and divided once at the end.
fn box_mean(image: &GrayImage, window: WindowSize) -> GrayImage {
    let (width, height) = image.dimensions();
    let r = window.radius() as i64;
    let w = width as usize;

    // Horizontal pass: window sums along each row
    let mut row_sums = vec![0u32; w * height as usize];
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0u32;
            for dx in -r..=r {
                let sx = (x as i64 + dx).clamp(0, width as i64 - 1) as u32;
                sum += image.get_pixel(sx, y).0[0] as u32;
            }
            row_sums[y as usize * w + x as usize] = sum;
        }
    }

    // Vertical pass over the row sums, then round to nearest
    let area = window.get() * window.get();
    GrayImage::from_fn(width, height, |x, y| {
        let mut sum = 0u32;
        for dy in -r..=r {
            let sy = (y as i64 + dy).clamp(0, height as i64 - 1) as usize;
            sum += row_sums[sy * w + x as usize];
        }
        Luma([((sum + area / 2) / area) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Direct per-pixel mean over the clamped window
    fn reference_mean(image: &GrayImage, window: WindowSize) -> GrayImage {
        let r = window.radius() as i64;
        let (width, height) = image.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            let mut sum = 0.0f64;
            for dy in -r..=r {
                for dx in -r..=r {
                    let sx = (x as i64 + dx).clamp(0, width as i64 - 1) as u32;
                    let sy = (y as i64 + dy).clamp(0, height as i64 - 1) as u32;
                    sum += image.get_pixel(sx, sy).0[0] as f64;
                }
            }
            let n = (window.get() * window.get()) as f64;
            Luma([(sum / n).round() as u8])
        })
    }

    #[test]
    fn test_mean_preserves_uniform_image() {
        let img = GrayImage::from_pixel(8, 6, Luma([77]));
        let result = MeanFilter.apply(&img, WindowSize::DEFAULT).unwrap();
        assert_eq!(result, img);
    }

    #[test]
    fn test_mean_rounds_to_nearest() {
        // Eight 101s and a 100: mean 100.89
        let mut img = GrayImage::from_pixel(3, 3, Luma([101]));
        img.put_pixel(1, 1, Luma([100]));

        let result = MeanFilter.apply(&img, WindowSize::DEFAULT).unwrap();

        assert_eq!(result.get_pixel(1, 1).0[0], 101);
    }

    #[test]
    fn test_mean_matches_direct_average() {
        let mut rng = StdRng::seed_from_u64(21);
        let img = GrayImage::from_fn(17, 11, |_, _| Luma([rng.gen_range(0..=255u8)]));

        for size in [1, 3, 5, 9, 31] {
            let window = WindowSize::new(size).unwrap();
            assert_eq!(
                MeanFilter.apply(&img, window).unwrap(),
                reference_mean(&img, window),
                "window {}",
                window
            );
        }
    }

    #[test]
    fn test_mean_spreads_impulse_into_neighbors() {
        let mut img = GrayImage::from_pixel(9, 9, Luma([100]));
        img.put_pixel(4, 4, Luma([255]));

        let result = MeanFilter.apply(&img, WindowSize::DEFAULT).unwrap();

        // (8 * 100 + 255) / 9 = 117.2; the impulse is blurred, not removed
        assert_eq!(result.get_pixel(4, 4).0[0], 117);
        assert_eq!(result.get_pixel(3, 4).0[0], 117);
        assert_eq!(result.get_pixel(0, 0).0[0], 100);
    }

    #[test]
    fn test_mean_rejects_empty_image() {
        let img = GrayImage::new(0, 0);
        assert!(matches!(
            MeanFilter.apply(&img, WindowSize::DEFAULT),
            Err(DenoiseError::InvalidDimensions { .. })
        ));
    }
}
