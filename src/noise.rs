//! Salt-and-pepper noise: synthetic injection and exact-value detection

use crate::error::DenoiseError;
use crate::filter::ensure_non_empty;
use image::{GrayImage, Luma};
use rand::Rng;

/// Intensity written by pepper noise
pub const PEPPER: u8 = 0;
/// Intensity written by salt noise
pub const SALT: u8 = 255;

/// True when a sample sits at one of the two impulse extremes
#[inline]
pub fn is_impulse(value: u8) -> bool {
    value == PEPPER || value == SALT
}

/// Per-pixel impulse flags, laid out row-major like the source image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseMask {
    width: u32,
    flags: Vec<bool>,
}

impl NoiseMask {
    /// Flag every pixel that is exactly 0 or exactly 255.
    ///
    /// Clean pixels whose true intensity happens to be 0 or 255 are flagged
    /// too; exact-value matching cannot tell them apart from impulses.
    pub fn detect(image: &GrayImage) -> Self {
        let flags = image.pixels().map(|p| is_impulse(p.0[0])).collect();
        Self {
            width: image.width(),
            flags,
        }
    }

    pub fn is_noise(&self, x: u32, y: u32) -> bool {
        self.flags[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Number of flagged pixels
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// Share of flagged pixels in 0.0..=1.0
    pub fn fraction(&self) -> f64 {
        if self.flags.is_empty() {
            return 0.0;
        }
        self.count() as f64 / self.flags.len() as f64
    }
}

/// Corrupt a copy of `image` with salt-and-pepper noise.
///
/// `ceil(density * pixels / 2)` positions are drawn uniformly with
/// replacement and set to white, then the same number are drawn and set to
/// black. Repeated draws and pepper landing on salt mean the corrupted
/// fraction can come out below `density`.
pub fn salt_and_pepper<R: Rng>(
    image: &GrayImage,
    density: f64,
    rng: &mut R,
) -> Result<GrayImage, DenoiseError> {
    if !density.is_finite() || !(0.0..=1.0).contains(&density) {
        return Err(DenoiseError::InvalidDensity(density));
    }
    ensure_non_empty(image)?;

    let (width, height) = image.dimensions();
    let pixels = width as f64 * height as f64;
    let per_kind = (density * pixels * 0.5).ceil() as usize;

    let mut noisy = image.clone();
    for value in [SALT, PEPPER] {
        for _ in 0..per_kind {
            let x = rng.gen_range(0..width);
            let y = rng.gen_range(0..height);
            noisy.put_pixel(x, y, Luma([value]));
        }
    }

    tracing::debug!(
        density,
        per_kind,
        "Injected salt-and-pepper noise into {}x{} image",
        width,
        height
    );

    Ok(noisy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gradient(width: u32, height: u32) -> GrayImage {
        // Values stay within 1..=254 so nothing starts out flagged
        GrayImage::from_fn(width, height, |x, y| Luma([(1 + (x + y) % 254) as u8]))
    }

    #[test]
    fn test_detect_flags_only_extremes() {
        let mut img = GrayImage::from_pixel(4, 3, Luma([1]));
        img.put_pixel(0, 0, Luma([0]));
        img.put_pixel(3, 2, Luma([255]));
        img.put_pixel(1, 1, Luma([254]));

        let mask = NoiseMask::detect(&img);

        assert!(mask.is_noise(0, 0));
        assert!(mask.is_noise(3, 2));
        assert!(!mask.is_noise(1, 1));
        assert_eq!(mask.count(), 2);
        assert!((mask.fraction() - 2.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_salt_and_pepper_is_reproducible() {
        let img = gradient(32, 24);
        let a = salt_and_pepper(&img, 0.3, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = salt_and_pepper(&img, 0.3, &mut StdRng::seed_from_u64(7)).unwrap();
        let c = salt_and_pepper(&img, 0.3, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_salt_and_pepper_leaves_input_untouched() {
        let img = gradient(16, 16);
        let before = img.clone();
        let _ = salt_and_pepper(&img, 0.9, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn test_salt_and_pepper_zero_density_is_identity() {
        let img = gradient(16, 16);
        let noisy = salt_and_pepper(&img, 0.0, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(noisy, img);
    }

    #[test]
    fn test_salt_and_pepper_only_writes_extremes() {
        let img = gradient(64, 64);
        let noisy = salt_and_pepper(&img, 0.5, &mut StdRng::seed_from_u64(3)).unwrap();

        let mask = NoiseMask::detect(&noisy);
        for (x, y, p) in noisy.enumerate_pixels() {
            if !mask.is_noise(x, y) {
                assert_eq!(p, img.get_pixel(x, y));
            }
        }
        // Drawing with replacement loses some hits, but not half of them
        let fraction = mask.fraction();
        assert!(fraction > 0.3 && fraction <= 0.5, "fraction {}", fraction);
    }

    #[test]
    fn test_salt_and_pepper_rejects_bad_density() {
        let img = gradient(4, 4);
        let mut rng = StdRng::seed_from_u64(0);
        for density in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                salt_and_pepper(&img, density, &mut rng),
                Err(DenoiseError::InvalidDensity(_))
            ));
        }
    }
}
