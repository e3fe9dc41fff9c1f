use crate::error::DenoiseError;
use image::{imageops, imageops::FilterType, GrayImage};

/// Resize to a fixed size so every run is measured on the same pixel count
///
/// Aspect ratio is not preserved. Bilinear sampling keeps the resampled
/// intensities inside the original range.
pub fn apply(image: GrayImage, width: u32, height: u32) -> Result<GrayImage, DenoiseError> {
    if width == 0 || height == 0 {
        return Err(DenoiseError::InvalidDimensions { width, height });
    }

    if image.dimensions() == (width, height) {
        return Ok(image);
    }

    Ok(imageops::resize(&image, width, height, FilterType::Triangle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_resize_to_fixed_size() {
        let img = GrayImage::from_pixel(300, 120, Luma([90]));
        let result = apply(img, 512, 512).unwrap();
        assert_eq!(result.dimensions(), (512, 512));
        assert!(result.pixels().all(|p| (89..=91).contains(&p.0[0])));
    }

    #[test]
    fn test_resize_skips_matching_size() {
        let img = GrayImage::from_fn(64, 32, |x, y| Luma([(x ^ y) as u8]));
        let result = apply(img.clone(), 64, 32).unwrap();
        assert_eq!(result, img);
    }

    #[test]
    fn test_resize_rejects_zero_target() {
        let img = GrayImage::new(8, 8);
        assert!(matches!(
            apply(img, 0, 512),
            Err(DenoiseError::InvalidDimensions { width: 0, height: 512 })
        ));
    }
}
