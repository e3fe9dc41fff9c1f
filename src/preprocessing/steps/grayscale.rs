use crate::error::DenoiseError;
use image::{DynamicImage, GrayImage};

/// Convert image to 8-bit grayscale
/// Every filter works on a single luma channel in 0..=255
pub fn apply(image: DynamicImage) -> Result<GrayImage, DenoiseError> {
    Ok(image.into_luma8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn test_grayscale_converts_color() {
        let mut img = RgbImage::new(10, 10);
        img.put_pixel(0, 0, Rgb([255, 0, 0])); // Red
        img.put_pixel(1, 0, Rgb([0, 255, 0])); // Green
        img.put_pixel(2, 0, Rgb([255, 255, 255])); // White

        let gray = apply(DynamicImage::ImageRgb8(img)).unwrap();

        assert!(gray.get_pixel(0, 0).0[0] > 0);
        assert!(gray.get_pixel(1, 0).0[0] > gray.get_pixel(0, 0).0[0]);
        assert_eq!(*gray.get_pixel(2, 0), Luma([255]));
        assert_eq!(*gray.get_pixel(3, 0), Luma([0]));
    }

    #[test]
    fn test_grayscale_preserves_dimensions() {
        let img = RgbImage::new(100, 50);
        let gray = apply(DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(gray.dimensions(), (100, 50));
    }
}
