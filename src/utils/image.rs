//! Image loading utilities.

use crate::core::errors::{ClassifierError, ClassifierResult};
use image::DynamicImage;
use std::path::Path;

/// Loads an image from disk, preserving its decoded channel layout.
///
/// The channel count of the returned image decides which conversion rule the
/// preprocessor applies, so no conversion to a fixed layout happens here.
/// Gray stays gray, RGBA keeps its alpha until the preprocessor drops it.
///
/// # Arguments
///
/// * `path` - Path to the image file.
///
/// # Errors
///
/// Returns [`ClassifierError::ImageLoad`] if the file cannot be opened or
/// decoded.
pub fn load_image(path: &Path) -> ClassifierResult<DynamicImage> {
    image::open(path).map_err(ClassifierError::ImageLoad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_load_image_preserves_rgb_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.png");
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])).save(&path).unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!(image.color().channel_count(), 3);
        assert_eq!(image.width(), 4);
    }

    #[test]
    fn test_load_image_preserves_gray_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        GrayImage::from_pixel(2, 2, Luma([9])).save(&path).unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!(image.color().channel_count(), 1);
    }

    #[test]
    fn test_load_image_missing_file() {
        let result = load_image(Path::new("/nonexistent/path/image.jpg"));
        assert!(matches!(result, Err(ClassifierError::ImageLoad(_))));
    }
}
