//! Image-to-tensor preprocessing.
//!
//! The preprocessor turns one decoded image into the network's input tensor
//! through a fixed stage order:
//!
//! 1. Channel conversion (drop alpha, replicate gray, or reorder)
//! 2. Resize to the exact network geometry, stretching both axes
//! 3. 8-bit to float conversion
//! 4. Scaling by a configurable factor
//! 5. Mean subtraction, disabled by default
//! 6. Planar write into the engine's input buffer
//!
//! Stages 3 through 6 are fused into one write loop: each sample is read from
//! the resized image, converted, scaled, adjusted, and stored at its final
//! planar position in a single pass. No float staging buffer exists between
//! the resized image and the engine's input tensor. The channel reorder from
//! stage 1 is folded into the write as a plane-to-source-channel mapping.

use crate::core::constants::DEFAULT_PIXEL_SCALE;
use crate::core::errors::{ClassifierError, ClassifierResult};
use crate::processors::types::{ChannelConversion, ChannelOrder, MeanSubtraction};
use crate::tensor::{InputPlanes, NetworkGeometry};
use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array3;
use tracing::debug;

/// Configuration for the preprocessing pipeline.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Order the network's input planes are written in.
    pub channel_order: ChannelOrder,
    /// Interpolation filter used when resizing to the network geometry.
    pub resize_filter: FilterType,
    /// Multiplier applied to every sample after the 8-bit to float
    /// conversion.
    pub pixel_scale: f32,
    /// Mean adjustment applied after scaling.
    pub mean: MeanSubtraction,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            channel_order: ChannelOrder::default(),
            resize_filter: FilterType::Triangle,
            pixel_scale: DEFAULT_PIXEL_SCALE,
            mean: MeanSubtraction::default(),
        }
    }
}

/// Prepares decoded images for one network geometry.
///
/// A preprocessor is built once per loaded model and reused for every
/// classification. It owns no pixel storage; all float output goes through
/// the [`InputPlanes`] handed to [`Preprocessor::run`].
#[derive(Debug)]
pub struct Preprocessor {
    geometry: NetworkGeometry,
    channel_order: ChannelOrder,
    resize_filter: FilterType,
    scale: f32,
    /// Per-plane constant subtracted after scaling. All zeros when mean
    /// subtraction is disabled or per-pixel.
    offsets: Vec<f32>,
    /// Full `[C, H, W]` mean image, when configured.
    pixel_mean: Option<Array3<f32>>,
}

impl Preprocessor {
    /// Creates a preprocessor for the given geometry.
    ///
    /// # Arguments
    ///
    /// * `config` - Scaling, ordering, and mean adjustment settings.
    /// * `geometry` - The input shape of the loaded model.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::ConfigError`] if the scale is not a
    /// positive finite number or the mean adjustment does not match the
    /// geometry.
    pub fn new(config: PreprocessConfig, geometry: NetworkGeometry) -> ClassifierResult<Self> {
        if !config.pixel_scale.is_finite() || config.pixel_scale <= 0.0 {
            return Err(ClassifierError::config_error(format!(
                "pixel scale must be a positive finite number, got {}",
                config.pixel_scale
            )));
        }
        config.mean.validate(&geometry)?;

        debug!(
            geometry = %geometry,
            order = ?config.channel_order,
            scale = config.pixel_scale,
            mean_enabled = config.mean.is_enabled(),
            "preprocessor configured"
        );

        let offsets = match &config.mean {
            MeanSubtraction::PerChannel(values) => values.clone(),
            _ => vec![0.0; geometry.channels()],
        };
        let pixel_mean = match config.mean {
            MeanSubtraction::PerPixel(mean) => Some(mean),
            _ => None,
        };

        Ok(Self {
            geometry,
            channel_order: config.channel_order,
            resize_filter: config.resize_filter,
            scale: config.pixel_scale,
            offsets,
            pixel_mean,
        })
    }

    /// The geometry this preprocessor writes for.
    pub fn geometry(&self) -> NetworkGeometry {
        self.geometry
    }

    /// Runs the full preprocessing pipeline for one image.
    ///
    /// Every float in the planes is overwritten; nothing from the previous
    /// image survives.
    ///
    /// # Arguments
    ///
    /// * `image` - The decoded image to classify.
    /// * `planes` - Per-channel views over the engine's input buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::UnsupportedChannelConversion`] when no rule
    /// maps the image layout onto the network input, and
    /// [`ClassifierError::InvalidInput`] when the planes do not match the
    /// preprocessor's geometry.
    pub fn run(&self, image: &DynamicImage, planes: &mut InputPlanes<'_>) -> ClassifierResult<()> {
        if planes.channel_count() != self.geometry.channels()
            || planes.plane_len() != self.geometry.plane_len()
        {
            return Err(ClassifierError::invalid_input(format!(
                "plane layout {}x{} does not match preprocessor geometry {}",
                planes.channel_count(),
                planes.plane_len(),
                self.geometry
            )));
        }

        let source_channels = image.color().channel_count() as usize;
        let conversion = ChannelConversion::resolve(source_channels, self.geometry.channels())?;
        debug!(
            conversion = %conversion,
            source = format!("{}x{}x{}", source_channels, image.height(), image.width()),
            target = %self.geometry,
            "preprocessing image"
        );

        match self.geometry.channels() {
            3 => self.write_color(image, planes),
            1 => self.write_gray(image, planes),
            other => Err(ClassifierError::config_error(format!(
                "geometry with {} channels cannot be preprocessed",
                other
            ))),
        }
    }

    fn write_color(
        &self,
        image: &DynamicImage,
        planes: &mut InputPlanes<'_>,
    ) -> ClassifierResult<()> {
        let width = self.geometry.width();
        let height = self.geometry.height();

        // to_rgb8 drops alpha and replicates gray, so every supported source
        // layout lands in the same interleaved RGB form.
        let rgb = image.to_rgb8();
        let resized = if rgb.dimensions() == (width, height) {
            rgb
        } else {
            image::imageops::resize(&rgb, width, height, self.resize_filter)
        };

        let row = width as usize;
        let mapping = self.channel_order.mapping();
        for (plane_idx, &source) in mapping.iter().enumerate() {
            let plane = planes.plane_mut(plane_idx)?;
            match &self.pixel_mean {
                Some(mean) => {
                    for y in 0..height {
                        for x in 0..width {
                            let sample = resized.get_pixel(x, y)[source] as f32;
                            plane[y as usize * row + x as usize] = sample * self.scale
                                - mean[[plane_idx, y as usize, x as usize]];
                        }
                    }
                }
                None => {
                    let offset = self.offsets[plane_idx];
                    for y in 0..height {
                        for x in 0..width {
                            let sample = resized.get_pixel(x, y)[source] as f32;
                            plane[y as usize * row + x as usize] = sample * self.scale - offset;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn write_gray(
        &self,
        image: &DynamicImage,
        planes: &mut InputPlanes<'_>,
    ) -> ClassifierResult<()> {
        let width = self.geometry.width();
        let height = self.geometry.height();

        let gray = image.to_luma8();
        let resized = if gray.dimensions() == (width, height) {
            gray
        } else {
            image::imageops::resize(&gray, width, height, self.resize_filter)
        };

        let row = width as usize;
        let plane = planes.plane_mut(0)?;
        match &self.pixel_mean {
            Some(mean) => {
                for y in 0..height {
                    for x in 0..width {
                        let sample = resized.get_pixel(x, y)[0] as f32;
                        plane[y as usize * row + x as usize] =
                            sample * self.scale - mean[[0, y as usize, x as usize]];
                    }
                }
            }
            None => {
                let offset = self.offsets[0];
                for y in 0..height {
                    for x in 0..width {
                        let sample = resized.get_pixel(x, y)[0] as f32;
                        plane[y as usize * row + x as usize] = sample * self.scale - offset;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::InputTensor;
    use image::{GrayImage, Luma, LumaA, Rgb, RgbImage, Rgba, RgbaImage};
    use ndarray::Array3;

    fn geometry(channels: usize, width: u32, height: u32) -> NetworkGeometry {
        NetworkGeometry::new(channels, width, height).unwrap()
    }

    fn unit_scale(channel_order: ChannelOrder) -> PreprocessConfig {
        PreprocessConfig {
            channel_order,
            pixel_scale: 1.0,
            ..PreprocessConfig::default()
        }
    }

    /// Runs the full pipeline into a fresh tensor, including the post-write
    /// aliasing check the classifier performs.
    fn preprocess_into_tensor(
        config: PreprocessConfig,
        geometry: NetworkGeometry,
        image: &DynamicImage,
    ) -> ClassifierResult<InputTensor> {
        let preprocessor = Preprocessor::new(config, geometry)?;
        let mut tensor = InputTensor::new(geometry);
        let base = tensor.base_ptr();
        {
            let mut planes = tensor.planes_mut()?;
            preprocessor.run(image, &mut planes)?;
            planes.verify_aliasing(base)?;
        }
        Ok(tensor)
    }

    fn solid_rgb(width: u32, height: u32, pixel: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(pixel)))
    }

    #[test]
    fn test_bgr_reorder_without_resize() {
        let image = solid_rgb(2, 2, [10, 20, 30]);
        let tensor =
            preprocess_into_tensor(unit_scale(ChannelOrder::Bgr), geometry(3, 2, 2), &image)
                .unwrap();
        let view = tensor.view();
        assert_eq!(view[[0, 0, 0, 0]], 30.0);
        assert_eq!(view[[0, 1, 1, 0]], 20.0);
        assert_eq!(view[[0, 2, 1, 1]], 10.0);
    }

    #[test]
    fn test_rgb_order_preserves_channels() {
        let image = solid_rgb(2, 2, [10, 20, 30]);
        let tensor =
            preprocess_into_tensor(unit_scale(ChannelOrder::Rgb), geometry(3, 2, 2), &image)
                .unwrap();
        let view = tensor.view();
        assert_eq!(view[[0, 0, 0, 0]], 10.0);
        assert_eq!(view[[0, 1, 0, 0]], 20.0);
        assert_eq!(view[[0, 2, 0, 0]], 30.0);
    }

    #[test]
    fn test_default_scale_multiplies_samples() {
        let image = solid_rgb(2, 2, [0, 0, 2]);
        let tensor =
            preprocess_into_tensor(PreprocessConfig::default(), geometry(3, 2, 2), &image)
                .unwrap();
        // Default order is BGR, so the blue sample lands in plane 0.
        assert_eq!(tensor.view()[[0, 0, 0, 0]], 2.0 * DEFAULT_PIXEL_SCALE);
    }

    #[test]
    fn test_alpha_channel_dropped() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 200])));
        let tensor =
            preprocess_into_tensor(unit_scale(ChannelOrder::Bgr), geometry(3, 2, 2), &image)
                .unwrap();
        let view = tensor.view();
        assert_eq!(view[[0, 0, 0, 0]], 30.0);
        assert_eq!(view[[0, 1, 0, 0]], 20.0);
        assert_eq!(view[[0, 2, 0, 0]], 10.0);
    }

    #[test]
    fn test_gray_replicated_across_planes() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([7])));
        let tensor =
            preprocess_into_tensor(unit_scale(ChannelOrder::Bgr), geometry(3, 2, 2), &image)
                .unwrap();
        let view = tensor.view();
        for channel in 0..3 {
            assert_eq!(view[[0, channel, 1, 1]], 7.0);
        }
    }

    #[test]
    fn test_gray_passthrough_row_major() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_fn(3, 2, |x, y| {
            Luma([(y * 3 + x) as u8])
        }));
        let tensor =
            preprocess_into_tensor(unit_scale(ChannelOrder::Bgr), geometry(1, 3, 2), &image)
                .unwrap();
        let view = tensor.view();
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(view[[0, 0, y, x]], (y * 3 + x) as f32);
            }
        }
    }

    #[test]
    fn test_color_to_gray_rejected() {
        let rgb = solid_rgb(2, 2, [1, 2, 3]);
        let result = preprocess_into_tensor(unit_scale(ChannelOrder::Bgr), geometry(1, 2, 2), &rgb);
        assert!(matches!(
            result,
            Err(ClassifierError::UnsupportedChannelConversion { from: 3, to: 1 })
        ));

        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])));
        let result =
            preprocess_into_tensor(unit_scale(ChannelOrder::Bgr), geometry(1, 2, 2), &rgba);
        assert!(matches!(
            result,
            Err(ClassifierError::UnsupportedChannelConversion { from: 4, to: 1 })
        ));
    }

    #[test]
    fn test_two_channel_source_rejected() {
        let image = DynamicImage::ImageLumaA8(image::ImageBuffer::from_pixel(
            2,
            2,
            LumaA([9, 255]),
        ));
        let result =
            preprocess_into_tensor(unit_scale(ChannelOrder::Bgr), geometry(3, 2, 2), &image);
        assert!(matches!(
            result,
            Err(ClassifierError::UnsupportedChannelConversion { from: 2, to: 3 })
        ));
    }

    #[test]
    fn test_resize_to_network_geometry() {
        let image = solid_rgb(4, 4, [10, 20, 30]);
        let tensor =
            preprocess_into_tensor(unit_scale(ChannelOrder::Bgr), geometry(3, 2, 2), &image)
                .unwrap();
        let view = tensor.view();
        // A constant image stays constant under any interpolation.
        for channel in 0..3 {
            for y in 0..2 {
                for x in 0..2 {
                    assert_eq!(view[[0, channel, y, x]], [30.0, 20.0, 10.0][channel]);
                }
            }
        }
    }

    #[test]
    fn test_resize_stretches_instead_of_cropping() {
        // Left half red, right half blue. A crop would lose one half; the
        // stretch keeps red on the left of the output and blue on the right.
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        }));
        let tensor =
            preprocess_into_tensor(unit_scale(ChannelOrder::Rgb), geometry(3, 2, 2), &image)
                .unwrap();
        let view = tensor.view();
        assert!(view[[0, 0, 0, 0]] > view[[0, 0, 0, 1]]);
        assert!(view[[0, 2, 0, 1]] > view[[0, 2, 0, 0]]);
    }

    #[test]
    fn test_non_square_geometry() {
        let image = solid_rgb(5, 3, [10, 20, 30]);
        let tensor =
            preprocess_into_tensor(unit_scale(ChannelOrder::Bgr), geometry(3, 2, 4), &image)
                .unwrap();
        let view = tensor.view();
        assert_eq!(view.shape(), &[1, 3, 4, 2]);
        assert_eq!(view[[0, 0, 3, 1]], 30.0);
    }

    #[test]
    fn test_repeated_runs_overwrite_and_stay_aliased() {
        let geom = geometry(3, 2, 2);
        let preprocessor = Preprocessor::new(unit_scale(ChannelOrder::Rgb), geom).unwrap();
        let mut tensor = InputTensor::new(geom);
        let base = tensor.base_ptr();
        let first = solid_rgb(2, 2, [1, 2, 3]);
        let second = solid_rgb(2, 2, [200, 100, 50]);

        let snapshot = |tensor: &InputTensor| -> Vec<f32> {
            tensor.view().iter().copied().collect()
        };

        let run = |tensor: &mut InputTensor, image: &DynamicImage| {
            let mut planes = tensor.planes_mut().unwrap();
            preprocessor.run(image, &mut planes).unwrap();
            planes.verify_aliasing(base).unwrap();
        };

        run(&mut tensor, &first);
        let after_first = snapshot(&tensor);
        run(&mut tensor, &second);
        assert_ne!(snapshot(&tensor), after_first);
        run(&mut tensor, &first);
        assert_eq!(snapshot(&tensor), after_first);
    }

    #[test]
    fn test_mean_per_channel_applied_after_scaling() {
        let image = solid_rgb(2, 2, [10, 20, 30]);
        let config = PreprocessConfig {
            channel_order: ChannelOrder::Bgr,
            pixel_scale: 1.0,
            mean: MeanSubtraction::PerChannel(vec![1.0, 2.0, 3.0]),
            ..PreprocessConfig::default()
        };
        let tensor = preprocess_into_tensor(config, geometry(3, 2, 2), &image).unwrap();
        let view = tensor.view();
        assert_eq!(view[[0, 0, 0, 0]], 29.0);
        assert_eq!(view[[0, 1, 0, 0]], 18.0);
        assert_eq!(view[[0, 2, 0, 0]], 7.0);
    }

    #[test]
    fn test_mean_per_pixel_applied() {
        let image = solid_rgb(2, 1, [5, 5, 5]);
        let mean = Array3::from_shape_fn((3, 1, 2), |(c, _, x)| (c * 10 + x) as f32);
        let config = PreprocessConfig {
            channel_order: ChannelOrder::Bgr,
            pixel_scale: 1.0,
            mean: MeanSubtraction::PerPixel(mean),
            ..PreprocessConfig::default()
        };
        let tensor = preprocess_into_tensor(config, geometry(3, 2, 1), &image).unwrap();
        let view = tensor.view();
        assert_eq!(view[[0, 0, 0, 0]], 5.0);
        assert_eq!(view[[0, 0, 0, 1]], 4.0);
        assert_eq!(view[[0, 2, 0, 1]], 5.0 - 21.0);
    }

    #[test]
    fn test_mean_arity_rejected_at_construction() {
        let config = PreprocessConfig {
            mean: MeanSubtraction::PerChannel(vec![1.0]),
            ..PreprocessConfig::default()
        };
        let result = Preprocessor::new(config, geometry(3, 2, 2));
        assert!(matches!(result, Err(ClassifierError::ConfigError { .. })));
    }

    #[test]
    fn test_scale_must_be_positive_finite() {
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let config = PreprocessConfig {
                pixel_scale: scale,
                ..PreprocessConfig::default()
            };
            let result = Preprocessor::new(config, geometry(3, 2, 2));
            assert!(matches!(result, Err(ClassifierError::ConfigError { .. })));
        }
    }

    #[test]
    fn test_plane_layout_mismatch_rejected() {
        let preprocessor =
            Preprocessor::new(unit_scale(ChannelOrder::Bgr), geometry(3, 2, 2)).unwrap();
        let mut tensor = InputTensor::new(geometry(1, 2, 2));
        let mut planes = tensor.planes_mut().unwrap();
        let image = solid_rgb(2, 2, [1, 2, 3]);
        let result = preprocessor.run(&image, &mut planes);
        assert!(matches!(result, Err(ClassifierError::InvalidInput { .. })));
    }

    #[test]
    fn test_default_config_values() {
        let config = PreprocessConfig::default();
        assert_eq!(config.channel_order, ChannelOrder::Bgr);
        assert_eq!(config.pixel_scale, DEFAULT_PIXEL_SCALE);
        assert_eq!(config.mean, MeanSubtraction::Disabled);
        assert!(matches!(config.resize_filter, FilterType::Triangle));
    }
}
