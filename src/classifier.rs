//! Places365 scene classifier.
//!
//! This module ties the pipeline together: image in, ranked scene categories
//! out. One classifier owns one loaded model, the preprocessor matched to its
//! input geometry, and the ranker. Classification runs preprocess, forward
//! pass, and ranking in order, with the preprocessor writing straight into
//! the engine's input buffer.
//!
//! ```rust,no_run
//! use scene365::classifier::SceneClassifier;
//! use scene365::utils::load_image;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), scene365::core::ClassifierError> {
//! let mut classifier = SceneClassifier::builder()
//!     .top_k(5)
//!     .build(Path::new("models/places365.onnx"))?;
//!
//! let image = load_image(Path::new("beach.jpg"))?;
//! for prediction in classifier.classify(&image)? {
//!     println!("category {:>3}  score {:.4}", prediction.category, prediction.score);
//! }
//! # Ok(())
//! # }
//! ```

use crate::core::constants::{DEFAULT_TOP_K, PLACES365_CATEGORIES};
use crate::core::errors::{ClassifierError, ClassifierResult};
use crate::inference::OrtEngine;
use crate::processors::{
    ChannelOrder, MeanSubtraction, PreprocessConfig, Preprocessor, ScenePrediction, TopK,
};
use crate::tensor::NetworkGeometry;
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;
use tracing::debug;

/// Configuration for the scene classifier.
#[derive(Debug, Clone)]
pub struct SceneClassifierConfig {
    /// Preprocessing settings.
    pub preprocess: PreprocessConfig,
    /// Number of ranked predictions returned per image.
    pub top_k: usize,
    /// Category count the loaded model must declare, or `None` to accept
    /// whatever the model reports.
    pub expected_categories: Option<usize>,
    /// Input tensor to feed, or `None` for the model's first input.
    pub input_name: Option<String>,
    /// Score tensor to read, or `None` for the model's first output.
    pub output_name: Option<String>,
}

impl Default for SceneClassifierConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            top_k: DEFAULT_TOP_K,
            expected_categories: Some(PLACES365_CATEGORIES),
            input_name: None,
            output_name: None,
        }
    }
}

impl SceneClassifierConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the geometry-independent parts of the configuration.
    ///
    /// The preprocessing settings that depend on the model's input shape are
    /// checked later, once the model is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::ConfigError`] if `top_k` is zero and
    /// [`ClassifierError::InsufficientOutputSize`] if the expected category
    /// count cannot satisfy `top_k`.
    pub fn validate(&self) -> ClassifierResult<()> {
        if self.top_k == 0 {
            return Err(ClassifierError::config_error(
                "top_k must be greater than 0",
            ));
        }
        if let Some(expected) = self.expected_categories {
            if expected < self.top_k {
                return Err(ClassifierError::InsufficientOutputSize {
                    required: self.top_k,
                    actual: expected,
                });
            }
        }
        Ok(())
    }
}

/// Classifies still images into the Places365 scene categories.
///
/// A classifier is built once per model and reused across images. It is not
/// safe to share between threads: [`SceneClassifier::classify`] takes
/// `&mut self` because every call rewrites the engine's input buffer in
/// place. Callers that need concurrency wrap the classifier in a mutex or
/// give each thread its own instance.
#[derive(Debug)]
pub struct SceneClassifier {
    engine: OrtEngine,
    preprocessor: Preprocessor,
    ranker: TopK,
}

impl SceneClassifier {
    /// Creates a builder for configuring a scene classifier.
    pub fn builder() -> SceneClassifierBuilder {
        SceneClassifierBuilder::new()
    }

    /// Loads a model and prepares the pipeline around it.
    ///
    /// Loading reads the input geometry and category count from the model,
    /// allocates the input buffer, and validates the configuration against
    /// both. Every failure here is fatal: no partially constructed
    /// classifier is ever returned.
    ///
    /// # Arguments
    ///
    /// * `config` - Pipeline configuration.
    /// * `model_path` - Path to the ONNX model artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::ModelLoad`] if the model cannot be loaded
    /// or declares an unsupported layout, and
    /// [`ClassifierError::InsufficientOutputSize`] if it scores fewer
    /// categories than `top_k` requires.
    pub fn new(config: SceneClassifierConfig, model_path: &Path) -> ClassifierResult<Self> {
        config.validate()?;

        let engine = OrtEngine::load(
            model_path,
            config.input_name.as_deref(),
            config.output_name.as_deref(),
        )?;

        let category_count = engine.category_count();
        if let Some(expected) = config.expected_categories {
            if category_count != expected {
                return Err(ClassifierError::model_load_error(
                    model_path,
                    format!(
                        "model declares {} output categories, expected {}",
                        category_count, expected
                    ),
                    None::<ort::Error>,
                ));
            }
        }
        if category_count < config.top_k {
            return Err(ClassifierError::InsufficientOutputSize {
                required: config.top_k,
                actual: category_count,
            });
        }

        let preprocessor = Preprocessor::new(config.preprocess, engine.geometry())?;
        let ranker = TopK::new(config.top_k)?;

        debug!(
            model = %engine.model_name(),
            geometry = %engine.geometry(),
            categories = category_count,
            top_k = ranker.k(),
            "scene classifier ready"
        );

        Ok(Self {
            engine,
            preprocessor,
            ranker,
        })
    }

    /// The input geometry of the loaded model.
    pub fn geometry(&self) -> NetworkGeometry {
        self.engine.geometry()
    }

    /// Number of categories the loaded model scores.
    pub fn category_count(&self) -> usize {
        self.engine.category_count()
    }

    /// Number of predictions each classification returns.
    pub fn top_k(&self) -> usize {
        self.ranker.k()
    }

    /// Classifies one image and returns the ranked top predictions.
    ///
    /// The image may be any decoded layout with a supported conversion rule
    /// onto the model's input; size never matters because preprocessing
    /// resizes to the network geometry.
    ///
    /// # Returns
    ///
    /// The `top_k` best predictions, sorted by descending score with ties
    /// broken by ascending category index.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::UnsupportedChannelConversion`] for image
    /// layouts without a conversion rule; the classifier stays usable for
    /// the next image. Returns [`ClassifierError::Inference`] if the forward
    /// pass fails and [`ClassifierError::AliasingViolation`] if the planar
    /// write did not land in the engine's buffer.
    pub fn classify(&mut self, image: &DynamicImage) -> ClassifierResult<Vec<ScenePrediction>> {
        let base = self.engine.input_base_ptr();
        {
            let mut planes = self.engine.input_planes()?;
            self.preprocessor.run(image, &mut planes)?;
            // The planes were checked when carved out; check again now that
            // preprocessing wrote through them, so a stage that swapped in
            // its own buffer cannot slip through.
            planes.verify_aliasing(base)?;
        }

        let scores = self.engine.run_forward()?;
        self.ranker.rank(&scores)
    }
}

/// Builder for [`SceneClassifier`].
#[derive(Debug, Clone, Default)]
pub struct SceneClassifierBuilder {
    config: SceneClassifierConfig,
}

impl SceneClassifierBuilder {
    /// Creates a builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: SceneClassifierConfig::new(),
        }
    }

    /// Sets the number of ranked predictions per image.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.top_k = top_k;
        self
    }

    /// Sets the plane order the model expects.
    pub fn channel_order(mut self, order: ChannelOrder) -> Self {
        self.config.preprocess.channel_order = order;
        self
    }

    /// Sets the multiplier applied to samples after the float conversion.
    pub fn pixel_scale(mut self, scale: f32) -> Self {
        self.config.preprocess.pixel_scale = scale;
        self
    }

    /// Enables a mean adjustment after scaling.
    pub fn mean_subtraction(mut self, mean: MeanSubtraction) -> Self {
        self.config.preprocess.mean = mean;
        self
    }

    /// Sets the interpolation filter used for resizing.
    pub fn resize_filter(mut self, filter: FilterType) -> Self {
        self.config.preprocess.resize_filter = filter;
        self
    }

    /// Sets the category count the loaded model must declare.
    pub fn expected_categories(mut self, expected: usize) -> Self {
        self.config.expected_categories = Some(expected);
        self
    }

    /// Overrides the input tensor name.
    pub fn input_name(mut self, name: impl Into<String>) -> Self {
        self.config.input_name = Some(name.into());
        self
    }

    /// Overrides the score tensor name.
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_name = Some(name.into());
        self
    }

    /// Builds the classifier, loading the model from `model_path`.
    ///
    /// # Errors
    ///
    /// See [`SceneClassifier::new`].
    pub fn build(self, model_path: &Path) -> ClassifierResult<SceneClassifier> {
        SceneClassifier::new(self.config, model_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SceneClassifierConfig::default();
        assert_eq!(config.top_k, DEFAULT_TOP_K);
        assert_eq!(config.expected_categories, Some(PLACES365_CATEGORIES));
        assert!(config.input_name.is_none());
        assert!(config.output_name.is_none());
    }

    #[test]
    fn test_config_rejects_zero_top_k() {
        let config = SceneClassifierConfig {
            top_k: 0,
            ..SceneClassifierConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ClassifierError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_config_rejects_small_category_space() {
        let config = SceneClassifierConfig {
            top_k: 5,
            expected_categories: Some(3),
            ..SceneClassifierConfig::default()
        };
        match config.validate() {
            Err(ClassifierError::InsufficientOutputSize { required, actual }) => {
                assert_eq!(required, 5);
                assert_eq!(actual, 3);
            }
            other => panic!("expected insufficient output size, got {:?}", other),
        }
    }

    #[test]
    fn test_build_missing_model_fails() {
        let result = SceneClassifier::builder().build(Path::new("dummy_path.onnx"));
        assert!(matches!(result, Err(ClassifierError::ModelLoad { .. })));
    }

    #[test]
    fn test_builder_wires_top_k_before_load() {
        // Configuration is validated before the model is touched, so a bad
        // top_k surfaces even with a missing model file.
        let result = SceneClassifier::builder()
            .top_k(0)
            .build(Path::new("dummy_path.onnx"));
        assert!(matches!(result, Err(ClassifierError::ConfigError { .. })));
    }

    #[test]
    fn test_builder_wires_expected_categories_before_load() {
        let result = SceneClassifier::builder()
            .top_k(5)
            .expected_categories(3)
            .build(Path::new("dummy_path.onnx"));
        assert!(matches!(
            result,
            Err(ClassifierError::InsufficientOutputSize {
                required: 5,
                actual: 3
            })
        ));
    }
}
