//! Constants used throughout the scene classification pipeline.
//!
//! This module defines default values shared by the preprocessor, the
//! inference engine, and the ranking stage.

/// Number of categories in the Places365 label space.
pub const PLACES365_CATEGORIES: usize = 365;

/// Default number of ranked predictions returned per classification.
pub const DEFAULT_TOP_K: usize = 5;

/// Default multiplier applied to each sample after the 8-bit to float
/// conversion.
///
/// The deployed Places365 artifacts were calibrated against inputs scaled by
/// this factor, so it is kept as the default even though it places samples in
/// an unusual numeric range. Models trained on `0.0..=1.0` or `0.0..=255.0`
/// inputs can override it through [`PreprocessConfig`].
///
/// [`PreprocessConfig`]: crate::processors::PreprocessConfig
pub const DEFAULT_PIXEL_SCALE: f32 = 255.0;

/// Number of tensor dimensions the engine accepts for model inputs (NCHW).
pub const INPUT_TENSOR_RANK: usize = 4;
