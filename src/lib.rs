//! # scene365
//!
//! A Rust scene classification library for the Places365 label space, built
//! on ONNX models. One still image goes in; the five best-matching scene
//! categories with their raw scores come out.
//!
//! ## Features
//!
//! - Single-pass classification over 365 scene categories
//! - Channel conversion for gray, RGB, and RGBA sources
//! - Configurable channel order, sample scaling, and mean subtraction
//! - Zero-copy preprocessing straight into the runtime's input buffer
//! - ONNX Runtime integration for fast inference
//!
//! ## Modules
//!
//! * [`classifier`] - The end-to-end scene classifier
//! * [`core`] - Error handling and shared constants
//! * [`inference`] - ONNX Runtime engine
//! * [`processors`] - Preprocessing and score ranking
//! * [`tensor`] - Input buffer ownership and planar views
//! * [`utils`] - Image and label loading helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene365::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), ClassifierError> {
//! let mut classifier = SceneClassifier::builder()
//!     .top_k(5)
//!     .build(Path::new("models/places365.onnx"))?;
//!
//! let labels = read_category_labels(Path::new("models/categories_places365.txt"))?;
//! let image = load_image(Path::new("beach.jpg"))?;
//!
//! for prediction in classifier.classify(&image)? {
//!     println!("{:<24} {:.4}", labels[prediction.category], prediction.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod core;
pub mod inference;
pub mod processors;
pub mod tensor;
pub mod utils;

pub mod prelude {
    //! Commonly used types and functions.

    pub use crate::classifier::{SceneClassifier, SceneClassifierBuilder, SceneClassifierConfig};
    pub use crate::core::{init_tracing, ClassifierError, ClassifierResult};
    pub use crate::processors::{ChannelOrder, MeanSubtraction, ScenePrediction};
    pub use crate::utils::{load_image, read_category_labels};
}
