//! Image preprocessing and score ranking.
//!
//! This module contains the two processing stages that sit around the
//! forward pass: the preprocessor, which turns a decoded image into the
//! network's input tensor, and the ranker, which turns the raw score vector
//! into ordered predictions.

pub mod preprocess;
pub mod topk;
pub mod types;

pub use preprocess::{PreprocessConfig, Preprocessor};
pub use topk::{ScenePrediction, TopK};
pub use types::{ChannelConversion, ChannelOrder, MeanSubtraction};
