//! Shared utilities for image and label handling.

pub mod image;
pub mod labels;

pub use image::load_image;
pub use labels::{parse_category_labels, read_category_labels};
