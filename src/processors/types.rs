//! Types used in image preprocessing operations.
//!
//! This module defines the enums that describe how an incoming image is
//! mapped onto the network's input planes: the plane ordering, the channel
//! conversion rule, and the optional mean adjustment.

use std::str::FromStr;

use crate::core::errors::{ClassifierError, ClassifierResult};
use crate::tensor::NetworkGeometry;
use ndarray::Array3;

/// Specifies the channel order of the network's input planes.
///
/// Decoded images arrive in RGB order. Models exported from frameworks that
/// consume OpenCV-style images expect BGR planes instead, so the order is a
/// property of the model and travels with its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ChannelOrder {
    /// Planes written in red, green, blue order.
    Rgb,
    /// Planes written in blue, green, red order.
    #[default]
    Bgr,
}

impl ChannelOrder {
    /// Source channel index (in RGB order) feeding each network plane.
    pub fn mapping(&self) -> [usize; 3] {
        match self {
            ChannelOrder::Rgb => [0, 1, 2],
            ChannelOrder::Bgr => [2, 1, 0],
        }
    }
}

impl FromStr for ChannelOrder {
    type Err = ClassifierError;

    fn from_str(order: &str) -> Result<Self, Self::Err> {
        match order.to_ascii_lowercase().as_str() {
            "rgb" => Ok(ChannelOrder::Rgb),
            "bgr" => Ok(ChannelOrder::Bgr),
            other => Err(ClassifierError::config_error(format!(
                "unknown channel order '{}', expected 'rgb' or 'bgr'",
                other
            ))),
        }
    }
}

/// The conversion rule applied to an image before it is written into the
/// input planes.
///
/// Exactly four image-to-network combinations are supported. Anything else
/// is rejected per call with
/// [`ClassifierError::UnsupportedChannelConversion`]; the classifier stays
/// usable for the next image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelConversion {
    /// 4-channel source, 3-channel network: drop alpha, reorder planes.
    DropAlpha,
    /// 1-channel source, 3-channel network: replicate gray into every plane.
    ReplicateGray,
    /// 3-channel source, 3-channel network: reorder planes only.
    Reorder,
    /// 1-channel source, 1-channel network: copy through.
    Passthrough,
}

impl ChannelConversion {
    /// Resolves the rule for a source and network channel count.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::UnsupportedChannelConversion`] when no rule
    /// covers the combination.
    pub fn resolve(from: usize, to: usize) -> ClassifierResult<Self> {
        match (from, to) {
            (4, 3) => Ok(ChannelConversion::DropAlpha),
            (1, 3) => Ok(ChannelConversion::ReplicateGray),
            (3, 3) => Ok(ChannelConversion::Reorder),
            (1, 1) => Ok(ChannelConversion::Passthrough),
            (from, to) => Err(ClassifierError::UnsupportedChannelConversion { from, to }),
        }
    }
}

impl std::fmt::Display for ChannelConversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChannelConversion::DropAlpha => "drop_alpha",
            ChannelConversion::ReplicateGray => "replicate_gray",
            ChannelConversion::Reorder => "reorder",
            ChannelConversion::Passthrough => "passthrough",
        };
        write!(f, "{}", name)
    }
}

/// The mean adjustment applied after scaling, disabled by default.
///
/// The deployed Places365 artifacts were exported without mean subtraction,
/// so [`MeanSubtraction::Disabled`] is the default. The stage stays in the
/// pipeline and can be switched on for models that need it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MeanSubtraction {
    /// No adjustment; samples pass through scaled only.
    #[default]
    Disabled,
    /// Subtract one value per network plane, in plane order.
    PerChannel(Vec<f32>),
    /// Subtract a full `[C, H, W]` mean image, in plane order.
    PerPixel(Array3<f32>),
}

impl MeanSubtraction {
    /// Whether the adjustment does anything.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, MeanSubtraction::Disabled)
    }

    /// Checks the adjustment against the geometry it will be applied to.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::ConfigError`] if the value count or mean
    /// image shape does not match the geometry, or if any value is not
    /// finite.
    pub fn validate(&self, geometry: &NetworkGeometry) -> ClassifierResult<()> {
        match self {
            MeanSubtraction::Disabled => Ok(()),
            MeanSubtraction::PerChannel(values) => {
                if values.len() != geometry.channels() {
                    return Err(ClassifierError::config_error(format!(
                        "mean subtraction needs {} per-channel values, got {}",
                        geometry.channels(),
                        values.len()
                    )));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(ClassifierError::config_error(
                        "mean subtraction values must be finite",
                    ));
                }
                Ok(())
            }
            MeanSubtraction::PerPixel(mean) => {
                let expected = (
                    geometry.channels(),
                    geometry.height() as usize,
                    geometry.width() as usize,
                );
                if mean.dim() != expected {
                    return Err(ClassifierError::config_error(format!(
                        "mean image shape {:?} does not match input geometry {}",
                        mean.dim(),
                        geometry
                    )));
                }
                if mean.iter().any(|v| !v.is_finite()) {
                    return Err(ClassifierError::config_error(
                        "mean image values must be finite",
                    ));
                }
                Ok(())
            }
        }
    }
}
