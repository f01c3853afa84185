//! Error types for the scene classification pipeline.
//!
//! Errors fall into two groups. Load-time errors ([`ClassifierError::ModelLoad`],
//! [`ClassifierError::ConfigError`], [`ClassifierError::InsufficientOutputSize`])
//! are fatal: a classifier that fails to build holds no session and cannot be
//! used. Call-time errors ([`ClassifierError::UnsupportedChannelConversion`],
//! [`ClassifierError::ImageLoad`], [`ClassifierError::Inference`]) are
//! recoverable: the classifier stays usable and the next image can be
//! submitted as usual. [`ClassifierError::AliasingViolation`] is neither; it
//! reports a broken buffer invariant inside the pipeline itself and should be
//! treated as a bug.

use thiserror::Error;

/// Convenient result alias for classifier operations.
pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// A string-only error used as a source when no structured error exists.
#[derive(Debug)]
pub struct OpaqueError(pub String);

impl OpaqueError {
    /// Wraps anything displayable.
    pub fn from_display(value: impl std::fmt::Display) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for OpaqueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for OpaqueError {}

/// Errors produced while loading a model or classifying an image.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// The model artifact is missing, unreadable, or declares a layout the
    /// pipeline cannot serve (wrong tensor rank, unsupported channel count,
    /// dynamic spatial dimensions).
    #[error("model load failed for '{model_path}': {reason}")]
    ModelLoad {
        /// Path of the model artifact that failed to load.
        model_path: String,
        /// Why the load was rejected.
        reason: String,
        /// Underlying runtime error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No conversion rule maps the submitted image layout onto the network
    /// input. The classifier remains usable for other images.
    #[error("no conversion rule maps a {from}-channel image to a {to}-channel network input")]
    UnsupportedChannelConversion {
        /// Channel count of the submitted image.
        from: usize,
        /// Channel count the network expects.
        to: usize,
    },

    /// The model emits fewer scores than the ranking stage needs.
    #[error("score vector holds {actual} entries but ranking requires at least {required}")]
    InsufficientOutputSize {
        /// Minimum number of scores the ranker must see.
        required: usize,
        /// Number of scores actually available.
        actual: usize,
    },

    /// A planar channel view no longer points into the engine's input buffer.
    /// This indicates a bug in the pipeline, not bad caller input.
    #[error("input planes no longer alias the engine buffer: {context}")]
    AliasingViolation {
        /// Where the pointer check failed.
        context: String,
    },

    /// An image failed to load or decode.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// The forward pass or its tensor plumbing failed.
    #[error("inference failed: {context}")]
    Inference {
        /// What the engine was doing when the failure occurred.
        context: String,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The caller handed the pipeline something it cannot work with.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Details about the invalid input.
        message: String,
    },

    /// A configuration value failed validation.
    #[error("configuration: {message}")]
    ConfigError {
        /// Details about the configuration problem.
        message: String,
    },

    /// ONNX Runtime session error.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Tensor shape error.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// I/O error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl ClassifierError {
    /// Creates a model load error with path context and an optional source.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path of the artifact that failed to load.
    /// * `reason` - Why the load was rejected.
    /// * `source` - Underlying error, when one exists.
    pub fn model_load_error(
        model_path: impl AsRef<std::path::Path>,
        reason: impl Into<String>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        Self::ModelLoad {
            model_path: model_path.as_ref().display().to_string(),
            reason: reason.into(),
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Creates an inference error with context about the failing step.
    pub fn inference_error(
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates an invalid input error with a descriptive message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error with a descriptive message.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates an aliasing violation error naming the failed check.
    pub fn aliasing_violation(context: impl Into<String>) -> Self {
        Self::AliasingViolation {
            context: context.into(),
        }
    }
}

impl From<image::ImageError> for ClassifierError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_conversion_display() {
        let error = ClassifierError::UnsupportedChannelConversion { from: 4, to: 1 };
        assert_eq!(
            error.to_string(),
            "no conversion rule maps a 4-channel image to a 1-channel network input"
        );
    }

    #[test]
    fn test_insufficient_output_size_display() {
        let error = ClassifierError::InsufficientOutputSize {
            required: 5,
            actual: 3,
        };
        assert_eq!(
            error.to_string(),
            "score vector holds 3 entries but ranking requires at least 5"
        );
    }

    #[test]
    fn test_model_load_error_keeps_path_and_reason() {
        let error = ClassifierError::model_load_error(
            "models/places365.onnx",
            "input layer must have 1 or 3 channels",
            None::<std::io::Error>,
        );
        let message = error.to_string();
        assert!(message.contains("models/places365.onnx"));
        assert!(message.contains("1 or 3 channels"));
    }

    #[test]
    fn test_aliasing_violation_display() {
        let error = ClassifierError::aliasing_violation("plane 0 does not start at the buffer base");
        assert!(error.to_string().contains("no longer alias"));
    }

    #[test]
    fn test_config_error_constructor() {
        let error = ClassifierError::config_error("top_k must be greater than 0");
        assert_eq!(error.to_string(), "configuration: top_k must be greater than 0");
    }
}
