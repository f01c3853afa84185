//! The core module of the scene classification pipeline.
//!
//! This module contains the fundamental building blocks shared by the rest of
//! the crate:
//! - Constants used throughout the pipeline
//! - Error handling
//!
//! It also provides re-exports of commonly used types and functions for
//! convenience.

pub mod constants;
pub mod errors;

pub use constants::*;
pub use errors::{ClassifierError, ClassifierResult, OpaqueError};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and
/// formatting layer. It's typically called at the start of an application to
/// enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
