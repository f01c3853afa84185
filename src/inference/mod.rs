//! ONNX Runtime integration.
//!
//! This module wraps session creation and the forward pass behind
//! [`OrtEngine`], the only type in the crate that talks to the runtime.

mod engine;
mod session;

pub use engine::OrtEngine;
pub use session::load_session;
