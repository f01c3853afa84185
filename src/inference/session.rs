//! Helpers for working directly with ONNX Runtime sessions.

use crate::core::errors::{ClassifierError, ClassifierResult};
use ort::logging::LogLevel;
use ort::session::Session;
use std::path::Path;

/// Opens an ONNX Runtime session for a model artifact.
///
/// Runtime logging is pinned to the error level; pipeline diagnostics go
/// through `tracing` instead.
///
/// # Errors
///
/// Returns [`ClassifierError::ModelLoad`] if the file is missing, unreadable,
/// or not a valid model.
pub fn load_session(model_path: impl AsRef<Path>) -> ClassifierResult<Session> {
    let path = model_path.as_ref();
    let session = Session::builder()
        .and_then(|b| b.with_log_level(LogLevel::Error))
        .and_then(|b| b.commit_from_file(path))
        .map_err(|e| {
            ClassifierError::model_load_error(path, "failed to create ONNX session", Some(e))
        })?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_session_missing_file() {
        let result = load_session("dummy_path.onnx");
        assert!(matches!(result, Err(ClassifierError::ModelLoad { .. })));
    }

    #[test]
    fn test_load_session_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_model.onnx");
        std::fs::write(&path, b"not an onnx graph").unwrap();
        let result = load_session(&path);
        assert!(matches!(result, Err(ClassifierError::ModelLoad { .. })));
    }
}
