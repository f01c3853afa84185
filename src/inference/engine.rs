//! The ONNX Runtime inference engine.
//!
//! The engine pairs one session with one owned input buffer. The buffer is
//! allocated when the model loads and reused for every forward pass; the
//! preprocessor writes into it through [`InputPlanes`] borrowed from the
//! engine, and [`OrtEngine::run_forward`] hands the same memory to the
//! runtime without copying.
//!
//! An engine is not safe to share across threads. It takes `&mut self` for
//! every mutation of the input buffer and for the forward pass itself, so
//! concurrent use requires external serialization such as a mutex or a
//! per-thread engine.

use crate::core::constants::INPUT_TENSOR_RANK;
use crate::core::errors::{ClassifierError, ClassifierResult, OpaqueError};
use crate::inference::session::load_session;
use crate::tensor::{InputPlanes, InputTensor, NetworkGeometry};
use ort::session::Session;
use ort::value::{TensorRef, ValueType};
use std::path::Path;
use tracing::debug;

/// One loaded model together with its input buffer.
pub struct OrtEngine {
    session: Session,
    input_name: String,
    output_name: String,
    category_count: usize,
    input: InputTensor,
    model_name: String,
}

impl std::fmt::Debug for OrtEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtEngine")
            .field("model_name", &self.model_name)
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("geometry", &self.input.geometry())
            .field("category_count", &self.category_count)
            .finish()
    }
}

fn load_error(path: &Path, reason: impl Into<String>) -> ClassifierError {
    ClassifierError::model_load_error(path, reason, None::<ort::Error>)
}

impl OrtEngine {
    /// Loads a model and allocates its input buffer.
    ///
    /// The input geometry and the category count are read from the model's
    /// declared tensor shapes. Tensor names default to the first declared
    /// input and output and can be overridden for models with several.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path to the ONNX model artifact.
    /// * `input_name` - Input tensor to feed, or `None` for the first one.
    /// * `output_name` - Score tensor to read, or `None` for the first one.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::ModelLoad`] if the session cannot be
    /// created, the input is not a rank-4 NCHW tensor with 1 or 3 channels
    /// and static spatial dimensions, or the output is not a flat score
    /// vector of static length.
    pub fn load(
        model_path: impl AsRef<Path>,
        input_name: Option<&str>,
        output_name: Option<&str>,
    ) -> ClassifierResult<Self> {
        let path = model_path.as_ref();
        let session = load_session(path)?;
        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        let input_name = match input_name {
            Some(name) => name.to_string(),
            None => session
                .inputs
                .first()
                .map(|input| input.name.clone())
                .ok_or_else(|| load_error(path, "model declares no inputs"))?,
        };
        let output_name = match output_name {
            Some(name) => name.to_string(),
            None => session
                .outputs
                .first()
                .map(|output| output.name.clone())
                .ok_or_else(|| load_error(path, "model declares no outputs"))?,
        };

        let geometry = Self::declared_geometry(&session, &input_name, path)?;
        let category_count = Self::declared_category_count(&session, &output_name, path)?;

        debug!(
            model = %model_name,
            input = %input_name,
            output = %output_name,
            geometry = %geometry,
            categories = category_count,
            "loaded classification model"
        );

        let input = InputTensor::new(geometry);
        Ok(Self {
            session,
            input_name,
            output_name,
            category_count,
            input,
            model_name,
        })
    }

    /// Reads the NCHW input geometry the model declares.
    fn declared_geometry(
        session: &Session,
        input_name: &str,
        path: &Path,
    ) -> ClassifierResult<NetworkGeometry> {
        let input = session
            .inputs
            .iter()
            .find(|input| input.name == input_name)
            .ok_or_else(|| load_error(path, format!("model declares no input named '{}'", input_name)))?;

        let dims: Vec<i64> = match &input.input_type {
            ValueType::Tensor { shape, .. } => shape.iter().copied().collect(),
            other => {
                return Err(load_error(
                    path,
                    format!("input '{}' is not a tensor: {:?}", input_name, other),
                ))
            }
        };

        if dims.len() != INPUT_TENSOR_RANK {
            return Err(load_error(
                path,
                format!(
                    "expected a rank-{} NCHW input, model declares rank {}",
                    INPUT_TENSOR_RANK,
                    dims.len()
                ),
            ));
        }
        // Batch may be declared dynamic; the engine always feeds one image.
        if dims[0] != 1 && dims[0] != -1 {
            return Err(load_error(
                path,
                format!("only batch size 1 is supported, model declares {}", dims[0]),
            ));
        }
        let channels = dims[1];
        if channels != 1 && channels != 3 {
            return Err(load_error(
                path,
                format!("input layer must have 1 or 3 channels, got {}", channels),
            ));
        }
        let (height, width) = (dims[2], dims[3]);
        if height <= 0 || width <= 0 {
            return Err(load_error(
                path,
                format!(
                    "spatial dimensions must be static, model declares {}x{}",
                    height, width
                ),
            ));
        }

        NetworkGeometry::new(channels as usize, width as u32, height as u32)
            .map_err(|e| load_error(path, e.to_string()))
    }

    /// Reads the score vector length the model declares.
    fn declared_category_count(
        session: &Session,
        output_name: &str,
        path: &Path,
    ) -> ClassifierResult<usize> {
        let output = session
            .outputs
            .iter()
            .find(|output| output.name == output_name)
            .ok_or_else(|| {
                load_error(path, format!("model declares no output named '{}'", output_name))
            })?;

        let dims: Vec<i64> = match &output.output_type {
            ValueType::Tensor { shape, .. } => shape.iter().copied().collect(),
            other => {
                return Err(load_error(
                    path,
                    format!("output '{}' is not a tensor: {:?}", output_name, other),
                ))
            }
        };

        // Accept [categories] and [batch, categories].
        let categories = match dims.len() {
            1 => dims[0],
            2 => dims[1],
            other => {
                return Err(load_error(
                    path,
                    format!("expected a flat score output, model declares rank {}", other),
                ))
            }
        };
        if categories <= 0 {
            return Err(load_error(
                path,
                format!("score vector length must be static, model declares {}", categories),
            ));
        }
        Ok(categories as usize)
    }

    /// The input geometry read from the model at load time.
    pub fn geometry(&self) -> NetworkGeometry {
        self.input.geometry()
    }

    /// Number of scores one forward pass produces.
    pub fn category_count(&self) -> usize {
        self.category_count
    }

    /// The model name derived from the artifact's file stem.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Base address of the input buffer, used for aliasing verification.
    pub fn input_base_ptr(&self) -> *const f32 {
        self.input.base_ptr()
    }

    /// Borrows the input buffer as per-channel planes for preprocessing.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::AliasingViolation`] if the freshly carved
    /// planes fail the pointer check.
    pub fn input_planes(&mut self) -> ClassifierResult<InputPlanes<'_>> {
        self.input.planes_mut()
    }

    /// Runs one forward pass over the current input buffer.
    ///
    /// The buffer is handed to the runtime as a borrowed view, not copied.
    ///
    /// # Returns
    ///
    /// The raw score vector, one score per category.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::Inference`] if the runtime rejects the
    /// input, the pass fails, or the output does not match the declared
    /// category count.
    pub fn run_forward(&mut self) -> ClassifierResult<Vec<f32>> {
        let input_tensor = TensorRef::from_array_view(self.input.view()).map_err(|e| {
            ClassifierError::inference_error(
                format!("failed to wrap input buffer for '{}'", self.model_name),
                e,
            )
        })?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| {
                ClassifierError::inference_error(
                    format!(
                        "forward pass failed for '{}' with input '{}'",
                        self.model_name, self.input_name
                    ),
                    e,
                )
            })?;

        let (shape, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                ClassifierError::inference_error(
                    format!("failed to extract output '{}' as f32", self.output_name),
                    e,
                )
            })?;

        if data.len() != self.category_count {
            return Err(ClassifierError::inference_error(
                format!(
                    "model '{}' emitted {} scores with output shape {:?}, expected {}",
                    self.model_name,
                    data.len(),
                    shape,
                    self.category_count
                ),
                OpaqueError::from_display("score vector length mismatch"),
            ));
        }

        Ok(data.to_vec())
    }
}
