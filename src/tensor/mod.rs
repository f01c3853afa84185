//! Input tensor ownership and planar channel views.
//!
//! The inference engine owns exactly one `[1, C, H, W]` float buffer for the
//! lifetime of a loaded model. Preprocessing never allocates a staging buffer
//! of its own; it writes through [`InputPlanes`], a set of per-channel slices
//! carved out of that buffer. Plane `c` starts at float offset
//! `c * width * height`, so every write lands directly in the memory the
//! runtime reads during the forward pass.
//!
//! The aliasing relationship is verified with pointer comparisons rather than
//! assumed: once when the planes are created, and again after preprocessing
//! has written through them. A failed check surfaces as
//! [`ClassifierError::AliasingViolation`] and means the pipeline itself is
//! broken.

use crate::core::errors::{ClassifierError, ClassifierResult};
use ndarray::{Array4, ArrayView4};

/// The fixed input shape a loaded model accepts.
///
/// Read once from the model's declared input when the engine is built and
/// invariant afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkGeometry {
    channels: usize,
    width: u32,
    height: u32,
}

impl NetworkGeometry {
    /// Creates a geometry after checking the channel count.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::ConfigError`] if `channels` is not 1 or 3,
    /// or if either spatial dimension is zero.
    pub fn new(channels: usize, width: u32, height: u32) -> ClassifierResult<Self> {
        if channels != 1 && channels != 3 {
            return Err(ClassifierError::config_error(format!(
                "input layer must have 1 or 3 channels, got {}",
                channels
            )));
        }
        if width == 0 || height == 0 {
            return Err(ClassifierError::config_error(format!(
                "input dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            channels,
            width,
            height,
        })
    }

    /// Number of input channels (1 or 3).
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Input width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Input height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of floats in one channel plane.
    pub fn plane_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Total number of floats in the input tensor.
    pub fn element_count(&self) -> usize {
        self.channels * self.plane_len()
    }
}

impl std::fmt::Display for NetworkGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.channels, self.height, self.width)
    }
}

/// The engine-owned input buffer, allocated once per loaded model.
///
/// The buffer keeps the standard NCHW layout with a fixed batch size of 1.
/// It is zero-initialized at construction and overwritten in full by each
/// preprocessing pass.
#[derive(Debug)]
pub struct InputTensor {
    geometry: NetworkGeometry,
    data: Array4<f32>,
}

impl InputTensor {
    /// Allocates a zeroed input buffer matching the geometry.
    pub fn new(geometry: NetworkGeometry) -> Self {
        let data = Array4::zeros((
            1,
            geometry.channels(),
            geometry.height() as usize,
            geometry.width() as usize,
        ));
        Self { geometry, data }
    }

    /// The geometry this buffer was allocated for.
    pub fn geometry(&self) -> NetworkGeometry {
        self.geometry
    }

    /// Base address of the buffer, used for aliasing verification.
    pub fn base_ptr(&self) -> *const f32 {
        self.data.as_ptr()
    }

    /// Read-only NCHW view handed to the runtime for the forward pass.
    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// Carves per-channel planes out of the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::AliasingViolation`] if the buffer is not
    /// contiguous or the freshly created planes fail the pointer check.
    pub fn planes_mut(&mut self) -> ClassifierResult<InputPlanes<'_>> {
        let geometry = self.geometry;
        let base = self.data.as_ptr();
        let buffer = self.data.as_slice_mut().ok_or_else(|| {
            ClassifierError::aliasing_violation("input tensor buffer is not contiguous")
        })?;
        InputPlanes::wrap(buffer, geometry, base)
    }
}

/// Mutable per-channel views over the engine's input buffer.
///
/// Plane `c` covers the half-open float range
/// `[c * plane_len, (c + 1) * plane_len)` of the underlying buffer. The views
/// borrow the buffer for as long as they live, so the engine cannot run a
/// forward pass until they are dropped.
pub struct InputPlanes<'a> {
    planes: Vec<&'a mut [f32]>,
    geometry: NetworkGeometry,
}

impl<'a> InputPlanes<'a> {
    fn wrap(
        buffer: &'a mut [f32],
        geometry: NetworkGeometry,
        base: *const f32,
    ) -> ClassifierResult<Self> {
        let expected = geometry.element_count();
        if buffer.len() != expected {
            return Err(ClassifierError::invalid_input(format!(
                "input buffer holds {} floats but geometry {} needs exactly {}",
                buffer.len(),
                geometry,
                expected
            )));
        }
        let plane_len = geometry.plane_len();
        let planes: Vec<&'a mut [f32]> = buffer.chunks_exact_mut(plane_len).collect();
        let wrapped = Self { planes, geometry };
        wrapped.verify_aliasing(base)?;
        Ok(wrapped)
    }

    /// Number of channel planes.
    pub fn channel_count(&self) -> usize {
        self.planes.len()
    }

    /// Number of floats in each plane.
    pub fn plane_len(&self) -> usize {
        self.geometry.plane_len()
    }

    /// Mutable access to one channel plane.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::InvalidInput`] if `channel` is out of range.
    pub fn plane_mut(&mut self, channel: usize) -> ClassifierResult<&mut [f32]> {
        let count = self.planes.len();
        match self.planes.get_mut(channel) {
            Some(plane) => Ok(&mut **plane),
            None => Err(ClassifierError::invalid_input(format!(
                "channel index {} out of range for {} planes",
                channel, count
            ))),
        }
    }

    /// Checks that every plane still points into the buffer rooted at `base`.
    ///
    /// Called when the planes are created and again after preprocessing has
    /// written through them. The second check guards against a stage silently
    /// swapping in its own allocation instead of writing in place.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::AliasingViolation`] naming the first plane
    /// whose address does not match its expected offset.
    pub fn verify_aliasing(&self, base: *const f32) -> ClassifierResult<()> {
        let plane_len = self.geometry.plane_len();
        for (channel, plane) in self.planes.iter().enumerate() {
            let expected = base.wrapping_add(channel * plane_len);
            if !std::ptr::eq(plane.as_ptr(), expected) {
                return Err(ClassifierError::aliasing_violation(format!(
                    "plane {} does not start at buffer offset {}",
                    channel,
                    channel * plane_len
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for InputPlanes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputPlanes")
            .field("channels", &self.planes.len())
            .field("plane_len", &self.geometry.plane_len())
            .finish()
    }
}
