//! Core type definitions for the classification demo.

use serde::{Deserialize, Serialize};

/// Numeric precision the engine is built for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Precision {
    /// Quantized 8-bit inference with per-tensor dynamic ranges (default)
    Int8,
    /// Full 32-bit floating-point inference
    Fp32,
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precision::Int8 => write!(f, "INT8"),
            Precision::Fp32 => write!(f, "FP32"),
        }
    }
}

/// Final status of one demo run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunOutcome {
    /// Build, inference and teardown all succeeded
    Passed,
    /// Some stage of the run failed
    Failed,
    /// The run did not apply here: tensor-dump mode, or the platform
    /// lacks the required hardware support
    Waived,
}

impl RunOutcome {
    /// Process exit code for this outcome. A waived run is not a failure.
    pub fn exit_code(self) -> u8 {
        match self {
            RunOutcome::Passed | RunOutcome::Waived => 0,
            RunOutcome::Failed => 1,
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Passed => write!(f, "PASSED"),
            RunOutcome::Failed => write!(f, "FAILED"),
            RunOutcome::Waived => write!(f, "WAIVED"),
        }
    }
}

/// Planar input dimensions expected by the network
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputDimensions {
    /// Number of channels (3 for RGB)
    pub channels: usize,
    /// Image height in pixels
    pub height: usize,
    /// Image width in pixels
    pub width: usize,
}

impl InputDimensions {
    /// Creates new input dimensions
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
        }
    }

    /// The 3x224x224 shape used by the classification networks this demo targets
    pub fn imagenet() -> Self {
        Self::new(3, 224, 224)
    }

    /// Total number of elements in one planar image
    pub fn volume(&self) -> usize {
        self.channels * self.height * self.width
    }
}

/// One network tensor the engine binds at execution time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorBinding {
    /// Tensor name as reported by the runtime
    pub name: String,
    /// Tensor dimensions; -1 marks a dynamic axis
    pub dims: Vec<i64>,
}

/// The network's input and output bindings.
///
/// Exactly one of each exists for the classification networks this demo
/// runs, so they are named fields rather than a keyed container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoBindings {
    /// The single network input
    pub input: TensorBinding,
    /// The single network output
    pub output: TensorBinding,
}

/// A preprocessed input buffer in the precision the engine expects
#[derive(Debug, Clone)]
pub enum InputTensor {
    /// FP32 mode input
    Fp32(Vec<f32>),
    /// INT8 mode input
    Int8(Vec<i8>),
}

impl InputTensor {
    /// Number of elements in the buffer
    pub fn len(&self) -> usize {
        match self {
            InputTensor::Fp32(data) => data.len(),
            InputTensor::Int8(data) => data.len(),
        }
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The precision this buffer was produced for
    pub fn precision(&self) -> Precision {
        match self {
            InputTensor::Fp32(_) => Precision::Fp32,
            InputTensor::Int8(_) => Precision::Int8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_display() {
        assert_eq!(Precision::Int8.to_string(), "INT8");
        assert_eq!(Precision::Fp32.to_string(), "FP32");
    }

    #[test]
    fn test_outcome_exit_codes() {
        assert_eq!(RunOutcome::Passed.exit_code(), 0);
        assert_eq!(RunOutcome::Waived.exit_code(), 0);
        assert_eq!(RunOutcome::Failed.exit_code(), 1);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(RunOutcome::Passed.to_string(), "PASSED");
        assert_eq!(RunOutcome::Failed.to_string(), "FAILED");
        assert_eq!(RunOutcome::Waived.to_string(), "WAIVED");
    }

    #[test]
    fn test_input_dimensions() {
        let dims = InputDimensions::imagenet();
        assert_eq!(dims.channels, 3);
        assert_eq!(dims.height, 224);
        assert_eq!(dims.width, 224);
        assert_eq!(dims.volume(), 3 * 224 * 224);
    }

    #[test]
    fn test_input_tensor_precision() {
        let fp = InputTensor::Fp32(vec![0.0; 8]);
        let q = InputTensor::Int8(vec![0; 8]);
        assert_eq!(fp.precision(), Precision::Fp32);
        assert_eq!(q.precision(), Precision::Int8);
        assert_eq!(fp.len(), 8);
        assert!(!q.is_empty());
    }
}
