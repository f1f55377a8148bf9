//! Inference engine binding for the INT8 classification demo.
//!
//! The heavy lifting (graph optimization, kernel selection, quantized
//! execution) happens inside ONNX Runtime and its TensorRT and CUDA
//! execution providers. This crate drives that external collaborator:
//! capability detection, per-tensor scale injection via a calibration
//! table, engine build, and single-batch execution.

pub mod calibration;
pub mod device;
pub mod engine;

pub use engine::{write_tensor_names, Engine, MAX_WORKSPACE_SIZE};
