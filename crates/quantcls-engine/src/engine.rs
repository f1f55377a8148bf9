//! The inference engine.
//!
//! Wraps one ONNX Runtime session built for the requested precision and
//! execution target. The session is uniquely owned; dropping the engine
//! releases the runtime resources on every exit path.

use std::path::{Path, PathBuf};

use ort::{
    CUDAExecutionProvider, ExecutionProviderDispatch, GraphOptimizationLevel, Session,
    TensorRTExecutionProvider, Value, ValueType,
};
use quantcls_core::{
    Error, InputDimensions, InputTensor, IoBindings, Precision, RangeMap, Result, RunParams,
    TensorBinding,
};
use tracing::{debug, info, warn};

use crate::calibration;
use crate::device;

/// Workspace memory bound handed to the engine builder
pub const MAX_WORKSPACE_SIZE: usize = 1 << 30;

/// A built inference engine, ready to run one batch at a time
pub struct Engine {
    session: Session,
    io: IoBindings,
    input_dims: InputDimensions,
    batch_size: usize,
}

impl Engine {
    /// Builds the engine for the run's precision and execution target.
    ///
    /// The model is first parsed once to discover the network's bindings;
    /// in INT8 mode the per-tensor scales are then written as a
    /// calibration table and handed to the quantizing provider, and the
    /// engine itself is compiled. A platform without INT8 hardware
    /// support yields [`Error::Unsupported`] so the caller can waive the
    /// run instead of failing it.
    pub fn build(params: &RunParams, ranges: &RangeMap) -> Result<Self> {
        let io = inspect_model(&params.model_file)?;
        debug!(
            "found input: {} shape={:?}",
            io.input.name, io.input.dims
        );
        debug!(
            "found output: {} shape={:?}",
            io.output.name, io.output.dims
        );

        let mut providers: Vec<ExecutionProviderDispatch> = Vec::new();
        match params.precision {
            Precision::Fp32 => {
                providers.push(
                    CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                );
            }
            Precision::Int8 => {
                if !device::platform_has_int8_support() {
                    return Err(Error::Unsupported(
                        "platform does not support INT8 inference; rerun with --fp32".to_string(),
                    ));
                }

                let table = calibration_table_path(params);
                let required = [io.input.name.clone(), io.output.name.clone()];
                calibration::write_calibration_table(&table, ranges, &required)?;
                info!("setting per tensor dynamic range from {} entries", ranges.len());
                if params.verbose {
                    for name in ranges.sorted_names() {
                        let range = ranges.effective_range(name);
                        debug!(
                            "tensor {name}: max absolute dynamic range {range} \
                             (resolution at INT8: {})",
                            calibration::scale_for(range)
                        );
                    }
                }

                let mut trt = TensorRTExecutionProvider::default()
                    .with_device_id(0)
                    .with_max_workspace_size(MAX_WORKSPACE_SIZE)
                    .with_int8(true)
                    .with_int8_calibration_table_name(table.to_string_lossy());
                if let Some(core) = params.dla_core {
                    trt = trt.with_dla(true).with_dla_core(core as u32);
                }
                providers.push(trt.build().error_on_failure());

                if params.safe_gpu_int8 {
                    // Safe mode: the engine runs wholly on the restricted
                    // target or not at all. No fallback provider.
                    debug!("safe INT8 mode: no fallback execution provider registered");
                } else {
                    providers.push(CUDAExecutionProvider::default().with_device_id(0).build());
                }
            }
        }

        let session = open_session(&params.model_file, providers)?;
        info!(
            "engine built: {} precision, {} for {}",
            params.precision,
            match params.dla_core {
                Some(core) => format!("DLA core {core}"),
                None => "GPU".to_string(),
            },
            params.model_file.display()
        );

        Ok(Self {
            session,
            io,
            input_dims: params.input_dims,
            batch_size: params.batch_size,
        })
    }

    /// The network's input and output bindings
    pub fn io(&self) -> &IoBindings {
        &self.io
    }

    /// Runs one batched inference and returns the output activations.
    ///
    /// The runtime schedules its host-to-device copy, the dispatch, and
    /// the copy back on its internal queue; the call returns after the
    /// queue drains. The wait is unconditional, with no timeout or
    /// cancellation.
    pub fn infer(&self, input: &InputTensor) -> Result<Vec<f32>> {
        let expected = self.batch_size * self.input_dims.volume();
        if input.len() != expected {
            return Err(Error::Engine(format!(
                "input buffer holds {} elements but the network expects {expected}",
                input.len()
            )));
        }

        let shape = [
            self.batch_size,
            self.input_dims.channels,
            self.input_dims.height,
            self.input_dims.width,
        ];
        let input_name = self.io.input.name.as_str();

        let outputs = match input {
            InputTensor::Fp32(data) => {
                let value = Value::from_array((shape, data.clone())).map_err(engine_err)?;
                self.session
                    .run(ort::inputs![input_name => value].map_err(engine_err)?)
                    .map_err(engine_err)?
            }
            InputTensor::Int8(data) => {
                let value = Value::from_array((shape, data.clone())).map_err(engine_err)?;
                self.session
                    .run(ort::inputs![input_name => value].map_err(engine_err)?)
                    .map_err(engine_err)?
            }
        };

        let (output_shape, data) = outputs[self.io.output.name.as_str()]
            .try_extract_raw_tensor::<f32>()
            .map_err(engine_err)?;
        debug!("output tensor shape {:?}", output_shape);

        Ok(data.to_vec())
    }

    /// Explicit teardown; dropping the engine has the same effect.
    pub fn teardown(self) {
        debug!("releasing inference engine");
    }
}

/// Write-tensors mode: dump the names of the network tensors the runtime
/// exposes, one `TensorName: ` line each. Returns the number written.
pub fn write_tensor_names(model_file: &Path, output_file: &Path) -> Result<usize> {
    info!("per tensor dynamic range is required to run INT8 inference without calibration");
    let session = open_session(model_file, Vec::new())?;

    let mut names: Vec<String> = Vec::new();
    for input in &session.inputs {
        names.push(input.name.clone());
    }
    for output in &session.outputs {
        names.push(output.name.clone());
    }

    let mut contents = String::new();
    for name in &names {
        contents.push_str(&format!("TensorName: {name}\n"));
    }
    std::fs::write(output_file, contents).map_err(|e| {
        Error::Engine(format!(
            "could not write network tensors file {}: {e}",
            output_file.display()
        ))
    })?;

    info!(
        "wrote {} network tensor names to {}",
        names.len(),
        output_file.display()
    );
    info!("use the generated file to create a dynamic range file for INT8 inference");
    Ok(names.len())
}

fn inspect_model(model_file: &Path) -> Result<IoBindings> {
    let session = open_session(model_file, Vec::new())?;

    if session.inputs.len() != 1 || session.outputs.len() != 1 {
        return Err(Error::Engine(format!(
            "expected exactly one input and one output binding, found {} and {}",
            session.inputs.len(),
            session.outputs.len()
        )));
    }

    let input = TensorBinding {
        name: session.inputs[0].name.clone(),
        dims: tensor_dims(&session.inputs[0].input_type),
    };
    let output = TensorBinding {
        name: session.outputs[0].name.clone(),
        dims: tensor_dims(&session.outputs[0].output_type),
    };

    Ok(IoBindings { input, output })
}

fn open_session(model_file: &Path, providers: Vec<ExecutionProviderDispatch>) -> Result<Session> {
    let mut builder = Session::builder()
        .map_err(engine_err)?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(engine_err)?
        .with_intra_threads(1)
        .map_err(engine_err)?;

    if !providers.is_empty() {
        builder = builder
            .with_execution_providers(providers)
            .map_err(engine_err)?;
    }

    builder.commit_from_file(model_file).map_err(|e| {
        warn!("unable to build engine from {}", model_file.display());
        engine_err(e)
    })
}

fn tensor_dims(value_type: &ValueType) -> Vec<i64> {
    match value_type {
        ValueType::Tensor { dimensions, .. } => dimensions.clone(),
        _ => Vec::new(),
    }
}

fn calibration_table_path(params: &RunParams) -> PathBuf {
    params.ranges_file.with_extension("cache")
}

fn engine_err(e: ort::Error) -> Error {
    Error::Engine(e.to_string())
}
