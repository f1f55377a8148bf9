//! Run parameters and input-file resolution.
//!
//! Command-line values are collected into [`RunOptions`], validated, and
//! resolved into an immutable [`RunParams`] record before any resource is
//! loaded. Relative file names are searched in a list of data directories.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{InputDimensions, Precision};
use crate::{Error, Result};

/// Data directories searched when none are given on the command line
pub const DEFAULT_DATA_DIRS: [&str; 2] = ["data/", "data/int8/"];

/// Raw option values collected from the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Model file name or path
    pub model: String,
    /// Input image file name or path
    pub image: String,
    /// Reference-label file name or path
    pub reference: String,
    /// Per-tensor dynamic-range file name or path
    pub ranges: String,
    /// Dump network tensor names instead of running inference
    pub write_tensors: bool,
    /// Output file for the tensor-name dump
    pub network_tensors_file: String,
    /// Directories searched for relative file names
    pub data_dirs: Vec<PathBuf>,
    /// DLA core to run on, if any
    pub use_dla_core: Option<usize>,
    /// How many top and bottom classes to report
    pub top_bottom_k: usize,
    /// Run at FP32 precision instead of INT8
    pub fp32: bool,
    /// Run INT8 on the GPU in safe mode (no fallback execution)
    pub safe_gpu_int8: bool,
    /// Verbose logging
    pub verbose: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            model: "mobilenet_quantized.onnx".to_string(),
            image: "sample.ppm".to_string(),
            reference: "reference_labels.txt".to_string(),
            ranges: "dynamic_ranges.txt".to_string(),
            write_tensors: false,
            network_tensors_file: "network_tensors.txt".to_string(),
            data_dirs: Vec::new(),
            use_dla_core: None,
            top_bottom_k: 5,
            fp32: false,
            safe_gpu_int8: false,
            verbose: false,
        }
    }
}

impl RunOptions {
    /// Rejects conflicting flag combinations.
    ///
    /// Runs before any file is opened, so a bad invocation never touches
    /// resources.
    pub fn validate(&self) -> Result<()> {
        if self.use_dla_core.is_some() && self.fp32 {
            return Err(Error::InvalidArgument(
                "--useDLACore cannot be combined with --fp32".to_string(),
            ));
        }
        if self.safe_gpu_int8 && (self.fp32 || self.use_dla_core.is_some()) {
            return Err(Error::InvalidArgument(
                "--safeGpuInt8 cannot be combined with --fp32 or --useDLACore".to_string(),
            ));
        }
        if self.top_bottom_k == 0 {
            return Err(Error::InvalidArgument(
                "--topBottomK must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Immutable parameters for one run.
///
/// Constructed once from parsed options, read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunParams {
    /// Resolved model file path
    pub model_file: PathBuf,
    /// Resolved input image path
    pub image_file: PathBuf,
    /// Resolved reference-label file path
    pub reference_file: PathBuf,
    /// Resolved dynamic-range file path
    pub ranges_file: PathBuf,
    /// Dump tensor names instead of running inference
    pub write_tensors: bool,
    /// Output path for the tensor-name dump
    pub network_tensors_file: PathBuf,
    /// Batch size (1 for this demo)
    pub batch_size: usize,
    /// How many top and bottom classes to report
    pub top_bottom_k: usize,
    /// Engine precision
    pub precision: Precision,
    /// DLA core to run on, if any
    pub dla_core: Option<usize>,
    /// Safe-mode INT8 on the GPU
    pub safe_gpu_int8: bool,
    /// Verbose logging
    pub verbose: bool,
    /// Input shape expected by the network
    pub input_dims: InputDimensions,
}

impl RunParams {
    /// Validates options and resolves every input file against the data
    /// directories.
    ///
    /// In tensor-dump mode only the model file is resolved; the remaining
    /// paths are kept as given since that mode never opens them.
    pub fn resolve(options: &RunOptions) -> Result<Self> {
        options.validate()?;

        let data_dirs: Vec<PathBuf> = if options.data_dirs.is_empty() {
            DEFAULT_DATA_DIRS.iter().map(PathBuf::from).collect()
        } else {
            options.data_dirs.clone()
        };

        let model_file = locate_file(&options.model, &data_dirs)?;

        let (image_file, reference_file, ranges_file) = if options.write_tensors {
            (
                PathBuf::from(&options.image),
                PathBuf::from(&options.reference),
                PathBuf::from(&options.ranges),
            )
        } else {
            (
                locate_file(&options.image, &data_dirs)?,
                locate_file(&options.reference, &data_dirs)?,
                locate_file(&options.ranges, &data_dirs)?,
            )
        };

        Ok(Self {
            model_file,
            image_file,
            reference_file,
            ranges_file,
            write_tensors: options.write_tensors,
            network_tensors_file: PathBuf::from(&options.network_tensors_file),
            batch_size: 1,
            top_bottom_k: options.top_bottom_k,
            precision: if options.fp32 {
                Precision::Fp32
            } else {
                Precision::Int8
            },
            dla_core: options.use_dla_core,
            safe_gpu_int8: options.safe_gpu_int8,
            verbose: options.verbose,
            input_dims: InputDimensions::imagenet(),
        })
    }
}

/// Finds a file by name: as given first (absolute-path search), then under
/// each data directory in order.
pub fn locate_file(name: &str, data_dirs: &[PathBuf]) -> Result<PathBuf> {
    let direct = Path::new(name);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }

    for dir in data_dirs {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(Error::NotFound(format!(
        "{} (searched {} data director{})",
        name,
        data_dirs.len(),
        if data_dirs.len() == 1 { "y" } else { "ies" }
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_options_validate() {
        assert!(RunOptions::default().validate().is_ok());
    }

    #[test]
    fn test_dla_with_fp32_rejected() {
        let options = RunOptions {
            use_dla_core: Some(0),
            fp32: true,
            ..RunOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_safe_mode_conflicts_rejected() {
        let with_fp32 = RunOptions {
            safe_gpu_int8: true,
            fp32: true,
            ..RunOptions::default()
        };
        assert!(matches!(with_fp32.validate(), Err(Error::InvalidArgument(_))));

        let with_dla = RunOptions {
            safe_gpu_int8: true,
            use_dla_core: Some(1),
            ..RunOptions::default()
        };
        assert!(matches!(with_dla.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_conflicts_rejected_before_any_file_access() {
        // All paths point nowhere; the flag conflict must win over NotFound.
        let options = RunOptions {
            model: "/definitely/missing/model.onnx".to_string(),
            use_dla_core: Some(0),
            fp32: true,
            ..RunOptions::default()
        };
        assert!(matches!(
            RunParams::resolve(&options),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zero_k_rejected() {
        let options = RunOptions {
            top_bottom_k: 0,
            ..RunOptions::default()
        };
        assert!(matches!(options.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_locate_file_in_data_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("labels.txt"), "cat\n").unwrap();

        let found = locate_file("labels.txt", &[dir.path().to_path_buf()]).unwrap();
        assert_eq!(found, dir.path().join("labels.txt"));
    }

    #[test]
    fn test_locate_file_absolute_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.onnx");
        fs::write(&path, b"stub").unwrap();

        let found = locate_file(path.to_str().unwrap(), &[]).unwrap();
        assert_eq!(found, path);
    }

    #[test]
    fn test_locate_file_missing() {
        let dir = TempDir::new().unwrap();
        let result = locate_file("nope.ppm", &[dir.path().to_path_buf()]);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_resolve_finds_all_inputs() {
        let dir = TempDir::new().unwrap();
        for name in [
            "mobilenet_quantized.onnx",
            "sample.ppm",
            "reference_labels.txt",
            "dynamic_ranges.txt",
        ] {
            fs::write(dir.path().join(name), b"stub").unwrap();
        }

        let options = RunOptions {
            data_dirs: vec![dir.path().to_path_buf()],
            ..RunOptions::default()
        };
        let params = RunParams::resolve(&options).unwrap();
        assert_eq!(params.batch_size, 1);
        assert_eq!(params.precision, Precision::Int8);
        assert!(params.model_file.ends_with("mobilenet_quantized.onnx"));
    }

    #[test]
    fn test_resolve_write_tensors_only_needs_model() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("mobilenet_quantized.onnx"), b"stub").unwrap();

        let options = RunOptions {
            write_tensors: true,
            data_dirs: vec![dir.path().to_path_buf()],
            ..RunOptions::default()
        };
        let params = RunParams::resolve(&options).unwrap();
        assert!(params.write_tensors);
        // Image/labels/ranges are not resolved in this mode.
        assert_eq!(params.image_file, PathBuf::from("sample.ppm"));
    }
}
