//! Per-Tensor INT8 Classification Demo CLI
//!
//! Loads a pre-quantized classification network, applies per-tensor
//! dynamic ranges, builds an inference engine through the external
//! runtime, classifies one PPM image, and prints the top and bottom
//! predicted classes.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::{error, info, warn};

use quantcls_core::cli::setup_cli_logging;
use quantcls_core::{
    classify, Classification, Error, Labels, Precision, RangeMap, Result, RunOptions, RunOutcome,
    RunParams,
};
use quantcls_engine::{write_tensor_names, Engine};
use quantcls_image::{Ppm, Preprocessor};

/// Per-tensor INT8 classification demo
///
/// Runs a pre-quantized classification network over one image without a
/// calibration table, using user-supplied per-tensor dynamic ranges.
#[derive(Parser, Debug)]
#[command(name = "classify")]
#[command(version = "0.1.0")]
#[command(
    about = "Classify one image with a pre-quantized network",
    long_about = None
)]
struct Args {
    /// Model file name or /absolute/path/to/model.onnx
    #[arg(long = "model", value_name = "FILE", default_value = "mobilenet_quantized.onnx")]
    model: String,

    /// Image to classify; binary PPM
    #[arg(long = "image", value_name = "FILE", default_value = "sample.ppm")]
    image: String,

    /// Reference labels file, one class name per line
    #[arg(long = "reference", value_name = "FILE", default_value = "reference_labels.txt")]
    reference: String,

    /// Per-tensor dynamic range file, one name:value entry per line
    #[arg(long = "ranges", value_name = "FILE", default_value = "dynamic_ranges.txt")]
    ranges: String,

    /// Write network tensor names to a file instead of running inference
    #[arg(long = "write_tensors")]
    write_tensors: bool,

    /// Output file for --write_tensors
    #[arg(
        long = "network_tensors_file",
        value_name = "FILE",
        default_value = "network_tensors.txt"
    )]
    network_tensors_file: String,

    /// Data directory searched for relative file names; may be repeated
    #[arg(long = "data", value_name = "DIR")]
    data: Vec<PathBuf>,

    /// DLA engine to run on, 0 to n-1
    #[arg(long = "useDLACore", value_name = "N")]
    use_dla_core: Option<usize>,

    /// How many top and bottom predictions to print
    #[arg(long = "topBottomK", value_name = "K", default_value_t = 5)]
    top_bottom_k: usize,

    /// Run inference at FP32 precision on the GPU
    #[arg(long = "fp32")]
    fp32: bool,

    /// Run INT8 inference on the GPU in safe mode; no fallback execution
    #[arg(long = "safeGpuInt8")]
    safe_gpu_int8: bool,

    /// Output per-tensor dynamic range and binding info
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Also write the classification report as JSON
    #[arg(long = "report-json", value_name = "FILE")]
    report_json: Option<PathBuf>,
}

impl Args {
    fn to_options(&self) -> RunOptions {
        RunOptions {
            model: self.model.clone(),
            image: self.image.clone(),
            reference: self.reference.clone(),
            ranges: self.ranges.clone(),
            write_tensors: self.write_tensors,
            network_tensors_file: self.network_tensors_file.clone(),
            data_dirs: self.data.clone(),
            use_dla_core: self.use_dla_core,
            top_bottom_k: self.top_bottom_k,
            fp32: self.fp32,
            safe_gpu_int8: self.safe_gpu_int8,
            verbose: self.verbose,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _ = setup_cli_logging(args.verbose);

    let params = match RunParams::resolve(&args.to_options()) {
        Ok(params) => params,
        Err(e) => {
            error!("{e}");
            print_status(RunOutcome::Failed);
            return ExitCode::from(RunOutcome::Failed.exit_code());
        }
    };

    info!(
        "Building and running a {} inference engine on {} for {}",
        params.precision,
        if params.dla_core.is_some() { "DLA" } else { "GPU" },
        params.model_file.display()
    );

    let outcome = match run(&params, args.report_json.as_deref()) {
        Ok(outcome) => outcome,
        Err(Error::Unsupported(msg)) => {
            warn!("{msg}");
            RunOutcome::Waived
        }
        Err(e) => {
            error!("{e}");
            RunOutcome::Failed
        }
    };

    print_status(outcome);
    ExitCode::from(outcome.exit_code())
}

/// The whole pipeline for one run. Any failure discards the remaining
/// stages; nothing is retried.
fn run(params: &RunParams, report_json: Option<&Path>) -> Result<RunOutcome> {
    if params.verbose {
        quantcls_engine::device::log_device_info();
    }

    if params.write_tensors {
        write_tensor_names(&params.model_file, &params.network_tensors_file)?;
        // A tensor dump is not a true inference run.
        return Ok(RunOutcome::Waived);
    }

    let ranges = match params.precision {
        Precision::Int8 => RangeMap::from_file(&params.ranges_file)?,
        Precision::Fp32 => RangeMap::new(),
    };

    // Labels load before anything is classified; a missing reference file
    // aborts the run here.
    let labels = Labels::from_file(&params.reference_file)?;

    let ppm = Ppm::read_file(&params.image_file)?;
    let preprocessor = Preprocessor::new().with_dims(params.input_dims);
    let input = preprocessor.preprocess(&ppm, params.precision)?;

    let engine = Engine::build(params, &ranges)?;
    let output = engine.infer(&input)?;
    engine.teardown();

    let report = classify(&output, &labels, params.top_bottom_k)?;
    print_report(&report);

    if let Some(path) = report_json {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!("classification report written to {}", path.display());
    }

    Ok(RunOutcome::Passed)
}

fn print_report(report: &Classification) {
    for (i, ranked) in report.top.iter().enumerate() {
        info!(
            "Top-{} predicted class, activation value: {}, {}",
            i + 1,
            ranked.label,
            ranked.activation
        );
    }
    for (i, ranked) in report.bottom.iter().enumerate() {
        info!(
            "Bottom-{} predicted class, activation value: {}, {}",
            i + 1,
            ranked.label,
            ranked.activation
        );
    }

    println!("{}", "Detected:".cyan().bold());
    for (i, ranked) in report.top.iter().enumerate() {
        println!("  [{}] {}", i + 1, ranked.label);
    }
}

fn print_status(outcome: RunOutcome) {
    let status = match outcome {
        RunOutcome::Passed => "PASSED".green().bold(),
        RunOutcome::Failed => "FAILED".red().bold(),
        RunOutcome::Waived => "WAIVED".yellow().bold(),
    };
    println!("{status} classify");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_flags_rejected_before_loading() {
        let args = Args::try_parse_from(["classify", "--fp32", "--useDLACore=0"]).unwrap();
        let result = RunParams::resolve(&args.to_options());
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_safe_mode_conflicts_rejected() {
        let args = Args::try_parse_from(["classify", "--safeGpuInt8", "--fp32"]).unwrap();
        assert!(RunParams::resolve(&args.to_options()).is_err());

        let args = Args::try_parse_from(["classify", "--safeGpuInt8", "--useDLACore=1"]).unwrap();
        assert!(RunParams::resolve(&args.to_options()).is_err());
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Args::try_parse_from(["classify", "--bogus"]).is_err());
    }

    #[test]
    fn test_equals_syntax_accepted() {
        let args =
            Args::try_parse_from(["classify", "--topBottomK=3", "--image=airliner.ppm"]).unwrap();
        assert_eq!(args.top_bottom_k, 3);
        assert_eq!(args.image, "airliner.ppm");
        assert!(!args.fp32);
    }

    #[test]
    fn test_defaults_match_documentation() {
        let args = Args::try_parse_from(["classify"]).unwrap();
        assert_eq!(args.model, "mobilenet_quantized.onnx");
        assert_eq!(args.top_bottom_k, 5);
        assert!(args.use_dla_core.is_none());
    }
}
