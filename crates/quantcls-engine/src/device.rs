//! Platform capability detection.
//!
//! INT8 mode needs the TensorRT execution provider; FP32 mode needs plain
//! CUDA. Availability is asked of the runtime itself, with a system-level
//! probe kept for verbose diagnostics.

use ort::{CUDAExecutionProvider, ExecutionProvider, TensorRTExecutionProvider};
use tracing::debug;

/// Whether the runtime can build quantized engines on this platform
pub fn platform_has_int8_support() -> bool {
    TensorRTExecutionProvider::default()
        .is_available()
        .unwrap_or(false)
}

/// Whether plain CUDA execution is available
pub fn cuda_available() -> bool {
    CUDAExecutionProvider::default()
        .is_available()
        .unwrap_or(false)
}

/// Check for an NVIDIA GPU at the system level
pub fn has_nvidia_gpu() -> bool {
    #[cfg(target_os = "linux")]
    {
        std::path::Path::new("/proc/driver/nvidia/version").exists()
            || std::path::Path::new("/dev/nvidia0").exists()
            || std::env::var("CUDA_VISIBLE_DEVICES").is_ok()
            || std::process::Command::new("nvidia-smi")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("nvidia-smi.exe")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        false
    }
}

/// Log what the platform offers; used in verbose mode
pub fn log_device_info() {
    debug!(
        "NVIDIA GPU detected at system level: {}",
        has_nvidia_gpu()
    );
    debug!("CUDA execution provider available: {}", cuda_available());
    debug!(
        "TensorRT execution provider available: {}",
        platform_has_int8_support()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probes_do_not_panic() {
        let _ = has_nvidia_gpu();
        let _ = cuda_available();
        let _ = platform_has_int8_support();
    }
}
