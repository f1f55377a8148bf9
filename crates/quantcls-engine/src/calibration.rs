//! Calibration-table emission.
//!
//! The runtime consumes per-tensor scales as a calibration table: one
//! format header line, then `name: <hex>` entries where the hex value is
//! the IEEE-754 bit pattern of the tensor's scale. A symmetric dynamic
//! range `[-r, r]` maps to the scale `r / 127`.

use std::fs;
use std::path::Path;

use quantcls_core::{Error, RangeMap, Result};
use tracing::debug;

/// Format header the runtime expects on the first line
pub const TABLE_HEADER: &str = "TRT-8600-EntropyCalibration2";

/// Number of positive INT8 quantization levels
pub const INT8_LEVELS: f32 = 127.0;

/// Quantization scale for a symmetric dynamic range
pub fn scale_for(range: f32) -> f32 {
    range / INT8_LEVELS
}

/// Hex encoding of a range's scale, as the table format requires
pub fn scale_hex(range: f32) -> String {
    format!("{:08x}", scale_for(range).to_bits())
}

/// Writes the calibration table for an engine build.
///
/// Every entry of the range file is emitted, plus `required_tensors` the
/// file does not cover, at the default magnitude. Entries are sorted so
/// the table is deterministic.
pub fn write_calibration_table(
    path: &Path,
    ranges: &RangeMap,
    required_tensors: &[String],
) -> Result<()> {
    let mut lines = vec![TABLE_HEADER.to_string()];

    for name in ranges.sorted_names() {
        lines.push(format!("{name}: {}", scale_hex(ranges.effective_range(name))));
    }

    let mut defaulted: Vec<&String> = required_tensors
        .iter()
        .filter(|name| !ranges.contains(name))
        .collect();
    defaulted.sort_unstable();
    for name in defaulted {
        debug!("missing dynamic range for tensor {name}, using default scale of 127");
        lines.push(format!("{name}: {}", scale_hex(ranges.effective_range(name))));
    }

    let mut table = lines.join("\n");
    table.push('\n');
    fs::write(path, table).map_err(|e| {
        Error::Engine(format!(
            "could not write calibration table {}: {e}",
            path.display()
        ))
    })
}
