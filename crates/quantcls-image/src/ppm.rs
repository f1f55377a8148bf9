//! Binary PPM reader.
//!
//! PPM is an uncompressed format: an ASCII header (magic, width, height,
//! max value), one whitespace separator byte, then raw interleaved pixel
//! bytes. Only the 3-channel binary variant (`P6`) is accepted.

use std::fs;
use std::path::Path;

use quantcls_core::{Error, Result};
use tracing::debug;

/// A decoded PPM image with interleaved (HWC) pixel data
#[derive(Debug, Clone)]
pub struct Ppm {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
    /// Maximum channel value declared by the header
    pub max_value: u32,
    /// Raw pixel bytes, `height * width * 3` long, HWC order
    pub data: Vec<u8>,
}

impl Ppm {
    /// Number of color channels in a P6 image
    pub const CHANNELS: usize = 3;

    /// Reads a binary PPM file.
    ///
    /// The file extension must be `ppm`; a short or malformed read is a
    /// fatal error for the run.
    pub fn read_file(path: &Path) -> Result<Self> {
        let extension_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("ppm"))
            .unwrap_or(false);
        if !extension_ok {
            return Err(Error::Ppm(format!(
                "wrong format: {} is not a ppm file",
                path.display()
            )));
        }

        let bytes = fs::read(path)
            .map_err(|e| Error::Ppm(format!("could not read {}: {e}", path.display())))?;
        let ppm = Self::decode(&bytes).map_err(|e| match e {
            Error::Ppm(msg) => Error::Ppm(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        debug!(
            "decoded {}x{} PPM from {}",
            ppm.width,
            ppm.height,
            path.display()
        );
        Ok(ppm)
    }

    /// Decodes a binary PPM from memory.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut pos = 0usize;

        let magic = next_token(bytes, &mut pos)
            .ok_or_else(|| Error::Ppm("missing magic header".to_string()))?;
        if magic != "P6" {
            return Err(Error::Ppm(format!(
                "unsupported magic {magic:?}, expected \"P6\""
            )));
        }

        let width = next_field(bytes, &mut pos, "width")?;
        let height = next_field(bytes, &mut pos, "height")?;
        let max_value = next_field(bytes, &mut pos, "max value")?;
        if max_value == 0 || max_value > 255 {
            return Err(Error::Ppm(format!(
                "max value {max_value} does not fit one byte per channel"
            )));
        }

        // Exactly one whitespace byte separates the header from pixel data.
        pos += 1;

        let expected = width * height * Self::CHANNELS;
        let available = bytes.len().saturating_sub(pos);
        if available < expected {
            return Err(Error::Ppm(format!(
                "truncated pixel data: expected {expected} bytes, found {available}"
            )));
        }

        Ok(Self {
            width,
            height,
            max_value: max_value as u32,
            data: bytes[pos..pos + expected].to_vec(),
        })
    }

    /// The raw channel byte at `(h, w, c)` in the interleaved layout
    pub fn pixel(&self, h: usize, w: usize, c: usize) -> u8 {
        self.data[h * self.width * Self::CHANNELS + w * Self::CHANNELS + c]
    }
}

fn next_token(bytes: &[u8], pos: &mut usize) -> Option<String> {
    while *pos < bytes.len() && bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    let start = *pos;
    while *pos < bytes.len() && !bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    if start < *pos {
        Some(String::from_utf8_lossy(&bytes[start..*pos]).into_owned())
    } else {
        None
    }
}

fn next_field(bytes: &[u8], pos: &mut usize, field: &str) -> Result<usize> {
    let token = next_token(bytes, pos)
        .ok_or_else(|| Error::Ppm(format!("missing {field} in header")))?;
    let value: usize = token
        .parse()
        .map_err(|_| Error::Ppm(format!("invalid {field} {token:?} in header")))?;
    if value == 0 {
        return Err(Error::Ppm(format!("{field} must be non-zero")));
    }
    Ok(value)
}
