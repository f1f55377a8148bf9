//! Planar preprocessing for network input.
//!
//! Converts a decoded PPM from interleaved HWC layout to the planar CHW
//! buffer the network expects, subtracting a fixed per-channel mean. The
//! output precision follows the engine mode: `f32` for FP32 inference,
//! `i8` for quantized inference.

use quantcls_core::{Error, InputDimensions, InputTensor, Precision, Result};

use crate::ppm::Ppm;

/// Per-channel mean subtracted from every pixel
pub const PIXEL_MEAN: [i16; 3] = [128, 128, 128];

/// Image preprocessor producing flat planar buffers
#[derive(Debug, Clone)]
pub struct Preprocessor {
    dims: InputDimensions,
    mean: [i16; 3],
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            dims: InputDimensions::imagenet(),
            mean: PIXEL_MEAN,
        }
    }
}

impl Preprocessor {
    /// Creates a preprocessor for the default 3x224x224 input
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the target input dimensions
    pub fn with_dims(mut self, dims: InputDimensions) -> Self {
        self.dims = dims;
        self
    }

    /// The target input dimensions
    pub fn dims(&self) -> InputDimensions {
        self.dims
    }

    /// Preprocesses into the precision the engine mode requires
    pub fn preprocess(&self, ppm: &Ppm, precision: Precision) -> Result<InputTensor> {
        match precision {
            Precision::Fp32 => Ok(InputTensor::Fp32(self.to_chw_f32(ppm)?)),
            Precision::Int8 => Ok(InputTensor::Int8(self.to_chw_i8(ppm)?)),
        }
    }

    /// HWC to CHW with mean subtraction, `f32` output.
    ///
    /// Element `(c, h, w)` equals `pixel(h, w, c) - mean[c]` exactly.
    pub fn to_chw_f32(&self, ppm: &Ppm) -> Result<Vec<f32>> {
        self.check_shape(ppm)?;
        let mut buffer = vec![0.0f32; self.dims.volume()];
        self.reshuffle(ppm, |diff, slot: &mut f32| *slot = diff as f32, &mut buffer);
        Ok(buffer)
    }

    /// HWC to CHW with mean subtraction, narrow signed output.
    ///
    /// With the fixed mean of 128 every difference fits `i8` exactly:
    /// 0 maps to -128 and 255 maps to 127.
    pub fn to_chw_i8(&self, ppm: &Ppm) -> Result<Vec<i8>> {
        self.check_shape(ppm)?;
        let mut buffer = vec![0i8; self.dims.volume()];
        self.reshuffle(
            ppm,
            |diff, slot: &mut i8| *slot = diff.clamp(i8::MIN as i16, i8::MAX as i16) as i8,
            &mut buffer,
        );
        Ok(buffer)
    }

    fn check_shape(&self, ppm: &Ppm) -> Result<()> {
        if self.dims.channels != Ppm::CHANNELS {
            return Err(Error::Ppm(format!(
                "network expects {} channels but PPM images carry {}",
                self.dims.channels,
                Ppm::CHANNELS
            )));
        }
        if ppm.width != self.dims.width || ppm.height != self.dims.height {
            return Err(Error::Ppm(format!(
                "image is {}x{} but the network expects {}x{}",
                ppm.width, ppm.height, self.dims.width, self.dims.height
            )));
        }
        Ok(())
    }

    fn reshuffle<T>(&self, ppm: &Ppm, store: impl Fn(i16, &mut T), buffer: &mut [T]) {
        let (channels, height, width) = (self.dims.channels, self.dims.height, self.dims.width);
        for c in 0..channels {
            for h in 0..height {
                for w in 0..width {
                    let dst = c * height * width + h * width + w;
                    let src = h * width * channels + w * channels + c;
                    let diff = ppm.data[src] as i16 - self.mean[c];
                    store(diff, &mut buffer[dst]);
                }
            }
        }
    }
}
