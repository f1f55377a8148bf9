//! Image input for the INT8 classification demo.
//!
//! Provides the binary PPM reader and the HWC-to-CHW preprocessing that
//! turns raw pixels into the flat buffer the network consumes.

pub mod ppm;
pub mod preprocess;

pub use ppm::Ppm;
pub use preprocess::{Preprocessor, PIXEL_MEAN};
