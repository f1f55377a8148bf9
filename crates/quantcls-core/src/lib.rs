//! Core types and utilities for the per-tensor INT8 classification demo.
//!
//! This crate provides the foundational types shared across the workspace:
//! the error taxonomy, run parameters, the per-tensor dynamic-range table,
//! the reference label list, and the top/bottom-K report.

pub mod cli;
pub mod error;
pub mod labels;
pub mod params;
pub mod ranges;
pub mod report;
pub mod types;

pub use error::{Error, Result};
pub use labels::Labels;
pub use params::{locate_file, RunOptions, RunParams};
pub use ranges::{RangeMap, DEFAULT_DYNAMIC_RANGE};
pub use report::{argsort, classify, Classification, RankedClass};
pub use types::*;
