//! Per-tensor dynamic-range table.
//!
//! A dynamic-range file is plain text with one `tensorName:value` entry per
//! line. The value is the maximum absolute magnitude of the symmetric
//! clipping interval `[-value, value]` used to quantize that tensor.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::{Error, Result};

/// Clip magnitude assumed for tensors missing from the range file
pub const DEFAULT_DYNAMIC_RANGE: f32 = 127.0;

/// Mapping from tensor name to maximum absolute dynamic-range value
#[derive(Debug, Clone, Default)]
pub struct RangeMap {
    values: HashMap<String, f32>,
}

impl RangeMap {
    /// Creates an empty range map
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a range map from a `name:value` file.
    ///
    /// A missing file is a reported, recoverable error for the run.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Ranges(format!(
                "could not read per tensor scales file {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(&content)
    }

    /// Parses range entries from text, one `name:value` per line.
    ///
    /// Malformed lines fail fast naming the offending line; duplicate names
    /// keep the last occurrence.
    pub fn parse(content: &str) -> Result<Self> {
        let mut values = HashMap::new();

        for (number, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            // The delimiter is the first ':'; tensor names never contain one.
            let (name, value) = line.split_once(':').ok_or_else(|| {
                Error::Ranges(format!(
                    "line {}: missing ':' delimiter in {:?}",
                    number + 1,
                    line
                ))
            })?;

            let range: f32 = value.trim().parse().map_err(|_| {
                Error::Ranges(format!(
                    "line {}: invalid range value {:?} for tensor {:?}",
                    number + 1,
                    value,
                    name
                ))
            })?;

            if !range.is_finite() || range < 0.0 {
                return Err(Error::Ranges(format!(
                    "line {}: range for tensor {:?} must be a non-negative finite value, got {}",
                    number + 1,
                    name,
                    range
                )));
            }

            values.insert(name.to_string(), range);
        }

        debug!("loaded {} per-tensor dynamic range entries", values.len());
        Ok(Self { values })
    }

    /// The clip magnitude for a tensor: its entry, or the default when the
    /// file does not cover it.
    pub fn effective_range(&self, tensor_name: &str) -> f32 {
        self.values
            .get(tensor_name)
            .copied()
            .unwrap_or(DEFAULT_DYNAMIC_RANGE)
    }

    /// Whether the file provided a range for this tensor
    pub fn contains(&self, tensor_name: &str) -> bool {
        self.values.contains_key(tensor_name)
    }

    /// Number of entries read from the file
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(name, range)` entries in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(name, &range)| (name.as_str(), range))
    }

    /// Entry names sorted for deterministic output
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_counts_valid_lines() {
        let map = RangeMap::parse("conv1:12.5\nrelu1:6.0\nfc:3.25\n").unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.effective_range("conv1"), 12.5);
        assert_eq!(map.effective_range("fc"), 3.25);
    }

    #[test]
    fn test_last_occurrence_wins_on_duplicates() {
        let map = RangeMap::parse("conv1:1.0\nconv1:2.0\n").unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.effective_range("conv1"), 2.0);
    }

    #[test]
    fn test_missing_tensor_uses_default() {
        let map = RangeMap::parse("conv1:8.0\n").unwrap();
        assert_eq!(map.effective_range("never_listed"), DEFAULT_DYNAMIC_RANGE);
        assert_eq!(map.effective_range("never_listed"), 127.0);
        assert!(!map.contains("never_listed"));
    }

    #[test]
    fn test_missing_delimiter_reports_line() {
        let err = RangeMap::parse("conv1:1.0\nno delimiter here\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 2"), "got: {message}");
    }

    #[test]
    fn test_non_numeric_value_reports_line() {
        let err = RangeMap::parse("conv1:abc\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_negative_value_rejected() {
        let err = RangeMap::parse("conv1:-4.0\n").unwrap_err();
        assert!(matches!(err, Error::Ranges(_)));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let map = RangeMap::parse("conv1:1.0\n\n   \nfc:2.0\n").unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_splits_at_first_delimiter() {
        let err = RangeMap::parse("scope:conv1:5.0").unwrap_err();
        // "conv1:5.0" is not a number, so the first-delimiter rule makes
        // this line malformed rather than silently mis-keyed.
        assert!(matches!(err, Error::Ranges(_)));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let result = RangeMap::from_file(&dir.path().join("absent.txt"));
        assert!(matches!(result, Err(Error::Ranges(_))));
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ranges.txt");
        fs::write(&path, "input:127.0\nprob:1.0\n").unwrap();

        let map = RangeMap::from_file(&path).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.effective_range("prob"), 1.0);
    }

    #[test]
    fn test_sorted_names_deterministic() {
        let map = RangeMap::parse("b:1.0\na:2.0\nc:3.0\n").unwrap();
        assert_eq!(map.sorted_names(), vec!["a", "b", "c"]);
    }
}
