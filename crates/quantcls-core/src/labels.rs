//! Reference label list.
//!
//! One class name per line; line order defines the class index, aligned
//! with the network's output activation positions.

use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// Ordered class-name list, index-aligned with output activations
#[derive(Debug, Clone)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    /// Loads labels from a text file, one class name per line.
    ///
    /// An unreadable file aborts the run before any classification output.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Labels(format!(
                "unable to read reference file {}: {e}",
                path.display()
            ))
        })?;

        let names: Vec<String> = content
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();

        if names.is_empty() {
            return Err(Error::Labels(format!(
                "reference file {} contains no labels",
                path.display()
            )));
        }

        Ok(Self { names })
    }

    /// The class name at `index`, if in range
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_labels_index_aligned() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reference_labels.txt");
        fs::write(&path, "tench\ngoldfish\ngreat white shark\n").unwrap();

        let labels = Labels::from_file(&path).unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(0), Some("tench"));
        assert_eq!(labels.get(2), Some("great white shark"));
        assert_eq!(labels.get(3), None);
    }

    #[test]
    fn test_missing_file_aborts() {
        let dir = TempDir::new().unwrap();
        let result = Labels::from_file(&dir.path().join("absent.txt"));
        assert!(matches!(result, Err(Error::Labels(_))));
    }

    #[test]
    fn test_empty_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "").unwrap();

        assert!(matches!(Labels::from_file(&path), Err(Error::Labels(_))));
    }
}
