//! Top/bottom-K classification report.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::labels::Labels;
use crate::{Error, Result};

/// Indices that sort `values`, stably, in the requested direction.
///
/// Ties keep their input order; the relative order of exactly equal
/// activations is otherwise unspecified.
pub fn argsort(values: &[f32], descending: bool) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| {
        let ordering = values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal);
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
    indices
}

/// One ranked class in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedClass {
    /// Class index in the output vector
    pub index: usize,
    /// Class name from the reference label list
    pub label: String,
    /// Raw activation value
    pub activation: f32,
}

/// The top-K and bottom-K classes for one output vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// K highest-scoring classes, descending
    pub top: Vec<RankedClass>,
    /// K lowest-scoring classes, ascending
    pub bottom: Vec<RankedClass>,
}

/// Ranks an output activation vector against the reference labels.
///
/// `k` is clamped to the number of classes. The label list must cover
/// every output position.
pub fn classify(output: &[f32], labels: &Labels, k: usize) -> Result<Classification> {
    if output.is_empty() {
        return Err(Error::InvalidArgument(
            "output activation vector is empty".to_string(),
        ));
    }
    if labels.len() < output.len() {
        return Err(Error::Labels(format!(
            "reference label list has {} entries but the network produced {} activations",
            labels.len(),
            output.len()
        )));
    }

    let k = k.min(output.len());
    let ranked = |indices: &[usize]| -> Vec<RankedClass> {
        indices
            .iter()
            .take(k)
            .map(|&index| RankedClass {
                index,
                // Bounds were checked against the label list above.
                label: labels.get(index).unwrap_or_default().to_string(),
                activation: output[index],
            })
            .collect()
    };

    let top = ranked(&argsort(output, true));
    let bottom = ranked(&argsort(output, false));

    Ok(Classification { top, bottom })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn labels(names: &[&str]) -> Labels {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.txt");
        fs::write(&path, names.join("\n")).unwrap();
        Labels::from_file(&path).unwrap()
    }

    #[test]
    fn test_argsort_descending() {
        let indices = argsort(&[0.1, 0.9, 0.05, 0.3], true);
        assert_eq!(indices, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_argsort_ascending() {
        let indices = argsort(&[0.1, 0.9, 0.05, 0.3], false);
        assert_eq!(indices, vec![2, 0, 3, 1]);
    }

    #[test]
    fn test_classify_fixed_vector() {
        let labels = labels(&["a", "b", "c", "d"]);
        let report = classify(&[0.1, 0.9, 0.05, 0.3], &labels, 2).unwrap();

        let top: Vec<usize> = report.top.iter().map(|r| r.index).collect();
        let bottom: Vec<usize> = report.bottom.iter().map(|r| r.index).collect();
        assert_eq!(top, vec![1, 3]);
        assert_eq!(bottom, vec![2, 0]);

        assert_eq!(report.top[0].label, "b");
        assert_eq!(report.top[0].activation, 0.9);
        assert_eq!(report.bottom[0].label, "c");
    }

    #[test]
    fn test_k_clamped_to_class_count() {
        let labels = labels(&["a", "b"]);
        let report = classify(&[0.5, 0.2], &labels, 10).unwrap();
        assert_eq!(report.top.len(), 2);
        assert_eq!(report.bottom.len(), 2);
    }

    #[test]
    fn test_short_label_list_rejected() {
        let labels = labels(&["only_one"]);
        let result = classify(&[0.5, 0.2], &labels, 1);
        assert!(matches!(result, Err(Error::Labels(_))));
    }

    #[test]
    fn test_empty_output_rejected() {
        let labels = labels(&["a"]);
        assert!(classify(&[], &labels, 1).is_err());
    }

    #[test]
    fn test_report_serializes() {
        let labels = labels(&["a", "b"]);
        let report = classify(&[0.5, 0.2], &labels, 1).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: Classification = serde_json::from_str(&json).unwrap();
        assert_eq!(back.top[0].index, 0);
    }
}
