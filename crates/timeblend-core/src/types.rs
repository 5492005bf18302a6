//! Shared data types.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// The problem being solved (e.g. "binary", "reg", "multiclass").
///
/// Opaque to the scheduler and blend tree; it is handed through to the
/// trainable factory unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task name as understood by the factory.
    pub name: String,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Resource limits passed to every training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Memory limit in GB for one run.
    #[serde(rename = "memoryLimitGb")]
    pub memory_limit_gb: usize,
    /// CPU core limit for one run.
    #[serde(rename = "cpuLimit")]
    pub cpu_limit: usize,
    /// GPU device ids (e.g. "0,1"), if any.
    #[serde(rename = "gpuIds")]
    pub gpu_ids: Option<String>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_limit_gb: 16,
            cpu_limit: 4,
            gpu_ids: None,
        }
    }
}

/// Validation prediction produced by one trainable or one blend.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Per-row predicted values.
    pub values: Array1<f64>,
    /// Validation score, if the producer computed one. Higher is better.
    pub score: Option<f64>,
}

impl Prediction {
    pub fn new(values: Array1<f64>) -> Self {
        Self {
            values,
            score: None,
        }
    }

    pub fn with_score(values: Array1<f64>, score: f64) -> Self {
        Self {
            values,
            score: Some(score),
        }
    }

    /// Number of rows in the prediction.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_default_limits() {
        let limits = ResourceLimits::default();
        assert_eq!(limits.memory_limit_gb, 16);
        assert_eq!(limits.cpu_limit, 4);
        assert!(limits.gpu_ids.is_none());
    }

    #[test]
    fn test_prediction_score() {
        let pred = Prediction::with_score(array![0.1, 0.9], 0.85);
        assert_eq!(pred.len(), 2);
        assert_eq!(pred.score, Some(0.85));
    }
}
