//! Collaborator capability traits.
//!
//! The scheduler and blend tree never train anything themselves; they drive
//! external collaborators through these traits:
//! - `TrainableFactory`: produces a fresh trainable for one run.
//! - `Trainable`: one fitted (or fittable) artifact.
//! - `BudgetTimer`: monotonic wall-clock budget.

use std::time::Duration;

use serde_json::Value;

use crate::error::Result;
use crate::types::{Prediction, ResourceLimits, Task};

/// One training artifact, generic over the dataset representation `D`.
pub trait Trainable<D>: Send + Sync {
    /// Train on `data` and return the out-of-fold validation prediction.
    ///
    /// `roles` describes column roles (target, features, ...) as a free-form
    /// object understood by the implementation.
    fn fit_predict(&mut self, data: &D, roles: &Value) -> Result<Prediction>;

    /// Predict on new data. Only valid after `fit_predict`.
    fn predict(&self, data: &D) -> Result<Prediction>;
}

/// Produces fresh trainables, one per scheduled run.
pub trait TrainableFactory<D>: Send + Sync {
    /// Create a trainable for one run.
    ///
    /// `time_left` is the budget remaining at launch; how the run allocates
    /// it internally is the implementation's concern. `config` identifies the
    /// candidate configuration (`Value::Null` for the anonymous default) and
    /// `params` carries the merged seed overrides plus caller extras.
    fn create(
        &self,
        task: &Task,
        time_left: Duration,
        limits: &ResourceLimits,
        config: &Value,
        params: &Value,
    ) -> Result<Box<dyn Trainable<D>>>;

    /// Default configuration used to discover random-seed parameters.
    ///
    /// Returning `Value::Null` (the default) means no fixed-seed knob exists
    /// and every run is unseeded.
    fn default_config(&self) -> Value {
        Value::Null
    }
}

/// Monotonic wall-clock budget for one `fit_predict` call.
pub trait BudgetTimer: Send + Sync {
    /// Total time allotted.
    fn timeout(&self) -> Duration;

    /// Time spent since the budget started.
    fn elapsed(&self) -> Duration;

    /// Time left, saturating at zero.
    fn remaining(&self) -> Duration {
        self.timeout().saturating_sub(self.elapsed())
    }
}
