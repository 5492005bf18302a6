//! Pipeline adapters and the blend-strategy capability.
//!
//! A [`Pipeline`] lets a raw trained artifact, an atomic list of artifacts,
//! or an already-blended group satisfy one uniform shape, so the same
//! [`BlendStrategy`] interface applies at both levels of the blend tree and
//! predict-time traversal can always recover the raw artifacts a node was
//! built from.

use std::sync::Arc;

use crate::capabilities::Trainable;
use crate::error::Result;
use crate::types::Prediction;

/// A blendable unit: either raw artifacts, or artifacts plus the strategy
/// that already combined them.
pub enum Pipeline<D> {
    /// Raw artifact(s) treated as one atomic unit.
    Single(Vec<Arc<dyn Trainable<D>>>),
    /// Artifacts retained by `blend`, reusable as a single unit one level up.
    Blended {
        artifacts: Vec<Arc<dyn Trainable<D>>>,
        blend: Box<dyn BlendStrategy<D>>,
    },
}

impl<D> Pipeline<D> {
    /// Wrap one raw artifact.
    pub fn single(artifact: Arc<dyn Trainable<D>>) -> Self {
        Pipeline::Single(vec![artifact])
    }

    /// Wrap a list of raw artifacts as one atomic unit.
    pub fn from_artifacts(artifacts: Vec<Arc<dyn Trainable<D>>>) -> Self {
        Pipeline::Single(artifacts)
    }

    /// Wrap artifacts together with the strategy that chose them.
    pub fn blended(
        artifacts: Vec<Arc<dyn Trainable<D>>>,
        blend: Box<dyn BlendStrategy<D>>,
    ) -> Self {
        Pipeline::Blended { artifacts, blend }
    }

    /// The raw artifacts behind this node, in their original order.
    pub fn artifacts(&self) -> &[Arc<dyn Trainable<D>>] {
        match self {
            Pipeline::Single(artifacts) => artifacts,
            Pipeline::Blended { artifacts, .. } => artifacts,
        }
    }

    /// Unwrap to the raw artifacts, dropping any stored strategy.
    pub fn into_artifacts(self) -> Vec<Arc<dyn Trainable<D>>> {
        match self {
            Pipeline::Single(artifacts) => artifacts,
            Pipeline::Blended { artifacts, .. } => artifacts,
        }
    }

    /// The stored blend strategy, if this is a blended node.
    pub fn blend(&self) -> Option<&dyn BlendStrategy<D>> {
        match self {
            Pipeline::Single(_) => None,
            Pipeline::Blended { blend, .. } => Some(blend.as_ref()),
        }
    }
}

impl<D> std::fmt::Debug for Pipeline<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pipeline::Single(artifacts) => {
                f.debug_tuple("Single").field(&artifacts.len()).finish()
            }
            Pipeline::Blended { artifacts, .. } => f
                .debug_struct("Blended")
                .field("artifacts", &artifacts.len())
                .finish(),
        }
    }
}

/// Selects or weights among candidate predictions, retaining the matching
/// pipeline subset.
///
/// Implementations must keep index correspondence between `predictions` and
/// `pipelines`, and `predict` must reproduce the retained subset's combination
/// given same-shaped input.
pub trait BlendStrategy<D>: Send {
    /// Fit the blend over candidate predictions and return the blended
    /// prediction plus the retained pipelines, in retained order.
    fn fit_predict(
        &mut self,
        predictions: &[Prediction],
        pipelines: Vec<Pipeline<D>>,
    ) -> Result<(Prediction, Vec<Pipeline<D>>)>;

    /// Combine predictions from the retained pipelines. No re-fitting.
    fn predict(&self, predictions: &[Prediction]) -> Result<Prediction>;

    /// Deep copy, so one configured strategy can be applied independently per
    /// configuration.
    fn clone_box(&self) -> Box<dyn BlendStrategy<D>>;
}

impl<D> Clone for Box<dyn BlendStrategy<D>> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Prediction;
    use ndarray::array;

    struct Stub(f64);

    impl Trainable<()> for Stub {
        fn fit_predict(&mut self, _data: &(), _roles: &serde_json::Value) -> Result<Prediction> {
            Ok(Prediction::new(array![self.0]))
        }

        fn predict(&self, _data: &()) -> Result<Prediction> {
            Ok(Prediction::new(array![self.0]))
        }
    }

    #[test]
    fn test_single_wraps_one_artifact() {
        let pipe: Pipeline<()> = Pipeline::single(Arc::new(Stub(1.0)));
        assert_eq!(pipe.artifacts().len(), 1);
        assert!(pipe.blend().is_none());
    }

    #[test]
    fn test_from_artifacts_is_one_atomic_unit() {
        let artifacts: Vec<Arc<dyn Trainable<()>>> =
            vec![Arc::new(Stub(1.0)), Arc::new(Stub(2.0))];
        let pipe = Pipeline::from_artifacts(artifacts);
        // Both artifacts travel as one unit, in insertion order.
        assert_eq!(pipe.artifacts().len(), 2);
        let unwrapped = pipe.into_artifacts();
        assert_eq!(unwrapped[0].predict(&()).unwrap().values, array![1.0]);
        assert_eq!(unwrapped[1].predict(&()).unwrap().values, array![2.0]);
    }
}
