//! Built-in blend strategies.
//!
//! Both strategies are usable at either level of the blend tree. They keep
//! index correspondence between predictions and pipelines, and their retained
//! subsets are reproducible at predict time.

use timeblend_core::{BlendStrategy, Error, Pipeline, Prediction, Result};
use tracing::debug;

/// Retains exactly the best-scoring pipeline.
///
/// Predictions without a score rank lowest; ties keep the earliest index.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestSelector;

impl BestSelector {
    pub fn new() -> Self {
        Self
    }
}

impl<D> BlendStrategy<D> for BestSelector {
    fn fit_predict(
        &mut self,
        predictions: &[Prediction],
        pipelines: Vec<Pipeline<D>>,
    ) -> Result<(Prediction, Vec<Pipeline<D>>)> {
        check_lengths(predictions, &pipelines)?;

        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (idx, pred) in predictions.iter().enumerate() {
            let score = pred.score.unwrap_or(f64::NEG_INFINITY);
            if score > best_score {
                best = idx;
                best_score = score;
            }
        }
        debug!("Selected candidate {} of {} (score {})", best, predictions.len(), best_score);

        let retained = pipelines
            .into_iter()
            .nth(best)
            .map(|p| vec![p])
            .unwrap_or_default();
        Ok((predictions[best].clone(), retained))
    }

    fn predict(&self, predictions: &[Prediction]) -> Result<Prediction> {
        match predictions {
            [single] => Ok(single.clone()),
            [] => Err(Error::Blend("cannot blend an empty prediction list".into())),
            _ => Err(Error::Blend(format!(
                "expected one retained prediction, got {}",
                predictions.len()
            ))),
        }
    }

    fn clone_box(&self) -> Box<dyn BlendStrategy<D>> {
        Box::new(*self)
    }
}

/// Element-wise mean over all candidate predictions; retains every pipeline
/// in input order.
///
/// The blended score is the mean of the input scores that are present.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanBlender;

impl MeanBlender {
    pub fn new() -> Self {
        Self
    }
}

impl<D> BlendStrategy<D> for MeanBlender {
    fn fit_predict(
        &mut self,
        predictions: &[Prediction],
        pipelines: Vec<Pipeline<D>>,
    ) -> Result<(Prediction, Vec<Pipeline<D>>)> {
        check_lengths(predictions, &pipelines)?;
        Ok((mean(predictions)?, pipelines))
    }

    fn predict(&self, predictions: &[Prediction]) -> Result<Prediction> {
        mean(predictions)
    }

    fn clone_box(&self) -> Box<dyn BlendStrategy<D>> {
        Box::new(*self)
    }
}

fn check_lengths<D>(predictions: &[Prediction], pipelines: &[Pipeline<D>]) -> Result<()> {
    if predictions.is_empty() {
        return Err(Error::Blend("cannot blend an empty prediction list".into()));
    }
    if predictions.len() != pipelines.len() {
        return Err(Error::Blend(format!(
            "{} predictions for {} pipelines",
            predictions.len(),
            pipelines.len()
        )));
    }
    Ok(())
}

fn mean(predictions: &[Prediction]) -> Result<Prediction> {
    let first = predictions
        .first()
        .ok_or_else(|| Error::Blend("cannot blend an empty prediction list".into()))?;

    let mut acc = first.values.clone();
    for pred in &predictions[1..] {
        if pred.values.len() != acc.len() {
            return Err(Error::Blend(format!(
                "prediction length mismatch: {} vs {}",
                pred.values.len(),
                acc.len()
            )));
        }
        acc = acc + &pred.values;
    }
    acc /= predictions.len() as f64;

    let scores: Vec<f64> = predictions.iter().filter_map(|p| p.score).collect();
    let score = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    Ok(Prediction { values: acc, score })
}
