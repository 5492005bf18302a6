//! Time-utilization orchestrator — the two-level blend tree.
//!
//! `fit_predict` spends the whole budget on multistart runs, blends reruns of
//! each configuration with the inner strategy, then blends across
//! configurations with the outer strategy. The retained outer pipelines are
//! the entire fit state; `predict` walks them bottom-up without re-fitting.

use std::time::Duration;

use serde_json::Value;
use timeblend_core::{
    BlendStrategy, BudgetTimer, Error, Pipeline, Prediction, ResourceLimits, Result, SeedTree,
    Task, TrainableFactory, RANDOM_STATE_KEY,
};
use tracing::{debug, info};

use crate::blend::BestSelector;
use crate::budget::WallClockBudget;
use crate::scheduler::RunScheduler;
use crate::types::UtilizationReport;

/// Builder for [`TimeUtilization`].
pub struct UtilizationBuilder<D> {
    factory: Box<dyn TrainableFactory<D>>,
    task: Task,
    timeout: Duration,
    limits: ResourceLimits,
    configs: Vec<Value>,
    inner_blend: Option<Box<dyn BlendStrategy<D>>>,
    outer_blend: Option<Box<dyn BlendStrategy<D>>>,
    drop_last: bool,
    max_runs_per_config: usize,
    seeds: Option<SeedTree>,
    random_state: i64,
    extra_params: Value,
}

impl<D: 'static> UtilizationBuilder<D> {
    pub fn new(factory: impl TrainableFactory<D> + 'static, task: Task) -> Self {
        Self {
            factory: Box::new(factory),
            task,
            timeout: Duration::from_secs(3600),
            limits: ResourceLimits::default(),
            configs: Vec::new(),
            inner_blend: None,
            outer_blend: None,
            drop_last: true,
            max_runs_per_config: 5,
            seeds: None,
            random_state: 42,
            extra_params: Value::Null,
        }
    }

    /// Total wall-clock budget for one `fit_predict` call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resource limits handed to every training run.
    pub fn limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Candidate configurations, in schedule order. An empty list falls back
    /// to one anonymous configuration.
    pub fn configs(mut self, configs: Vec<Value>) -> Self {
        self.configs = configs;
        self
    }

    /// Append one candidate configuration.
    pub fn config(mut self, config: Value) -> Self {
        self.configs.push(config);
        self
    }

    /// Strategy blending reruns of the same configuration.
    pub fn inner_blend(mut self, blend: Box<dyn BlendStrategy<D>>) -> Self {
        self.inner_blend = Some(blend);
        self
    }

    /// Strategy blending across configurations.
    pub fn outer_blend(mut self, blend: Box<dyn BlendStrategy<D>>) -> Self {
        self.outer_blend = Some(blend);
        self
    }

    /// Whether to evict the newest run after a multi-pass schedule.
    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    /// Cap on runs per configuration.
    ///
    /// A value of 0 is clamped to 1: the scheduler guarantees every
    /// configuration attempted in the first pass gets its run, so a cap
    /// below one run per configuration is not honorable.
    pub fn max_runs_per_config(mut self, max_runs: usize) -> Self {
        self.max_runs_per_config = max_runs.max(1);
        self
    }

    /// Explicit seed tree, skipping discovery against the factory's default
    /// configuration.
    pub fn seed_tree(mut self, seeds: SeedTree) -> Self {
        self.seeds = Some(seeds);
        self
    }

    /// Base seed used when discovering the seed tree.
    pub fn random_state(mut self, random_state: i64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Caller params merged into every run (seed overrides win on collision).
    pub fn extra_params(mut self, params: Value) -> Self {
        self.extra_params = params;
        self
    }

    pub fn build(self) -> TimeUtilization<D> {
        let configs = if self.configs.is_empty() {
            vec![Value::Null]
        } else {
            self.configs
        };
        let seeds = self.seeds.unwrap_or_else(|| {
            SeedTree::locate(&self.factory.default_config(), RANDOM_STATE_KEY, self.random_state)
        });
        if seeds.is_empty() {
            debug!("No random-state keys located; runs will not be reseeded");
        }
        let inner_blend = self
            .inner_blend
            .unwrap_or_else(|| Box::new(BestSelector::new()));
        let outer_blend = self
            .outer_blend
            .unwrap_or_else(|| Box::new(BestSelector::new()));

        info!(
            "TimeUtilization: {} configs, timeout {:?}, max {} runs per config, drop_last={}",
            configs.len(),
            self.timeout,
            self.max_runs_per_config,
            self.drop_last
        );

        TimeUtilization {
            factory: self.factory,
            task: self.task,
            timeout: self.timeout,
            limits: self.limits,
            configs,
            inner_blend,
            outer_blend,
            drop_last: self.drop_last,
            max_runs_per_config: self.max_runs_per_config,
            seeds,
            extra_params: self.extra_params,
            outer_pipes: Vec::new(),
            last_report: None,
        }
    }
}

/// Spends a wall-clock budget on multistart training and blends the results.
pub struct TimeUtilization<D> {
    factory: Box<dyn TrainableFactory<D>>,
    task: Task,
    timeout: Duration,
    limits: ResourceLimits,
    configs: Vec<Value>,
    inner_blend: Box<dyn BlendStrategy<D>>,
    outer_blend: Box<dyn BlendStrategy<D>>,
    drop_last: bool,
    max_runs_per_config: usize,
    seeds: SeedTree,
    extra_params: Value,
    outer_pipes: Vec<Pipeline<D>>,
    last_report: Option<UtilizationReport>,
}

impl<D: 'static> TimeUtilization<D> {
    pub fn builder(factory: impl TrainableFactory<D> + 'static, task: Task) -> UtilizationBuilder<D> {
        UtilizationBuilder::new(factory, task)
    }

    /// Seed tree in use (discovered or supplied).
    pub fn seed_tree(&self) -> &SeedTree {
        &self.seeds
    }

    /// Whether a fit state exists.
    pub fn is_fitted(&self) -> bool {
        !self.outer_pipes.is_empty()
    }

    /// Retained outer pipelines, one per surviving configuration entry.
    pub fn outer_pipelines(&self) -> &[Pipeline<D>] {
        &self.outer_pipes
    }

    /// Summary of the most recent `fit_predict`.
    pub fn last_report(&self) -> Option<&UtilizationReport> {
        self.last_report.as_ref()
    }

    /// Schedule runs over the budget, then build the two-level blend tree.
    ///
    /// Any training failure aborts the whole call; there are no retries and
    /// no partial ensemble.
    pub fn fit_predict(&mut self, data: &D, roles: &Value) -> Result<Prediction> {
        let budget = WallClockBudget::start(self.timeout);
        self.outer_pipes.clear();
        self.last_report = None;

        let scheduler = RunScheduler::new(
            self.factory.as_ref(),
            &self.task,
            &self.limits,
            &self.configs,
            &self.seeds,
            &self.extra_params,
            self.max_runs_per_config,
        );
        let mut outcome = scheduler.run(&budget, data, roles)?;

        let total_runs = outcome.total_runs();
        let passes = outcome.passes;
        let dropped_last = self.drop_last && outcome.drop_last();
        outcome.prune_empty();

        // Inner blend: reruns of one configuration.
        let mut inner_preds = Vec::with_capacity(outcome.groups.len());
        let mut inner_pipes = Vec::with_capacity(outcome.groups.len());
        for group in outcome.groups {
            let preds: Vec<Prediction> = group.iter().map(|r| r.prediction.clone()).collect();
            let pipes: Vec<Pipeline<D>> = group
                .into_iter()
                .map(|r| Pipeline::single(r.artifact))
                .collect();

            let mut blend = self.inner_blend.clone_box();
            let (pred, retained) = blend.fit_predict(&preds, pipes)?;
            let artifacts: Vec<_> = retained
                .into_iter()
                .flat_map(Pipeline::into_artifacts)
                .collect();

            inner_preds.push(pred);
            inner_pipes.push(Pipeline::blended(artifacts, blend));
        }

        // Outer blend: across configurations. An empty ensemble surfaces as
        // the strategy's own error.
        let surviving = inner_pipes.len();
        let (pred, retained) = self.outer_blend.fit_predict(&inner_preds, inner_pipes)?;
        self.outer_pipes = retained;

        self.last_report = Some(UtilizationReport {
            total_runs,
            passes,
            dropped_last,
            surviving_configs: surviving,
            duration_ms: budget.elapsed().as_millis() as u64,
        });
        info!(
            "fit_predict complete: {} runs over {} passes, {} configs survived",
            total_runs, passes, surviving
        );

        Ok(pred)
    }

    /// Predict on new data by walking the retained blend tree bottom-up.
    pub fn predict(&self, data: &D) -> Result<Prediction> {
        if self.outer_pipes.is_empty() {
            return Err(Error::NotFitted);
        }

        let mut outer_preds = Vec::with_capacity(self.outer_pipes.len());
        for pipe in &self.outer_pipes {
            let mut inner_preds = Vec::with_capacity(pipe.artifacts().len());
            for artifact in pipe.artifacts() {
                inner_preds.push(artifact.predict(data)?);
            }
            let blend = pipe
                .blend()
                .ok_or_else(|| Error::Ensemble("retained pipeline holds no blend strategy".into()))?;
            outer_preds.push(blend.predict(&inner_preds)?);
        }

        self.outer_blend.predict(&outer_preds)
    }
}
