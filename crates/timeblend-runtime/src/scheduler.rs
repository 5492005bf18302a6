//! Time-budgeted multistart scheduling.
//!
//! The scheduler sweeps the configuration list in order, launching one run
//! per configuration per pass, until the remaining budget drops below the
//! mean duration of the runs recorded so far or the run cap is reached. A
//! run in progress is never preempted; the budget is polled only between
//! runs, and the very first run always proceeds no matter how small the
//! budget is.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use timeblend_core::{
    BudgetTimer, Error, Prediction, ResourceLimits, Result, SeedTree, Task, Trainable,
    TrainableFactory,
};
use tracing::{debug, info};

/// One recorded training attempt.
pub struct Run<D> {
    /// Index into the scheduled configuration list.
    pub config_index: usize,
    /// Global run ordinal, doubling as the seed offset. Never repeats.
    pub generation: u64,
    /// Seed overrides this run was trained with.
    pub seeds: SeedTree,
    /// The fitted artifact.
    pub artifact: Arc<dyn Trainable<D>>,
    /// Out-of-fold validation prediction from `fit_predict`.
    pub prediction: Prediction,
    /// Wall-clock time this run took.
    pub duration: Duration,
}

impl<D> std::fmt::Debug for Run<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Run")
            .field("config_index", &self.config_index)
            .field("generation", &self.generation)
            .field("duration", &self.duration)
            .finish()
    }
}

/// Everything the multistart loop produced.
#[derive(Debug)]
pub struct ScheduleOutcome<D> {
    /// One run group per configuration, in configuration order.
    pub groups: Vec<Vec<Run<D>>>,
    /// Number of passes started over the configuration list.
    pub passes: u32,
    /// Index of the group that was active when the loop stopped.
    pub last_active: usize,
}

impl<D> ScheduleOutcome<D> {
    /// Evict the newest run of the last-active group.
    ///
    /// Applies only when more than one pass started; the evicted run is
    /// assumed truncated by the timeout whether or not it actually was.
    /// Returns true if a run was dropped.
    pub fn drop_last(&mut self) -> bool {
        if self.passes <= 1 {
            return false;
        }
        match self.groups.get_mut(self.last_active).and_then(Vec::pop) {
            Some(run) => {
                info!(
                    "Dropped run {} of config {} as likely truncated",
                    run.generation, run.config_index
                );
                true
            }
            None => false,
        }
    }

    /// Remove emptied groups; their configurations leave the ensemble.
    pub fn prune_empty(&mut self) {
        self.groups.retain(|g| !g.is_empty());
    }

    /// Total number of recorded runs.
    pub fn total_runs(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}

/// The multistart loop over an injected budget timer.
pub struct RunScheduler<'a, D> {
    factory: &'a dyn TrainableFactory<D>,
    task: &'a Task,
    limits: &'a ResourceLimits,
    configs: &'a [Value],
    seeds: &'a SeedTree,
    extra_params: &'a Value,
    max_runs_per_config: usize,
}

impl<'a, D> RunScheduler<'a, D> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        factory: &'a dyn TrainableFactory<D>,
        task: &'a Task,
        limits: &'a ResourceLimits,
        configs: &'a [Value],
        seeds: &'a SeedTree,
        extra_params: &'a Value,
        max_runs_per_config: usize,
    ) -> Self {
        Self {
            factory,
            task,
            limits,
            configs,
            seeds,
            extra_params,
            max_runs_per_config,
        }
    }

    /// Run the multistart loop until the stop condition fires.
    ///
    /// A training failure aborts the whole schedule; partial results are
    /// discarded with it.
    pub fn run(&self, budget: &dyn BudgetTimer, data: &D, roles: &Value) -> Result<ScheduleOutcome<D>> {
        if self.configs.is_empty() {
            return Err(Error::Config("no configurations to schedule".into()));
        }

        let max_total = (self.max_runs_per_config * self.configs.len()) as u64;
        let mut groups: Vec<Vec<Run<D>>> = self.configs.iter().map(|_| Vec::new()).collect();
        let mut history: Vec<Duration> = Vec::new();
        let mut generation: u64 = 0;
        let mut passes: u32 = 0;
        let mut last_active = 0;

        let mut scheduling = true;
        while scheduling {
            passes += 1;
            for (idx, config) in self.configs.iter().enumerate() {
                last_active = idx;

                let seeds = self.seeds.generate(generation as i64);
                let run_generation = generation;
                generation += 1;
                info!(
                    "Run {} (config {}, pass {}): random states {}",
                    run_generation,
                    idx,
                    passes,
                    seeds.to_value()
                );

                let mut params = self.extra_params.clone();
                seeds.merge_into(&mut params);

                let mut artifact =
                    self.factory
                        .create(self.task, budget.remaining(), self.limits, config, &params)?;
                let prediction = artifact.fit_predict(data, roles)?;

                let spent = budget
                    .elapsed()
                    .saturating_sub(history.iter().sum::<Duration>());
                history.push(spent);
                groups[idx].push(Run {
                    config_index: idx,
                    generation: run_generation,
                    seeds,
                    artifact: Arc::from(artifact),
                    prediction,
                    duration: spent,
                });

                let mean = history.iter().sum::<Duration>() / history.len() as u32;
                if budget.remaining() < mean || generation >= max_total {
                    debug!(
                        "Stopping after run {}: remaining {:?}, mean run {:?}, {} of {} runs",
                        run_generation,
                        budget.remaining(),
                        mean,
                        generation,
                        max_total
                    );
                    scheduling = false;
                    break;
                }
            }
        }

        Ok(ScheduleOutcome {
            groups,
            passes,
            last_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::ManualBudget;
    use ndarray::Array1;
    use serde_json::json;

    /// Trainable that advances a shared manual clock when fitted.
    struct FakeTrainable {
        clock: Arc<ManualBudget>,
        cost: Duration,
        value: f64,
    }

    impl Trainable<Vec<f64>> for FakeTrainable {
        fn fit_predict(&mut self, data: &Vec<f64>, _roles: &Value) -> Result<Prediction> {
            self.clock.advance(self.cost);
            Ok(Prediction::with_score(
                Array1::from_elem(data.len(), self.value),
                self.value,
            ))
        }

        fn predict(&self, data: &Vec<f64>) -> Result<Prediction> {
            Ok(Prediction::new(Array1::from_elem(data.len(), self.value)))
        }
    }

    /// Factory with a fixed cost per configuration index.
    struct FakeFactory {
        clock: Arc<ManualBudget>,
        costs: Vec<Duration>,
    }

    impl TrainableFactory<Vec<f64>> for FakeFactory {
        fn create(
            &self,
            _task: &Task,
            _time_left: Duration,
            _limits: &ResourceLimits,
            config: &Value,
            params: &Value,
        ) -> Result<Box<dyn Trainable<Vec<f64>>>> {
            let idx = config.as_u64().unwrap_or(0) as usize;
            let seed = params
                .pointer("/random_state")
                .and_then(Value::as_i64)
                .unwrap_or(0);
            Ok(Box::new(FakeTrainable {
                clock: Arc::clone(&self.clock),
                cost: self.costs[idx % self.costs.len()],
                value: seed as f64,
            }))
        }

        fn default_config(&self) -> Value {
            json!({"random_state": 42})
        }
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn schedule(
        timeout: Duration,
        costs: Vec<Duration>,
        n_configs: usize,
        max_runs: usize,
    ) -> ScheduleOutcome<Vec<f64>> {
        let clock = Arc::new(ManualBudget::new(timeout));
        let factory = FakeFactory {
            clock: Arc::clone(&clock),
            costs,
        };
        let task = Task::new("binary");
        let limits = ResourceLimits::default();
        let configs: Vec<Value> = (0..n_configs).map(|i| json!(i)).collect();
        let seeds = SeedTree::locate(&factory.default_config(), "random_state", 42);
        let extra = Value::Null;
        let scheduler =
            RunScheduler::new(&factory, &task, &limits, &configs, &seeds, &extra, max_runs);
        scheduler
            .run(clock.as_ref(), &vec![0.0; 4], &json!({"target": "y"}))
            .unwrap()
    }

    #[test]
    fn test_mean_based_stop() {
        // 30s runs against a 100s budget: after the third run only 10s
        // remain, which is under the 30s mean.
        let outcome = schedule(secs(100), vec![secs(30)], 1, 10);
        assert_eq!(outcome.total_runs(), 3);
        assert_eq!(outcome.passes, 3);
    }

    #[test]
    fn test_first_run_always_starts() {
        let outcome = schedule(secs(1), vec![secs(500)], 1, 10);
        assert_eq!(outcome.total_runs(), 1);
        assert_eq!(outcome.groups[0].len(), 1);
    }

    #[test]
    fn test_three_configs_one_run_each() {
        let outcome = schedule(secs(100), vec![Duration::ZERO], 3, 1);
        assert_eq!(outcome.total_runs(), 3);
        assert_eq!(outcome.passes, 1);
        for group in &outcome.groups {
            assert_eq!(group.len(), 1);
        }
    }

    #[test]
    fn test_run_cap_with_huge_budget() {
        let outcome = schedule(secs(1_000_000), vec![secs(1)], 1, 5);
        assert_eq!(outcome.total_runs(), 5);
    }

    #[test]
    fn test_generations_strictly_increase_across_configs() {
        let outcome = schedule(secs(1_000_000), vec![Duration::ZERO], 3, 4);
        let mut generations: Vec<u64> = outcome
            .groups
            .iter()
            .flatten()
            .map(|r| r.generation)
            .collect();
        generations.sort_unstable();
        let expected: Vec<u64> = (0..12).collect();
        assert_eq!(generations, expected);
    }

    #[test]
    fn test_seed_offsets_follow_generation() {
        let outcome = schedule(secs(1_000_000), vec![Duration::ZERO], 1, 3);
        let seeds: Vec<Value> = outcome.groups[0].iter().map(|r| r.seeds.to_value()).collect();
        assert_eq!(
            seeds,
            vec![
                json!({"random_state": 42}),
                json!({"random_state": 43}),
                json!({"random_state": 44}),
            ]
        );
    }

    #[test]
    fn test_slow_config_stops_whole_sweep() {
        // Config 0 costs 60s of a 100s budget; after its first run only 40s
        // remain against a 60s mean, so config 1 is never attempted.
        let outcome = schedule(secs(100), vec![secs(60), secs(10)], 2, 10);
        assert_eq!(outcome.total_runs(), 1);
        assert_eq!(outcome.last_active, 0);
        assert!(outcome.groups[1].is_empty());
    }

    #[test]
    fn test_drop_last_single_pass_is_noop() {
        let mut outcome = schedule(secs(100), vec![Duration::ZERO], 3, 1);
        assert!(!outcome.drop_last());
        assert_eq!(outcome.total_runs(), 3);
    }

    #[test]
    fn test_drop_last_evicts_exactly_one() {
        let mut outcome = schedule(secs(1_000_000), vec![secs(1)], 1, 5);
        assert!(outcome.drop_last());
        assert_eq!(outcome.total_runs(), 4);
        assert_eq!(outcome.groups[0].len(), 4);
    }

    #[test]
    fn test_prune_empty_removes_unattempted_groups() {
        let mut outcome = schedule(secs(100), vec![secs(60), secs(10)], 2, 10);
        outcome.prune_empty();
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0][0].config_index, 0);
    }

    #[test]
    fn test_durations_recorded_per_run() {
        let outcome = schedule(secs(100), vec![secs(30)], 1, 10);
        for run in &outcome.groups[0] {
            assert_eq!(run.duration, secs(30));
        }
    }

    #[test]
    fn test_empty_config_list_is_error() {
        let clock = ManualBudget::new(secs(10));
        let factory = FakeFactory {
            clock: Arc::new(ManualBudget::new(secs(10))),
            costs: vec![Duration::ZERO],
        };
        let task = Task::new("binary");
        let limits = ResourceLimits::default();
        let seeds = SeedTree::default();
        let extra = Value::Null;
        let scheduler = RunScheduler::new(&factory, &task, &limits, &[], &seeds, &extra, 5);
        assert!(scheduler.run(&clock, &vec![], &Value::Null).is_err());
    }
}
