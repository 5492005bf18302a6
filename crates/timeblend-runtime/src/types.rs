//! Runtime types.

use serde::Serialize;

/// Summary of one `fit_predict` schedule-and-blend cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UtilizationReport {
    /// Runs recorded before drop-last.
    #[serde(rename = "totalRuns")]
    pub total_runs: usize,
    /// Multistart passes started over the configuration list.
    pub passes: u32,
    /// Whether the drop-last policy evicted a run.
    #[serde(rename = "droppedLast")]
    pub dropped_last: bool,
    /// Configurations that survived into the outer blend.
    #[serde(rename = "survivingConfigs")]
    pub surviving_configs: usize,
    /// Wall-clock time spent in `fit_predict`.
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}
