//! TimeBlend Runtime — budget timer, multistart scheduler, blend strategies,
//! and the time-utilization orchestrator.

pub mod blend;
pub mod budget;
pub mod orchestrator;
pub mod scheduler;
pub mod types;

pub use blend::{BestSelector, MeanBlender};
pub use budget::{ManualBudget, WallClockBudget};
pub use orchestrator::{TimeUtilization, UtilizationBuilder};
pub use scheduler::{Run, RunScheduler, ScheduleOutcome};
pub use types::UtilizationReport;
