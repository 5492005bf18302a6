//! Budget timers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use timeblend_core::BudgetTimer;

/// Wall-clock budget backed by a monotonic instant.
#[derive(Debug, Clone)]
pub struct WallClockBudget {
    timeout: Duration,
    started: Instant,
}

impl WallClockBudget {
    /// Start the budget now.
    pub fn start(timeout: Duration) -> Self {
        Self {
            timeout,
            started: Instant::now(),
        }
    }
}

impl BudgetTimer for WallClockBudget {
    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Manually advanced budget for deterministic tests and simulations.
///
/// Time passes only through [`ManualBudget::advance`], so duration-sensitive
/// scheduling decisions can be replayed exactly.
#[derive(Debug, Default)]
pub struct ManualBudget {
    timeout: Duration,
    elapsed_nanos: AtomicU64,
}

impl ManualBudget {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            elapsed_nanos: AtomicU64::new(0),
        }
    }

    /// Advance the clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.elapsed_nanos
            .fetch_add(delta.as_nanos() as u64, Ordering::Relaxed);
    }
}

impl BudgetTimer for ManualBudget {
    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_clock_remaining() {
        let budget = WallClockBudget::start(Duration::from_secs(3600));
        assert_eq!(budget.timeout(), Duration::from_secs(3600));
        assert!(budget.remaining() <= Duration::from_secs(3600));
    }

    #[test]
    fn test_manual_advance() {
        let budget = ManualBudget::new(Duration::from_secs(100));
        assert_eq!(budget.remaining(), Duration::from_secs(100));
        budget.advance(Duration::from_secs(30));
        assert_eq!(budget.elapsed(), Duration::from_secs(30));
        assert_eq!(budget.remaining(), Duration::from_secs(70));
    }

    #[test]
    fn test_manual_remaining_saturates() {
        let budget = ManualBudget::new(Duration::from_secs(10));
        budget.advance(Duration::from_secs(25));
        assert_eq!(budget.remaining(), Duration::ZERO);
    }
}
