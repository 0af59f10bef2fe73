//! Time-based progress model for simulated jobs.

use chrono::Duration;

/// Where a simulated job stands at a given elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedProgress {
    /// Still running with the given percentage
    Running(u8),
    /// Nominal duration reached
    Finished,
}

/// Map elapsed time to progress.
///
/// `progress = min(cap, floor(100 * elapsed / nominal))` until
/// `elapsed >= nominal`, at which point the job is finished. The cap keeps
/// 100 reserved for the completed state.
pub fn simulated_progress(elapsed: Duration, nominal: Duration, cap: u8) -> SimulatedProgress {
    let nominal_ms = nominal.num_milliseconds().max(1);
    let elapsed_ms = elapsed.num_milliseconds().max(0);

    if elapsed_ms >= nominal_ms {
        return SimulatedProgress::Finished;
    }

    let percent = (elapsed_ms.saturating_mul(100) / nominal_ms).min(i64::from(cap));
    SimulatedProgress::Running(percent as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: i64 = 30;

    fn at(secs_ms: i64) -> SimulatedProgress {
        simulated_progress(Duration::milliseconds(secs_ms), Duration::seconds(D), 95)
    }

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(at(0), SimulatedProgress::Running(0));
        assert_eq!(at(299), SimulatedProgress::Running(0));
        assert_eq!(at(300), SimulatedProgress::Running(1));
    }

    #[test]
    fn test_floor_of_fraction() {
        assert_eq!(at(15_000), SimulatedProgress::Running(50));
        assert_eq!(at(10_000), SimulatedProgress::Running(33));
    }

    #[test]
    fn test_capped_below_completion() {
        assert_eq!(at(28_500), SimulatedProgress::Running(95));
        assert_eq!(at(29_999), SimulatedProgress::Running(95));
    }

    #[test]
    fn test_finishes_at_nominal_duration() {
        assert_eq!(at(30_000), SimulatedProgress::Finished);
        assert_eq!(at(90_000), SimulatedProgress::Finished);
    }

    #[test]
    fn test_negative_elapsed_is_zero() {
        assert_eq!(at(-5_000), SimulatedProgress::Running(0));
    }

    #[test]
    fn test_zero_duration_finishes_once_any_time_elapses() {
        assert_eq!(
            simulated_progress(Duration::zero(), Duration::zero(), 95),
            SimulatedProgress::Running(0)
        );
        assert_eq!(
            simulated_progress(Duration::milliseconds(1), Duration::zero(), 95),
            SimulatedProgress::Finished
        );
    }
}
