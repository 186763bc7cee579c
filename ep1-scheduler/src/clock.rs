use std::time::{Duration, Instant};

/// The simulation clock: a monotonic wall-clock anchor from which the
/// current simulated instant is derived. Every thread — the controller and
/// every worker — computes the same value independently from elapsed real
/// time, so no explicit synchronization of "the current tick" is needed.
pub struct Clock {
    started_at: Instant,
    tick: Duration,
}

impl Clock {
    pub fn start(tick: Duration) -> Self {
        Clock { started_at: Instant::now(), tick }
    }

    /// The current simulated instant: `(now - started_at) / tick`, floored.
    pub fn now(&self) -> i64 {
        let elapsed = self.started_at.elapsed();
        (elapsed.as_nanos() / self.tick.as_nanos().max(1)) as i64
    }
}
