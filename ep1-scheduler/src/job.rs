use std::sync::{Condvar, Mutex};

/// A single trace entry, parsed but not yet admitted into the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub t0: i64,
    pub dt: i64,
    pub deadline: i64,
}

/// A job's static parameters, remaining execution time, and the
/// synchronization primitives its worker thread waits on.
///
/// `paused` starts `true`: a job is created already paused and only makes
/// progress once the scheduler resumes it for the first time, mirroring
/// the source's `job->is_paused = 1` at parse time.
pub struct Job {
    pub name: String,
    pub t0: i64,
    pub dt: i64,
    pub deadline: i64,
    remaining: Mutex<i64>,
    paused: Mutex<bool>,
    cond: Condvar,
    tf: Mutex<Option<i64>>,
}

impl Job {
    pub fn new(spec: JobSpec) -> Self {
        Job {
            name: spec.name,
            t0: spec.t0,
            dt: spec.dt,
            deadline: spec.deadline,
            remaining: Mutex::new(spec.dt),
            paused: Mutex::new(true),
            cond: Condvar::new(),
            tf: Mutex::new(None),
        }
    }

    pub fn remaining(&self) -> i64 {
        *self.remaining.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Decrements remaining time by one tick and returns the new value.
    pub fn decrement(&self) -> i64 {
        let mut remaining = self.remaining.lock().unwrap_or_else(|e| e.into_inner());
        if *remaining > 0 {
            *remaining -= 1;
        }
        *remaining
    }

    pub fn pause(&self) {
        let mut paused = self.paused.lock().unwrap_or_else(|e| e.into_inner());
        *paused = true;
    }

    pub fn resume(&self) {
        let mut paused = self.paused.lock().unwrap_or_else(|e| e.into_inner());
        *paused = false;
        self.cond.notify_one();
    }

    /// Blocks the calling (worker) thread while `paused` is true, re-checking
    /// after every wake to tolerate spurious wakeups.
    pub fn wait_while_paused(&self) {
        let guard = self.paused.lock().unwrap_or_else(|e| e.into_inner());
        let _guard = self
            .cond
            .wait_while(guard, |paused| *paused)
            .unwrap_or_else(|e| e.into_inner());
    }

    pub fn set_tf(&self, tf: i64) {
        let mut slot = self.tf.lock().unwrap_or_else(|e| e.into_inner());
        debug_assert!(slot.is_none(), "tf must be set exactly once");
        *slot = Some(tf);
    }

    pub fn tf(&self) -> Option<i64> {
        *self.tf.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("t0", &self.t0)
            .field("dt", &self.dt)
            .field("remaining", &self.remaining())
            .finish()
    }
}
