use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::clock::Clock;
use crate::job::Job;
use crate::ready_list::ReadyList;

/// A job that has reached `remaining == 0`.
#[derive(Debug, Clone)]
pub struct CompletedJob {
    pub name: String,
    pub t0: i64,
    pub tf: i64,
}

impl CompletedJob {
    pub fn turnaround(&self) -> i64 {
        self.tf - self.t0
    }
}

/// State shared between the controller thread and every worker thread: the
/// ready/done lists behind one lock. The simulated clock lives separately
/// (see `Clock`) since every thread reads it independently.
pub struct SharedState {
    inner: Mutex<Inner>,
    pub tick: Duration,
}

struct Inner {
    ready: ReadyList,
    done: Vec<CompletedJob>,
}

impl SharedState {
    pub fn new(tick: Duration) -> Arc<Self> {
        Arc::new(SharedState {
            inner: Mutex::new(Inner { ready: ReadyList::new(), done: Vec::new() }),
            tick,
        })
    }

    pub fn with_ready<T>(&self, f: impl FnOnce(&mut ReadyList) -> T) -> T {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut inner.ready)
    }

    pub fn ready_len(&self) -> usize {
        self.with_ready(|ready| ready.len())
    }

    pub fn ready_is_empty(&self) -> bool {
        self.with_ready(|ready| ready.is_empty())
    }

    /// Called by a worker thread when its job's remaining time reaches zero:
    /// removes it from the ready list and appends it to the done list,
    /// atomically with respect to the controller's own ready-list access.
    fn finish(&self, job: &Arc<Job>, tf: i64) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.ready.remove(job);
        inner.done.push(CompletedJob { name: job.name.clone(), t0: job.t0, tf });
    }

    pub fn done(&self) -> Vec<CompletedJob> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.done.clone()
    }
}

/// Spawns the thread that owns `job`'s execution timeline. The worker waits
/// while paused, then advances one tick at a time until remaining time hits
/// zero, at which point it stamps `tf` from the shared clock and reports to
/// the shared done list. It never decides what to run next — only the
/// controller calls `resume`.
///
/// A job admitted with `dt == 0` never enters the wait/sleep loop at all: it
/// reports done immediately, with `tf` equal to whatever instant the clock
/// reads at that moment (its admission instant, since admission and spawn
/// happen back to back).
pub fn spawn_worker(job: Arc<Job>, state: Arc<SharedState>, clock: Arc<Clock>) -> JoinHandle<()> {
    thread::spawn(move || {
        while job.remaining() > 0 {
            job.wait_while_paused();
            thread::sleep(state.tick);
            job.decrement();
        }
        let tf = clock.now();
        job.set_tf(tf);
        state.finish(&job, tf);
    })
}
