use std::io::BufRead;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use simcore_config::SchedulerSection;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::job::Job;
use crate::trace::{AdmitMode, TraceReader};
use crate::worker::{spawn_worker, CompletedJob, SharedState};

/// Which of the three scheduling disciplines to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Fcfs,
    Srtn,
    RoundRobin,
}

impl Policy {
    pub fn parse(token: &str) -> Result<Policy> {
        match token {
            "1" => Ok(Policy::Fcfs),
            "2" => Ok(Policy::Srtn),
            "3" => Ok(Policy::RoundRobin),
            other => Err(Error::UnknownPolicy(other.to_string())),
        }
    }
}

/// The outcome of a full simulation run: every job in completion order, and
/// the number of preemptions observed (always 0 for FCFS).
pub struct RunReport {
    pub completed: Vec<CompletedJob>,
    pub preemptions: usize,
}

pub fn run<R: BufRead>(
    policy: Policy,
    trace: TraceReader<R>,
    cfg: &SchedulerSection,
) -> Result<RunReport> {
    match policy {
        Policy::Fcfs => run_fcfs(trace, cfg),
        Policy::Srtn => run_srtn(trace, cfg),
        Policy::RoundRobin => run_round_robin(trace, cfg),
    }
}

fn tick_duration(cfg: &SchedulerSection) -> Duration {
    Duration::from_millis(cfg.tick_millis)
}

/// True only when both sides are jobs and they differ by identity. A
/// transition to or from "nothing selected" is never itself a preemption.
fn identity_changed(prev: &Option<Arc<Job>>, curr: &Option<Arc<Job>>) -> bool {
    match (prev, curr) {
        (Some(p), Some(c)) => !Arc::ptr_eq(p, c),
        _ => false,
    }
}

fn admit_job<R: BufRead>(
    trace: &mut TraceReader<R>,
    tau: i64,
    mode: AdmitMode,
    state: &Arc<SharedState>,
    clock: &Arc<Clock>,
    cfg: &SchedulerSection,
    handles: &mut Vec<JoinHandle<()>>,
) -> Result<Vec<Arc<Job>>> {
    let specs = trace.admit_at(tau, mode)?;
    let mut admitted = Vec::with_capacity(specs.len());
    for spec in specs {
        if state.ready_len() >= cfg.max_jobs {
            return Err(Error::TooManyJobs { limit: cfg.max_jobs });
        }
        let job = Arc::new(Job::new(spec));
        handles.push(spawn_worker(job.clone(), state.clone(), clock.clone()));
        admitted.push(job);
    }
    Ok(admitted)
}

fn join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.join();
    }
}

/// First-come, first-served: the running job is never paused and selection
/// only changes once it finishes on its own. Admission looks back as far as
/// `tau` to absorb any job whose arrival was missed while a prior job ran.
fn run_fcfs<R: BufRead>(mut trace: TraceReader<R>, cfg: &SchedulerSection) -> Result<RunReport> {
    let clock = Arc::new(Clock::start(tick_duration(cfg)));
    let state = SharedState::new(tick_duration(cfg));
    let mut handles = Vec::new();
    let mut current: Option<Arc<Job>> = None;

    loop {
        let tau = clock.now();
        let arrivals = admit_job(&mut trace, tau, AdmitMode::NowOrBefore, &state, &clock, cfg, &mut handles)?;
        state.with_ready(|ready| {
            for job in arrivals {
                ready.push_back(job);
            }
        });

        let head = state.with_ready(|ready| ready.head());
        let head_changed = match (&current, &head) {
            (Some(c), Some(h)) => !Arc::ptr_eq(c, h),
            (None, Some(_)) => true,
            _ => false,
        };
        if head_changed {
            if let Some(job) = &head {
                job.resume();
            }
        }
        current = head;

        if trace.is_exhausted() && state.ready_is_empty() {
            break;
        }
        thread::sleep(state.tick);
    }

    join_all(handles);
    Ok(RunReport { completed: state.done(), preemptions: 0 })
}

/// Shortest remaining time next: re-sorts the ready list every tick and
/// always runs the job with the least remaining time, preempting freely.
fn run_srtn<R: BufRead>(mut trace: TraceReader<R>, cfg: &SchedulerSection) -> Result<RunReport> {
    let clock = Arc::new(Clock::start(tick_duration(cfg)));
    let state = SharedState::new(tick_duration(cfg));
    let mut handles = Vec::new();
    let mut current: Option<Arc<Job>> = None;
    let mut preemptions = 0usize;

    loop {
        let tau = clock.now();
        if let Some(job) = &current {
            job.pause();
        }

        let arrivals = admit_job(&mut trace, tau, AdmitMode::Now, &state, &clock, cfg, &mut handles)?;
        state.with_ready(|ready| {
            for job in arrivals {
                ready.insert_sorted_by_remaining(job);
            }
            ready.resort_by_remaining();
        });

        let selected = state.with_ready(|ready| ready.head());
        if identity_changed(&current, &selected) {
            preemptions += 1;
        }
        if let Some(job) = &selected {
            job.resume();
        }
        current = selected;

        if trace.is_exhausted() && state.ready_is_empty() {
            break;
        }
        thread::sleep(state.tick);
    }

    join_all(handles);
    Ok(RunReport { completed: state.done(), preemptions })
}

/// Round-robin: the running job is paused and, unless it finished on its
/// own this tick, requeued to the tail behind any new arrivals before the
/// next head is popped and resumed.
fn run_round_robin<R: BufRead>(mut trace: TraceReader<R>, cfg: &SchedulerSection) -> Result<RunReport> {
    let clock = Arc::new(Clock::start(tick_duration(cfg)));
    let state = SharedState::new(tick_duration(cfg));
    let mut handles = Vec::new();
    let mut current: Option<Arc<Job>> = None;
    let mut preemptions = 0usize;

    loop {
        let tau = clock.now();
        if let Some(job) = &current {
            job.pause();
        }
        let prev = current.take();

        let arrivals = admit_job(&mut trace, tau, AdmitMode::Now, &state, &clock, cfg, &mut handles)?;

        let selected = state.with_ready(|ready| {
            // `prev` was already popped out of the list when it was last
            // selected. Requeue it to the tail unless it finished on its own
            // during the tick just run.
            if let Some(prev_job) = &prev {
                if prev_job.tf().is_none() {
                    ready.push_back(prev_job.clone());
                }
            }
            for job in arrivals {
                ready.push_back(job);
            }
            ready.pop_front()
        });

        if identity_changed(&prev, &selected) {
            preemptions += 1;
        }
        if let Some(job) = &selected {
            job.resume();
        }
        current = selected;

        if trace.is_exhausted() && state.ready_is_empty() {
            break;
        }
        thread::sleep(state.tick);
    }

    join_all(handles);
    Ok(RunReport { completed: state.done(), preemptions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn cfg(tick_millis: u64) -> SchedulerSection {
        SchedulerSection { tick_millis, max_jobs: 1000 }
    }

    fn reader(text: &str) -> TraceReader<Cursor<Vec<u8>>> {
        TraceReader::new(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn fcfs_runs_jobs_in_arrival_order_with_no_preemptions() {
        let trace = reader("A 0 1 5\nB 0 1 5\n");
        let report = run(Policy::Fcfs, trace, &cfg(10)).unwrap();
        assert_eq!(report.preemptions, 0);
        assert_eq!(report.completed.len(), 2);
        let names: Vec<_> = report.completed.iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn srtn_preempts_for_a_shorter_arrival() {
        let trace = reader("A 0 5 10\nB 2 2 10\n");
        let report = run(Policy::Srtn, trace, &cfg(10)).unwrap();
        assert_eq!(report.completed.len(), 2);
        assert!(report.preemptions >= 2);
    }

    #[test]
    fn zero_length_job_completes_at_its_own_arrival() {
        let trace = reader("A 0 0 5\n");
        let report = run(Policy::Fcfs, trace, &cfg(10)).unwrap();
        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.completed[0].tf, 0);
    }

    #[test]
    fn unknown_policy_token_is_rejected() {
        assert!(matches!(Policy::parse("7"), Err(Error::UnknownPolicy(_))));
    }

    #[test]
    fn round_robin_time_slices_two_equal_jobs() {
        let trace = reader("A 0 4 10\nB 0 4 10\n");
        let report = run(Policy::RoundRobin, trace, &cfg(30)).unwrap();
        assert_eq!(report.completed.len(), 2);
        let a = report.completed.iter().find(|c| c.name == "A").unwrap();
        let b = report.completed.iter().find(|c| c.name == "B").unwrap();
        assert_eq!(a.tf, 7);
        assert_eq!(b.tf, 8);
        assert_eq!(report.preemptions, 7);
    }
}
