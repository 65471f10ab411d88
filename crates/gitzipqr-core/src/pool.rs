//! Fixed-size worker pool over a bounded job queue.
//!
//! Jobs are pure functions of their inputs; results flow back to the
//! control thread over a channel and are tallied there. No shared
//! counters, no ordering contract: callers reconstruct order from data
//! carried inside each result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, unbounded};

/// Cooperative cancellation flag shared with the front-end.
pub type CancelFlag = Arc<AtomicBool>;

pub fn cancel_flag() -> CancelFlag {
    Arc::new(AtomicBool::new(false))
}

pub fn is_cancelled(flag: &CancelFlag) -> bool {
    flag.load(Ordering::Relaxed)
}

/// Run `jobs` across `workers` threads, invoking `on_result` on the
/// control thread as each result arrives (in completion order).
///
/// The job source is consumed lazily by a feeder thread, so a streaming
/// producer keeps at most `2 × workers` jobs queued. Workers finish
/// their current job on cancellation; queued jobs are dropped. The
/// number of results delivered is returned.
pub fn run_jobs<I, J, R, F>(
    workers: usize,
    jobs: I,
    cancel: &CancelFlag,
    job_fn: F,
    mut on_result: impl FnMut(R),
) -> usize
where
    I: IntoIterator<Item = J>,
    I::IntoIter: Send,
    J: Send,
    R: Send,
    F: Fn(J) -> R + Sync,
{
    let workers = workers.max(1);
    let jobs = jobs.into_iter();
    let (job_tx, job_rx) = bounded::<J>(workers * 2);
    let (result_tx, result_rx) = unbounded::<R>();
    let job_fn = &job_fn;

    let mut completed = 0usize;
    std::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let cancel = Arc::clone(cancel);
            scope.spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    // Receiver only disconnects when the control thread
                    // stops draining, at which point the result is moot.
                    let _ = result_tx.send(job_fn(job));
                }
            });
        }
        drop(job_rx);
        drop(result_tx);

        let cancel_feeder = Arc::clone(cancel);
        scope.spawn(move || {
            for job in jobs {
                if cancel_feeder.load(Ordering::Relaxed) {
                    break;
                }
                if job_tx.send(job).is_err() {
                    break;
                }
            }
        });

        for result in result_rx.iter() {
            completed += 1;
            on_result(result);
        }
    });
    completed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_jobs_complete() {
        let jobs: Vec<u64> = (0..200).collect();
        let cancel = cancel_flag();
        let mut sum = 0u64;
        let n = run_jobs(4, jobs, &cancel, |j| j * 2, |r| sum += r);
        assert_eq!(n, 200);
        assert_eq!(sum, (0..200u64).map(|j| j * 2).sum::<u64>());
    }

    #[test]
    fn results_carry_their_own_identity() {
        let jobs: Vec<usize> = (0..50).collect();
        let cancel = cancel_flag();
        let mut seen = vec![false; 50];
        run_jobs(8, jobs, &cancel, |j| j, |r| seen[r] = true);
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn single_worker_floor() {
        let cancel = cancel_flag();
        let mut out = Vec::new();
        let n = run_jobs(0, vec![1, 2, 3], &cancel, |j| j, |r| out.push(r));
        assert_eq!(n, 3);
        out.sort();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn cancellation_stops_queued_jobs() {
        let cancel = cancel_flag();
        let cancel_inside = Arc::clone(&cancel);
        let jobs: Vec<u32> = (0..10_000).collect();
        let n = run_jobs(
            2,
            jobs,
            &cancel,
            move |j| {
                if j == 0 {
                    cancel_inside.store(true, Ordering::Relaxed);
                }
                j
            },
            |_| {},
        );
        assert!(n < 10_000, "cancellation should drop queued jobs");
    }
}
