// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The data-parallel worker pool
//!
//! Grayscale conversion, edge detection, and seam removal and
//! insertion all split their field into disjoint parts and hand one
//! part to each worker.  Nothing is shared and nothing blocks, so the
//! same pool serves every one of the thousands of seam operations a
//! resize performs instead of spawning fresh threads each time.
//!
//! The energy map is the exception: its two halves block on each
//! other, so they get a pool of their own holding exactly two
//! threads, and only one energy map at a time may use it.  See
//! `energy.rs`.

use crate::error::{CarveError, Result};
use rayon::prelude::*;
use rayon::{Scope, ThreadPool, ThreadPoolBuilder};
use std::sync::Mutex;

/// Number of row strips the seam transforms are split into.
pub const STRIPS: usize = 4;

/// Threads in the energy map pipeline: one per half.
pub const PIPELINE: usize = 2;

#[derive(Debug)]
pub struct Workers {
    pool: ThreadPool,
    pipeline: ThreadPool,
    pipeline_busy: Mutex<()>,
}

fn build_pool(threads: usize, name: &'static str) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("{}-{}", name, i))
        .build()
        .map_err(|e| CarveError::ThreadSpawn {
            reason: e.to_string(),
        })
}

impl Workers {
    pub fn new(threads: usize) -> Result<Self> {
        Ok(Workers {
            pool: build_pool(threads.max(1), "seamresize")?,
            pipeline: build_pool(PIPELINE, "seamresize-energy")?,
            pipeline_busy: Mutex::new(()),
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `work` once for every part, in parallel, and wait for all
    /// of them.
    pub fn run<T, F>(&self, parts: Vec<T>, work: F)
    where
        T: Send,
        F: Fn(T) + Send + Sync,
    {
        self.pool
            .install(|| parts.into_par_iter().for_each(work));
    }

    /// As `run`, while `side` computes something else on the pool at
    /// the same time.  Returns what `side` returned once everything
    /// has finished.
    pub fn run_alongside<T, F, S, R>(&self, parts: Vec<T>, work: F, side: S) -> R
    where
        T: Send,
        F: Fn(T) + Send + Sync,
        S: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool
            .install(|| rayon::join(|| parts.into_par_iter().for_each(work), side).1)
    }

    /// Run `op` on the calling thread with a scope whose spawned jobs
    /// go to the two pipeline threads.  Jobs spawned there may block
    /// on each other, but never on `op`'s thread being free, so at
    /// most `PIPELINE` of them may be spawned.  Concurrent callers
    /// take turns.
    pub fn pipeline<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&Scope<'scope>) -> R,
    {
        // A poisoned lock only means an earlier map panicked; the
        // pool itself is fine.
        let _turn = self
            .pipeline_busy
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.pipeline.in_place_scope(op)
    }
}

/// Partition per-row items into four strips of rows: `[0, h/4]`,
/// `[h/4+1, 2(h/4)]`, `[2(h/4)+1, 3(h/4)]` and `[3(h/4)+1, h-1]`.
/// Short images leave some strips empty.
pub fn strips<T>(items: Vec<T>) -> Vec<Vec<T>> {
    let height = items.len();
    let quarter = height / STRIPS;
    let ends = [quarter + 1, 2 * quarter + 1, 3 * quarter + 1, height];
    let mut items = items.into_iter();
    let mut start = 0;
    ends.iter()
        .map(|&end| {
            let end = end.min(height).max(start);
            let strip: Vec<T> = items.by_ref().take(end - start).collect();
            start = end;
            strip
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn lengths(height: usize) -> Vec<usize> {
        strips((0..height).collect::<Vec<_>>())
            .iter()
            .map(Vec::len)
            .collect()
    }

    #[test]
    fn strips_follow_quarter_boundaries() {
        assert_eq!(lengths(10), vec![3, 2, 2, 3]);
        assert_eq!(lengths(8), vec![3, 2, 2, 1]);
        assert_eq!(lengths(2), vec![1, 0, 0, 1]);
        assert_eq!(lengths(1), vec![1, 0, 0, 0]);
        assert_eq!(lengths(0), vec![0, 0, 0, 0]);
    }

    #[test]
    fn strips_keep_row_order() {
        let flat: Vec<usize> = strips((0..13).collect()).into_iter().flatten().collect();
        assert_eq!(flat, (0..13).collect::<Vec<_>>());
    }

    #[test]
    fn every_part_runs_once() {
        let workers = Workers::new(3).unwrap();
        let seen = AtomicUsize::new(0);
        let side = workers.run_alongside(
            vec![1, 2, 3, 4],
            |n| {
                seen.fetch_add(n, Ordering::SeqCst);
            },
            || 42,
        );
        assert_eq!(side, 42);
        assert_eq!(seen.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn pipeline_jobs_run_side_by_side() {
        // Each job waits for the other one's message, which only works
        // if both are running at once.
        let workers = Workers::new(1).unwrap();
        let (to_b, from_a) = crossbeam::channel::bounded(0);
        let (to_a, from_b) = crossbeam::channel::bounded(0);
        for _ in 0..50 {
            let (to_b, from_b, to_a, from_a) = (&to_b, &from_b, &to_a, &from_a);
            workers.pipeline(|scope| {
                scope.spawn(move |_| {
                    to_b.send(1).unwrap();
                    assert_eq!(from_b.recv().unwrap(), 2);
                });
                scope.spawn(move |_| {
                    assert_eq!(from_a.recv().unwrap(), 1);
                    to_a.send(2).unwrap();
                });
            });
        }
    }

    #[test]
    fn a_pool_has_at_least_one_thread() {
        assert_eq!(Workers::new(0).unwrap().threads(), 1);
    }
}
