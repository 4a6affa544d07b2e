// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The WorkerPool.  A fixed number of threads each pull one sample at
//! a time off a shared work queue, evaluate it, and push the result
//! onto a shared results queue.  Nobody decides which thread gets
//! which point; whichever worker is idle takes the next one, so each
//! point is evaluated by exactly one worker.
//!
//! Each worker reports its exit on a completion queue exactly once,
//! from a drop guard, so the coordinator hears about a worker that
//! panicked as well as one that ran out of work.  A panicking worker
//! also cancels the run, which wakes everyone else.

use std::thread;

use crossbeam::channel::{Receiver, Sender};
use crossbeam::select;
use crossbeam::thread::Scope;
use log::debug;
use num::Complex;

use crate::cancel::CancelToken;
use crate::escape::{evaluate_from_origin, Escape};
use crate::sample::{EvaluationResult, SamplePoint};

/// Anything that can classify a point.  Implemented for the standard
/// escape-time function and for plain closures.
pub trait Evaluate: Sync {
    /// Classify one point.
    fn evaluate(&self, c: Complex<f64>) -> Escape;
}

impl<F> Evaluate for F
where
    F: Fn(Complex<f64>) -> Escape + Sync,
{
    fn evaluate(&self, c: Complex<f64>) -> Escape {
        self(c)
    }
}

/// The escape-time function with a zero seed and a fixed budget.
#[derive(Copy, Clone, Debug)]
pub struct EscapeTime {
    /// The iteration budget.
    pub max_iterations: u32,
}

impl Evaluate for EscapeTime {
    fn evaluate(&self, c: Complex<f64>) -> Escape {
        evaluate_from_origin(c, self.max_iterations)
    }
}

/// How a worker left.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WorkerExit {
    /// Which worker.
    pub id: usize,
    /// How many points it evaluated and delivered.
    pub evaluated: usize,
    /// False if the worker unwound from a panic.
    pub clean: bool,
}

/// The queues a worker is attached to.
pub struct WorkerQueues {
    /// Samples to evaluate.  Workers stop once this is closed and empty.
    pub work: Receiver<SamplePoint>,
    /// Where results go.
    pub results: Sender<EvaluationResult>,
    /// Where each worker announces its exit.
    pub done: Sender<WorkerExit>,
    /// Observed at every blocking point.
    pub cancel: CancelToken,
}

struct CompletionGuard {
    id: usize,
    evaluated: usize,
    done: Sender<WorkerExit>,
    cancel: CancelToken,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let exit = WorkerExit {
            id: self.id,
            evaluated: self.evaluated,
            clean: !thread::panicking(),
        };
        if !exit.clean {
            self.cancel.cancel();
        }
        debug!("worker {} exiting: {:?}", self.id, exit);
        // The coordinator only stops listening once every worker has
        // reported, so a failed send has nobody to tell.
        let _ = self.done.send(exit);
    }
}

/// A fixed-size set of evaluation threads.
pub struct WorkerPool<E> {
    workers: usize,
    evaluator: E,
}

impl WorkerPool<EscapeTime> {
    /// A pool of `workers` threads running the escape-time function
    /// with the given budget.  At least one worker is always started.
    pub fn new(workers: usize, max_iterations: u32) -> Self {
        WorkerPool::with_evaluator(workers, EscapeTime { max_iterations })
    }
}

impl<E: Evaluate> WorkerPool<E> {
    /// A pool of `workers` threads running an arbitrary evaluator.
    pub fn with_evaluator(workers: usize, evaluator: E) -> Self {
        WorkerPool {
            workers: workers.max(1),
            evaluator,
        }
    }

    /// The number of threads `spawn` starts.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Start every worker inside `scope`.  Each worker gets its own
    /// handle on every queue; the handles passed in are dropped on
    /// return, so the caller's remaining senders decide when the
    /// results queue closes.
    pub fn spawn<'env>(&'env self, scope: &Scope<'env>, queues: WorkerQueues) {
        for id in 0..self.workers {
            let work = queues.work.clone();
            let results = queues.results.clone();
            let cancel = queues.cancel.clone();
            let done = queues.done.clone();
            scope.spawn(move |_| {
                let mut guard = CompletionGuard {
                    id,
                    evaluated: 0,
                    done,
                    cancel: cancel.clone(),
                };
                self.work(&work, &results, &cancel, &mut guard);
            });
        }
    }

    fn work(
        &self,
        work: &Receiver<SamplePoint>,
        results: &Sender<EvaluationResult>,
        cancel: &CancelToken,
        guard: &mut CompletionGuard,
    ) {
        while !cancel.is_cancelled() {
            let next = select! {
                recv(work) -> point => point.ok(),
                recv(cancel.signal()) -> _ => None,
            };
            // None: the queue is closed and empty, or the run is over.
            let point = match next {
                Some(point) => point,
                None => return,
            };
            let escape = self.evaluator.evaluate(point.coordinate.to_complex());
            if !deliver(results, point.evaluated(escape), cancel) {
                return;
            }
            guard.evaluated += 1;
        }
    }
}

/// Push one result, giving up if the run is cancelled while the
/// queue is full or the aggregator has gone away.
fn deliver(
    results: &Sender<EvaluationResult>,
    result: EvaluationResult,
    cancel: &CancelToken,
) -> bool {
    select! {
        send(results, result) -> sent => sent.is_ok(),
        recv(cancel.signal()) -> _ => false,
    }
}
