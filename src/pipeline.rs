// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The coordinator.  A run moves through five states:
//!
//! - `Idle`: nothing has happened yet.
//! - `Generating`: the deduplicated working set is being built.
//! - `Feeding`: the aggregator and every worker are already listening;
//!   the coordinator pushes every sample onto the work queue.
//! - `Draining`: the work queue is closed.  The coordinator waits for
//!   one exit report per worker, only then drops its results sender,
//!   then waits for the aggregator.
//! - `Complete`: the frames are ready.
//!
//! The order matters.  Consumers start before the first push, or a
//! bounded queue blocks the coordinator forever.  The work queue
//! closes only after the last push, or work is lost.  The results
//! queue closes only after every worker has reported, since workers
//! are still producing into it until then.

use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use log::{debug, info, warn};

use crate::aggregate::{Aggregator, FrameSet};
use crate::cancel::CancelToken;
use crate::config::ZoomConfig;
use crate::error::ZoomError;
use crate::pool::{Evaluate, WorkerExit, WorkerPool, WorkerQueues};
use crate::sample::{membership_entries, SampleGenerator, SampleMap, SamplePoint};

/// Where a run has got to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started.
    Idle,
    /// Building the working set.
    Generating,
    /// Pushing samples to the workers.
    Feeding,
    /// Waiting for workers, then the aggregator.
    Draining,
    /// Finished; the frames have been handed back.
    Complete,
}

/// Counters for one run.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RunStats {
    /// Distinct coordinates in the working set.
    pub points: usize,
    /// (point, frame) pairs in the working set.
    pub memberships: usize,
    /// Points evaluated and delivered by the workers.
    pub evaluated: usize,
    /// (point, frame) pairs in the finished frames.
    pub aggregated: usize,
    /// Wall-clock time from generation to completion.
    pub elapsed: Duration,
}

/// Runs one zoom from configuration to finished frames.
#[derive(Debug)]
pub struct Pipeline {
    config: ZoomConfig,
    state: PipelineState,
    cancel: CancelToken,
}

fn queue<T>(depth: Option<usize>) -> (Sender<T>, Receiver<T>) {
    match depth {
        Some(depth) => channel::bounded(depth),
        None => channel::unbounded(),
    }
}

impl Pipeline {
    /// A pipeline that has not started yet.
    pub fn new(config: ZoomConfig) -> Self {
        Pipeline {
            config,
            state: PipelineState::Idle,
            cancel: CancelToken::new(),
        }
    }

    /// The parameters of this run.
    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    /// Where the run has got to.  A failed run stays in the state it
    /// failed in.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// A handle that stops the run from another thread.  A worker
    /// failure cancels the same token.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn advance(&mut self, next: PipelineState) {
        debug!("pipeline {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run with the standard escape-time evaluator.
    pub fn run(&mut self) -> Result<FrameSet, ZoomError> {
        self.run_with_stats().map(|(frames, _)| frames)
    }

    /// Run with the standard escape-time evaluator, returning counters
    /// alongside the frames.
    pub fn run_with_stats(&mut self) -> Result<(FrameSet, RunStats), ZoomError> {
        let pool = WorkerPool::new(self.config.workers, self.config.max_iterations);
        self.run_with_pool(&pool)
    }

    /// Run with any worker pool.
    pub fn run_with_pool<E: Evaluate>(
        &mut self,
        pool: &WorkerPool<E>,
    ) -> Result<(FrameSet, RunStats), ZoomError> {
        let started = Instant::now();
        info!(
            "zoom: {} frames of {}x{}, {} iterations, {} workers",
            self.config.frames,
            self.config.dimension,
            self.config.dimension,
            self.config.max_iterations,
            pool.workers()
        );

        self.advance(PipelineState::Generating);
        let samples = SampleGenerator::new(&self.config).generate();
        let mut stats = RunStats {
            points: samples.len(),
            memberships: membership_entries(&samples),
            ..RunStats::default()
        };
        debug!(
            "{} distinct points carry {} frame memberships",
            stats.points, stats.memberships
        );

        self.advance(PipelineState::Feeding);
        let frames = self.coordinate(pool, samples, &mut stats)?;

        self.advance(PipelineState::Complete);
        stats.aggregated = frames.entries();
        stats.elapsed = started.elapsed();
        info!(
            "zoom complete: {} points evaluated in {:.2?}",
            stats.evaluated, stats.elapsed
        );
        Ok((frames, stats))
    }

    fn coordinate<E: Evaluate>(
        &mut self,
        pool: &WorkerPool<E>,
        samples: SampleMap,
        stats: &mut RunStats,
    ) -> Result<FrameSet, ZoomError> {
        let depth = self.config.queue_depth;
        let frame_count = self.config.frames;
        let workers = pool.workers();
        let cancel = self.cancel.clone();

        let (work_tx, work_rx) = queue::<SamplePoint>(depth);
        let (result_tx, result_rx) = queue(depth);
        let (done_tx, done_rx) = channel::unbounded::<WorkerExit>();

        let mut exits: Vec<WorkerExit> = Vec::with_capacity(workers);
        let outcome = crossbeam::scope(|scope| {
            let aggregator = {
                let cancel = cancel.clone();
                scope.spawn(move |_| Aggregator::new(frame_count).drain(&result_rx, &cancel))
            };
            pool.spawn(
                scope,
                WorkerQueues {
                    work: work_rx,
                    results: result_tx.clone(),
                    done: done_tx,
                    cancel: cancel.clone(),
                },
            );

            if !feed(&work_tx, samples, &cancel) {
                warn!("feeding stopped early: run cancelled");
            }
            drop(work_tx);
            self.advance(PipelineState::Draining);

            while exits.len() < workers {
                let next = select! {
                    recv(done_rx) -> exit => exit.ok(),
                    recv(cancel.signal()) -> _ => None,
                };
                match next {
                    Some(exit) => exits.push(exit),
                    None => break,
                }
            }
            drop(result_tx);
            aggregator.join()
        });

        // The scope has joined every worker, so any report not read
        // above is already waiting.
        exits.extend(done_rx.try_iter());
        let mut failed = None;
        for exit in &exits {
            stats.evaluated += exit.evaluated;
            if !exit.clean && failed.is_none() {
                warn!("worker {} failed; run cancelled", exit.id);
                failed = Some(exit.id);
            }
        }

        let drained = match outcome {
            Ok(Ok(drained)) => drained,
            Ok(Err(_)) => Err(ZoomError::Protocol("aggregator panicked".to_string())),
            Err(_) => Err(ZoomError::Protocol("pipeline thread panicked".to_string())),
        };
        conclude(drained, failed, stats, cancel.is_cancelled())
    }
}

/// Decide what a finished scope amounts to.  A failed worker outranks
/// everything else.  Frames the aggregator handed back count only if
/// every point was evaluated, so a late cancellation cannot spoil a
/// complete run and an early one cannot pass off a partial run.
fn conclude(
    drained: Result<FrameSet, ZoomError>,
    failed: Option<usize>,
    stats: &RunStats,
    cancelled: bool,
) -> Result<FrameSet, ZoomError> {
    if let Some(id) = failed {
        return Err(ZoomError::WorkerFailed(id));
    }
    let frames = drained?;
    if stats.evaluated < stats.points {
        if cancelled {
            return Err(ZoomError::Cancelled);
        }
        return Err(ZoomError::Protocol(format!(
            "{} of {} points evaluated",
            stats.evaluated, stats.points
        )));
    }
    Ok(frames)
}

/// Push every sample onto the work queue.  False if the run was
/// cancelled first.
fn feed(work: &Sender<SamplePoint>, samples: SampleMap, cancel: &CancelToken) -> bool {
    for (_, point) in samples {
        let sent = select! {
            send(work, point) -> sent => sent.is_ok(),
            recv(cancel.signal()) -> _ => false,
        };
        if !sent {
            return false;
        }
    }
    true
}

/// Generate, evaluate and aggregate a whole zoom with the standard
/// evaluator.
pub fn zoom(config: &ZoomConfig) -> Result<FrameSet, ZoomError> {
    Pipeline::new(*config).run()
}
