#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot zoom generator
//!
//! A zoom animation is a sequence of frames, each sampling a square
//! grid of the complex plane around a shared centre, with each frame's
//! grid a little tighter than the last.  For each sample we compute
//! the classic escape-time function: how many times `z = z² + c` can be
//! iterated before `z` leaves the circle of radius 2, if it ever does.
//!
//! Neighbouring frames overlap, and whenever two frames' grids land on
//! exactly the same coordinate there is no reason to iterate it twice.
//! So the run starts by gathering every frame's grid into a single
//! deduplicated working set, each point remembering which frames
//! want it.  A pool of worker threads evaluates that set in parallel,
//! and a single aggregator thread files each result under every frame
//! that claimed it.  The finished frames go to an output sink as plain
//! `re, im, iterations` records; turning those into pictures is
//! somebody else's job.

extern crate crossbeam;
extern crate failure;
extern crate itertools;
extern crate log;
extern crate num;
extern crate num_cpus;

pub mod aggregate;
pub mod cancel;
pub mod config;
pub mod error;
pub mod escape;
pub mod output;
pub mod pipeline;
pub mod pool;
pub mod sample;
pub mod window;

pub use aggregate::{Aggregator, Frame, FrameSet};
pub use cancel::CancelToken;
pub use config::ZoomConfig;
pub use error::ZoomError;
pub use escape::{evaluate, Escape};
pub use output::{write_frames, DirectorySink, OutputSink};
pub use pipeline::{zoom, Pipeline, PipelineState, RunStats};
pub use pool::{Evaluate, WorkerPool};
pub use sample::{Coordinate, EvaluationResult, SampleGenerator, SamplePoint};
pub use window::FrameWindow;
