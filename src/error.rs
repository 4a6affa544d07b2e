// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Things that can stop a run.  None of them are retried: evaluation
//! is pure and always terminates, so anything that goes wrong is
//! either the filesystem or a defect.

use std::io;

use failure::Fail;

/// Why a zoom run failed.
#[derive(Debug, Fail)]
pub enum ZoomError {
    /// Writing a frame's records failed.  The run is abandoned.
    #[fail(display = "could not write frame {}: {}", frame, cause)]
    Output {
        /// The 1-based index of the frame being written.
        frame: u32,
        /// What the filesystem said.
        #[cause]
        cause: io::Error,
    },

    /// A worker unwound instead of draining the work queue.
    #[fail(display = "worker {} failed; run abandoned", _0)]
    WorkerFailed(usize),

    /// The run was cancelled before every point was aggregated.
    #[fail(display = "run cancelled")]
    Cancelled,

    /// A pipeline thread other than a worker panicked.
    #[fail(display = "pipeline protocol failure: {}", _0)]
    Protocol(String),
}

impl ZoomError {
    /// Attach a frame index to an I/O failure.
    pub fn output(frame: u32, cause: io::Error) -> Self {
        ZoomError::Output { frame, cause }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_error_names_the_frame() {
        let err = ZoomError::output(3, io::Error::new(io::ErrorKind::Other, "disk full"));
        assert_eq!(err.to_string(), "could not write frame 3: disk full");
        assert!(err.cause().is_some());
    }

    #[test]
    fn worker_failure_message() {
        assert_eq!(
            ZoomError::WorkerFailed(2).to_string(),
            "worker 2 failed; run abandoned"
        );
    }
}
