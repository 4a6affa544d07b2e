// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Handing frames to whatever turns them into pictures.  We never
//! touch pixels here: a frame leaves as one `re, im, iterations`
//! record per point, in no particular order, and an external
//! assembler rasterises and sequences them.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::aggregate::{Frame, FrameSet};
use crate::error::ZoomError;

/// Receives finished frames, one at a time, in order.
pub trait OutputSink {
    /// Accept one frame.  Any error aborts the run.
    fn write_frame(&mut self, frame: &Frame) -> Result<(), ZoomError>;
}

/// Hand every frame of a run to a sink, first to last.  Stops at the
/// first failure.
pub fn write_frames<S: OutputSink + ?Sized>(
    sink: &mut S,
    frames: &FrameSet,
) -> Result<(), ZoomError> {
    for frame in frames {
        sink.write_frame(frame)?;
    }
    Ok(())
}

/// Write one record per point of `frame` and return how many were
/// written.  Iterations are `-1` for converged points, `0` for points
/// never evaluated, and the escape step otherwise.
pub fn write_records<W: Write>(out: &mut W, frame: &Frame) -> io::Result<usize> {
    let mut count = 0;
    for (coordinate, escape) in frame.iter() {
        writeln!(out, "{}, {}", coordinate, escape.record_value())?;
        count += 1;
    }
    Ok(count)
}

/// The file a frame is written to.  Files are numbered from zero, so
/// frame 1 is `frame00.txt`.
pub fn frame_file_name(index: u32) -> String {
    format!("frame{:02}.txt", index.saturating_sub(1))
}

/// Writes each frame to its own file in a directory.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// A sink writing into `dir`, which is created if missing.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, ZoomError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| ZoomError::output(0, e))?;
        Ok(DirectorySink { dir })
    }

    /// Where a given frame ends up.
    pub fn path_for(&self, index: u32) -> PathBuf {
        self.dir.join(frame_file_name(index))
    }
}

impl OutputSink for DirectorySink {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), ZoomError> {
        let path = self.path_for(frame.index());
        let write = || -> io::Result<usize> {
            let mut out = BufWriter::new(File::create(&path)?);
            let count = write_records(&mut out, frame)?;
            out.flush()?;
            Ok(count)
        };
        let count = write().map_err(|e| ZoomError::output(frame.index(), e))?;
        debug!("wrote {} records to {}", count, path.display());
        Ok(())
    }
}
