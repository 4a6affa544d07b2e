// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the FrameWindow struct, which describes the relationship
//! between a square grid of cells with an origin at 0,0 and the
//! region of the complex plane one frame of the zoom samples.  Every
//! frame shares a centre; only the distance between neighbouring
//! samples (the step) changes from frame to frame.
use itertools::iproduct;
use num::Complex;

use crate::config::ZoomConfig;

/// Describes the column, row of a cell in a frame's grid.  Column 0,
/// row 0 is the left-lower corner of the window.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Cell(pub usize, pub usize);

/// The sampling window of a single frame: `dimension` samples along
/// each axis, `step` apart, centred on `center`.
#[derive(Copy, Clone, Debug)]
pub struct FrameWindow {
    /// The centre of the window on the complex plane.
    pub center: Complex<f64>,
    /// The distance between two neighbouring samples.
    pub step: f64,
    /// The number of samples along each axis.
    pub dimension: usize,
}

impl FrameWindow {
    /// Constructor.  Takes the centre of the window, the distance
    /// between samples, and the number of samples per axis.
    pub fn new(center: Complex<f64>, step: f64, dimension: usize) -> FrameWindow {
        FrameWindow {
            center,
            step,
            dimension,
        }
    }

    /// The window for frame `index` (1-based) of a zoom.  The step
    /// shrinks geometrically: `zoom * decay^(index - 1)`.
    pub fn for_frame(config: &ZoomConfig, index: u32) -> FrameWindow {
        let exponent = index.saturating_sub(1) as i32;
        let step = config.zoom * config.decay.powi(exponent);
        FrameWindow::new(config.center, step, config.dimension)
    }

    /// The total number of cells in the grid.
    pub fn len(&self) -> usize {
        self.dimension * self.dimension
    }

    /// Describes that the grid has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.dimension == 0
    }

    /// Half the extent of the window along either axis.
    pub fn half_width(&self) -> f64 {
        (self.dimension as f64) * self.step / 2.0
    }

    /// Given a cell of the grid, return the complex coordinate it
    /// samples.  The offset is always `index * step` from the window's
    /// edge and never a running sum, so two frames with the same step
    /// produce bit-identical coordinates.
    pub fn cell_to_point(&self, cell: &Cell) -> Complex<f64> {
        let half = self.half_width();
        Complex::new(
            self.center.re - half + (cell.0 as f64) * self.step,
            self.center.im - half + (cell.1 as f64) * self.step,
        )
    }

    /// Given a coordinate on the complex plane, map it to the nearest
    /// cell of the grid, or None if it falls outside the window.
    pub fn point_to_cell(&self, point: &Complex<f64>) -> Option<Cell> {
        let half = self.half_width();
        let column = ((point.re - (self.center.re - half)) / self.step).round();
        let row = ((point.im - (self.center.im - half)) / self.step).round();
        let limit = self.dimension as f64;
        if !(column >= 0.0 && column < limit && row >= 0.0 && row < limit) {
            return None;
        }
        Some(Cell(column as usize, row as usize))
    }

    /// Every coordinate the window samples, column by column.
    pub fn points<'a>(&'a self) -> impl Iterator<Item = Complex<f64>> + 'a {
        iproduct!(0..self.dimension, 0..self.dimension)
            .map(move |(column, row)| self.cell_to_point(&Cell(column, row)))
    }
}
