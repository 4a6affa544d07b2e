// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The parameters of a zoom run.  These arrive already validated
//! (the command line front end checks ranges); nothing here rejects a
//! value.
use num::Complex;

/// The parameters by which a zoom animation is generated.  Once a run
/// has started, this object should not be mutated.
#[derive(Copy, Clone, Debug)]
pub struct ZoomConfig {
    /// The point every frame is centred on.
    pub center: Complex<f64>,
    /// The distance between neighbouring samples in the first frame.
    pub zoom: f64,
    /// The number of samples along each axis of a frame.
    pub dimension: usize,
    /// The number of frames in the animation.
    pub frames: u32,
    /// The per-frame multiplier applied to the step (below 1.0 zooms in).
    pub decay: f64,
    /// The iteration budget for each point.
    pub max_iterations: u32,
    /// The number of evaluation threads.
    pub workers: usize,
    /// When set, both queues hold at most this many entries and their
    /// producers block while full.  Unbounded otherwise.
    pub queue_depth: Option<usize>,
}

/// Two evaluation threads per logical CPU.
pub fn default_workers() -> usize {
    num_cpus::get() * 2
}

impl Default for ZoomConfig {
    fn default() -> Self {
        ZoomConfig {
            center: Complex::new(-0.5, 0.0),
            zoom: 3.0 / 1024.0,
            dimension: 1024,
            frames: 30,
            decay: 0.9,
            max_iterations: 1000,
            workers: default_workers(),
            queue_depth: None,
        }
    }
}

impl ZoomConfig {
    /// Sets the centre of the zoom.
    pub fn with_center(mut self, center: Complex<f64>) -> Self {
        self.center = center;
        self
    }

    /// Sets the first frame's step directly.
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    /// Sets the first frame's step so the window is `span` wide.  Call
    /// after `with_dimension`.
    pub fn with_span(mut self, span: f64) -> Self {
        self.zoom = span / (self.dimension as f64);
        self
    }

    /// Sets the number of samples per axis.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Sets the number of frames.
    pub fn with_frames(mut self, frames: u32) -> Self {
        self.frames = frames;
        self
    }

    /// Sets the per-frame zoom decay.
    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    /// Sets the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the number of evaluation threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Bounds both queues.
    pub fn with_queue_depth(mut self, depth: Option<usize>) -> Self {
        self.queue_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_spans_classic_interval() {
        let config = ZoomConfig::default();
        let span = config.zoom * (config.dimension as f64);
        assert!((span - 3.0).abs() < 1e-12);
        assert_eq!(config.center, Complex::new(-0.5, 0.0));
        assert!(config.workers >= 2);
    }

    #[test]
    fn span_uses_dimension() {
        let config = ZoomConfig::default().with_dimension(4).with_span(8.0);
        assert_eq!(config.zoom, 2.0);
    }
}
