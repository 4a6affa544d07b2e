// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sample generation.  Every frame of a zoom samples a D×D grid, and
//! because frames share a centre, grids from different frames can
//! land on exactly the same coordinate.  Rather than evaluate such a
//! point once per frame, we collect every grid of the run into one
//! map keyed by coordinate and record, on each point, which frames
//! want it.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

use num::Complex;

use crate::config::ZoomConfig;
use crate::escape::Escape;
use crate::window::FrameWindow;

/// A location on the complex plane, compared by exact value.  Signed
/// zeros are folded together so that `-0.0` and `0.0` are one key.
#[derive(Copy, Clone, Debug)]
pub struct Coordinate {
    re: f64,
    im: f64,
}

impl Coordinate {
    /// Build a coordinate from its components.
    pub fn new(re: f64, im: f64) -> Self {
        // -0.0 + 0.0 == +0.0
        Coordinate {
            re: re + 0.0,
            im: im + 0.0,
        }
    }

    /// The real component.
    pub fn re(&self) -> f64 {
        self.re
    }

    /// The imaginary component.
    pub fn im(&self) -> f64 {
        self.im
    }

    /// This coordinate as a complex number.
    pub fn to_complex(&self) -> Complex<f64> {
        Complex::new(self.re, self.im)
    }
}

impl From<Complex<f64>> for Coordinate {
    fn from(c: Complex<f64>) -> Self {
        Coordinate::new(c.re, c.im)
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.re.to_bits() == other.re.to_bits() && self.im.to_bits() == other.im.to_bits()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.re.to_bits().hash(state);
        self.im.to_bits().hash(state);
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, {}", self.re, self.im)
    }
}

/// The frame indices (1-based) that reference one coordinate.
pub type Membership = BTreeSet<u32>;

/// A distinct coordinate and the frames it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplePoint {
    /// Where the point is.
    pub coordinate: Coordinate,
    /// Which frames include it.
    pub frames: Membership,
}

impl SamplePoint {
    /// A point that no frame has claimed yet.
    pub fn new(coordinate: Coordinate) -> Self {
        SamplePoint {
            coordinate,
            frames: Membership::new(),
        }
    }

    /// Consume the point, attaching the outcome of its evaluation.
    pub fn evaluated(self, escape: Escape) -> EvaluationResult {
        EvaluationResult {
            coordinate: self.coordinate,
            escape,
            frames: self.frames,
        }
    }
}

/// A point after evaluation, still carrying its frame membership so
/// the aggregator knows where to file it.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationResult {
    /// Where the point is.
    pub coordinate: Coordinate,
    /// How the point behaved under iteration.
    pub escape: Escape,
    /// Which frames include it.
    pub frames: Membership,
}

impl EvaluationResult {
    /// Whether the point stayed bounded.
    pub fn converged(&self) -> bool {
        self.escape.is_converged()
    }
}

/// The deduplicated working set of a run.
pub type SampleMap = HashMap<Coordinate, SamplePoint>;

/// Builds the working set for every frame of a zoom.
#[derive(Debug)]
pub struct SampleGenerator {
    config: ZoomConfig,
}

impl SampleGenerator {
    /// Requires the run's parameters; only the geometry is consulted.
    pub fn new(config: &ZoomConfig) -> Self {
        SampleGenerator { config: *config }
    }

    /// Walks every frame's grid in order, creating a point for each
    /// coordinate not seen before and adding the frame's index to its
    /// membership.
    pub fn generate(&self) -> SampleMap {
        let mut samples = SampleMap::new();
        for index in 1..=self.config.frames {
            self.add_frame(&mut samples, index);
        }
        samples
    }

    fn add_frame(&self, samples: &mut SampleMap, index: u32) {
        let window = FrameWindow::for_frame(&self.config, index);
        for point in window.points() {
            let coordinate = Coordinate::from(point);
            samples
                .entry(coordinate)
                .or_insert_with(|| SamplePoint::new(coordinate))
                .frames
                .insert(index);
        }
    }
}

/// The number of (point, frame) pairs in a working set.
pub fn membership_entries(samples: &SampleMap) -> usize {
    samples.values().map(|s| s.frames.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn config(dimension: usize, frames: u32, zoom: f64, decay: f64) -> ZoomConfig {
        ZoomConfig::default()
            .with_center(Complex::new(0.0, 0.0))
            .with_dimension(dimension)
            .with_frames(frames)
            .with_zoom(zoom)
            .with_decay(decay)
    }

    fn per_frame_counts(samples: &SampleMap, frames: u32) -> Vec<usize> {
        (1..=frames)
            .map(|i| samples.values().filter(|s| s.frames.contains(&i)).count())
            .collect()
    }

    #[test]
    fn coordinates_compare_by_value() {
        assert_eq!(Coordinate::new(0.5, -1.0), Coordinate::new(0.5, -1.0));
        assert_ne!(Coordinate::new(0.5, -1.0), Coordinate::new(0.5, 1.0));
        assert_eq!(Coordinate::new(-0.0, 0.0), Coordinate::new(0.0, -0.0));
    }

    #[test]
    fn single_frame_has_every_cell() {
        let samples = SampleGenerator::new(&config(4, 1, 2.0, 0.9)).generate();
        assert_eq!(samples.len(), 16);
        assert!(samples.values().all(|s| s.frames.len() == 1));
        assert!(samples.contains_key(&Coordinate::new(0.0, 0.0)));
        assert!(samples.contains_key(&Coordinate::new(2.0, 2.0)));
    }

    #[test]
    fn every_frame_has_dimension_squared_entries() {
        for &(dimension, frames) in &[(1, 1), (3, 5), (8, 4), (17, 3)] {
            let samples = SampleGenerator::new(&config(dimension, frames, 0.25, 0.9)).generate();
            for count in per_frame_counts(&samples, frames) {
                assert_eq!(count, dimension * dimension);
            }
            assert_eq!(
                membership_entries(&samples),
                dimension * dimension * frames as usize
            );
        }
    }

    #[test]
    fn constant_step_merges_frames() {
        // A decay of one repeats the same grid every frame.
        let samples = SampleGenerator::new(&config(5, 3, 0.1, 1.0)).generate();
        assert_eq!(samples.len(), 25);
        let all: Membership = (1..=3).collect();
        assert!(samples.values().all(|s| s.frames == all));
    }

    #[test]
    fn halving_step_shares_the_centre() {
        // Even dimension, halving step: the centre is on every grid.
        let samples = SampleGenerator::new(&config(4, 3, 1.0, 0.5)).generate();
        let centre = &samples[&Coordinate::new(0.0, 0.0)];
        assert_eq!(centre.frames, (1..=3).collect::<Membership>());
        assert!(samples.len() < 16 * 3);
        assert_eq!(membership_entries(&samples), 16 * 3);
    }

    #[test]
    fn generation_is_repeatable() {
        let c = config(9, 6, 0.37, 0.83);
        let first: HashSet<Coordinate> = SampleGenerator::new(&c).generate().into_keys().collect();
        let second: HashSet<Coordinate> = SampleGenerator::new(&c).generate().into_keys().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn evaluated_keeps_membership() {
        let mut point = SamplePoint::new(Coordinate::new(1.0, 1.0));
        point.frames.insert(2);
        point.frames.insert(5);
        let result = point.evaluated(Escape::Diverged(2));
        assert_eq!(result.frames, vec![2, 5].into_iter().collect::<Membership>());
        assert!(!result.converged());
    }
}
