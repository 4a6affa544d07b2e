// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Frames and the aggregator that fills them.
//!
//! Only one thread ever owns the FrameSet: the aggregator, which reads
//! results off the results queue and files each one under every frame
//! that claimed it.  Workers never touch a frame, so frames need no
//! locks.

use std::collections::hash_map;
use std::collections::HashMap;

use crossbeam::channel::Receiver;
use crossbeam::select;
use log::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::ZoomError;
use crate::escape::Escape;
use crate::sample::{Coordinate, EvaluationResult};

/// One still image's worth of evaluated points.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    index: u32,
    points: HashMap<Coordinate, Escape>,
}

impl Frame {
    /// An empty frame.  The map does not allocate until the first
    /// insert.
    pub fn new(index: u32) -> Self {
        Frame {
            index,
            points: HashMap::new(),
        }
    }

    /// The 1-based position of this frame in the animation.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The number of points in the frame.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether any point has been filed here.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The result for a coordinate, if this frame includes it.
    pub fn get(&self, coordinate: &Coordinate) -> Option<Escape> {
        self.points.get(coordinate).cloned()
    }

    /// Every point in the frame, in no particular order.
    pub fn iter(&self) -> hash_map::Iter<Coordinate, Escape> {
        self.points.iter()
    }

    fn insert(&mut self, coordinate: Coordinate, escape: Escape) {
        self.points.insert(coordinate, escape);
    }
}

/// The frames of one run, in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameSet {
    frames: Vec<Frame>,
}

impl FrameSet {
    /// `count` empty frames, indexed 1 to `count`.
    pub fn new(count: u32) -> Self {
        FrameSet {
            frames: (1..=count).map(Frame::new).collect(),
        }
    }

    /// The number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the run had no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frame with the given 1-based index.
    pub fn get(&self, index: u32) -> Option<&Frame> {
        let position = (index as usize).checked_sub(1)?;
        self.frames.get(position)
    }

    fn get_mut(&mut self, index: u32) -> Option<&mut Frame> {
        let position = (index as usize).checked_sub(1)?;
        self.frames.get_mut(position)
    }

    /// The frames, first to last.
    pub fn iter(&self) -> std::slice::Iter<Frame> {
        self.frames.iter()
    }

    /// The total number of (point, frame) entries.
    pub fn entries(&self) -> usize {
        self.frames.iter().map(Frame::len).sum()
    }
}

impl IntoIterator for FrameSet {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;
    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<'a> IntoIterator for &'a FrameSet {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;
    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// The single writer of a FrameSet.
#[derive(Debug)]
pub struct Aggregator {
    frames: FrameSet,
    received: usize,
}

impl Aggregator {
    /// An aggregator for a run of `count` frames.
    pub fn new(count: u32) -> Self {
        Aggregator {
            frames: FrameSet::new(count),
            received: 0,
        }
    }

    /// File one result under every frame in its membership.
    pub fn insert(&mut self, result: EvaluationResult) {
        self.received += 1;
        for &index in &result.frames {
            match self.frames.get_mut(index) {
                Some(frame) => frame.insert(result.coordinate, result.escape),
                None => warn!(
                    "result for {} names frame {} of {}; dropped",
                    result.coordinate,
                    index,
                    self.frames.len()
                ),
            }
        }
    }

    /// How many results have been filed.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Read results until the queue is closed and empty, then hand
    /// back the finished frames.  Cancellation abandons the frames.
    pub fn drain(
        mut self,
        results: &Receiver<EvaluationResult>,
        cancel: &CancelToken,
    ) -> Result<FrameSet, ZoomError> {
        loop {
            let next = select! {
                recv(results) -> result => Ok(result.ok()),
                recv(cancel.signal()) -> _ => Err(ZoomError::Cancelled),
            };
            match next {
                Ok(Some(result)) => self.insert(result),
                Ok(None) => break,
                Err(err) => {
                    debug!("aggregator cancelled after {} results", self.received);
                    return Err(err);
                }
            }
        }
        debug!("aggregator drained {} results", self.received);
        Ok(self.finish())
    }

    /// Give up ownership of the frames.
    pub fn finish(self) -> FrameSet {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{Membership, SamplePoint};
    use crossbeam::channel;

    fn result(re: f64, im: f64, escape: Escape, frames: &[u32]) -> EvaluationResult {
        let mut point = SamplePoint::new(Coordinate::new(re, im));
        point.frames = frames.iter().cloned().collect::<Membership>();
        point.evaluated(escape)
    }

    #[test]
    fn files_results_under_each_member_frame() {
        let mut aggregator = Aggregator::new(3);
        aggregator.insert(result(0.0, 0.0, Escape::Converged, &[1, 2, 3]));
        aggregator.insert(result(1.0, 1.0, Escape::Diverged(2), &[1]));
        aggregator.insert(result(0.5, 0.5, Escape::Diverged(5), &[2, 3]));
        let frames = aggregator.finish();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames.get(1).unwrap().len(), 2);
        assert_eq!(frames.get(2).unwrap().len(), 2);
        assert_eq!(frames.get(3).unwrap().len(), 2);
        assert_eq!(frames.entries(), 6);
        let one_one = Coordinate::new(1.0, 1.0);
        assert_eq!(frames.get(1).unwrap().get(&one_one), Some(Escape::Diverged(2)));
        assert_eq!(frames.get(2).unwrap().get(&one_one), None);
    }

    #[test]
    fn frames_are_indexed_from_one() {
        let frames = FrameSet::new(2);
        assert!(frames.get(0).is_none());
        assert_eq!(frames.get(1).unwrap().index(), 1);
        assert_eq!(frames.get(2).unwrap().index(), 2);
        assert!(frames.get(3).is_none());
        assert!(frames.iter().all(Frame::is_empty));
    }

    #[test]
    fn out_of_range_memberships_are_dropped() {
        let mut aggregator = Aggregator::new(1);
        aggregator.insert(result(0.0, 0.0, Escape::Converged, &[1, 4]));
        assert_eq!(aggregator.received(), 1);
        assert_eq!(aggregator.finish().entries(), 1);
    }

    #[test]
    fn drain_stops_when_the_queue_closes() {
        let (tx, rx) = channel::unbounded();
        tx.send(result(0.0, 0.0, Escape::Converged, &[1])).unwrap();
        tx.send(result(2.0, 0.0, Escape::Diverged(1), &[1, 2])).unwrap();
        drop(tx);
        let frames = Aggregator::new(2).drain(&rx, &CancelToken::new()).unwrap();
        assert_eq!(frames.get(1).unwrap().len(), 2);
        assert_eq!(frames.get(2).unwrap().len(), 1);
    }

    #[test]
    fn drain_gives_up_on_cancel() {
        let (_tx, rx) = channel::unbounded::<EvaluationResult>();
        let cancel = CancelToken::new();
        cancel.cancel();
        match Aggregator::new(1).drain(&rx, &cancel) {
            Err(ZoomError::Cancelled) => (),
            other => panic!("expected cancellation, got {:?}", other),
        }
    }
}
