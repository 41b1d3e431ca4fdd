//! Effectiveness scoring for parallel solutions.

use chrono::TimeDelta;
use fmerge_types::{Frame, FrameId};
use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;

const BASE_SCORE: f64 = 0.5;
const CLOSED_BONUS: f64 = 0.2;
const OUTPUTS_BONUS: f64 = 0.1;
const DIGEST_BONUS: f64 = 0.1;
const QUICK_CLOSE_BONUS: f64 = 0.1;

/// How effective a frame looks as a finished solution, in `[0.5, 1.0]`.
///
/// Base 0.5; +0.2 if closed, +0.1 with outputs, +0.1 with digest text,
/// +0.1 if closed within `quick_close_minutes` of creation; capped at 1.0.
pub fn effectiveness_score(frame: &Frame, config: &DetectionConfig) -> f64 {
    let mut score = BASE_SCORE;
    if frame.is_closed() {
        score += CLOSED_BONUS;
    }
    if frame.has_outputs() {
        score += OUTPUTS_BONUS;
    }
    if frame.has_digest() {
        score += DIGEST_BONUS;
    }
    // A window chrono cannot represent earns no bonus.
    let quick = TimeDelta::try_minutes(config.quick_close_minutes);
    if let (Some(quick), Some(lifetime)) = (quick, frame.lifetime()) {
        if lifetime >= TimeDelta::zero() && lifetime <= quick {
            score += QUICK_CLOSE_BONUS;
        }
    }
    score.min(1.0)
}

/// One frame's entry in a cluster of parallel solutions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolutionAssessment {
    pub frame_id: FrameId,
    /// Index of the cluster this frame belongs to (in discovery order).
    pub cluster: usize,
    pub cluster_size: usize,
    pub effectiveness: f64,
    pub is_closed: bool,
    pub has_outputs: bool,
}

/// Union-find over frame slots for transitive clustering.
#[derive(Debug)]
pub(crate) struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}
