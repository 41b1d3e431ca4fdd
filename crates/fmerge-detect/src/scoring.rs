//! Pluggable frame similarity scoring.
//!
//! Every heuristic implements [`SimilarityScorer`] and returns a score in
//! `[0, 1]`. The detector's default scorer is a [`MaxScorer`] over name,
//! placement, and input similarity; callers can swap in their own.

use std::collections::BTreeMap;

use fmerge_types::Frame;
use serde_json::Value;

/// A similarity heuristic between two frames.
///
/// Implementations must be pure and return a value in `[0, 1]`.
pub trait SimilarityScorer: Send + Sync {
    /// Short name of the heuristic (for logging).
    fn name(&self) -> &str;

    /// Score how alike `a` and `b` are.
    fn score(&self, a: &Frame, b: &Frame) -> f64;
}

/// Name similarity via normalized edit distance on trimmed, lower-cased names.
#[derive(Clone, Copy, Debug, Default)]
pub struct NameSimilarity;

impl SimilarityScorer for NameSimilarity {
    fn name(&self) -> &str {
        "name"
    }

    fn score(&self, a: &Frame, b: &Frame) -> f64 {
        normalized_edit_similarity(&a.name, &b.name)
    }
}

/// 1.0 when both frames have the same type tag and the same parent frame.
///
/// Two roots have no parent id in common, so they never match here.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlacementSimilarity;

impl SimilarityScorer for PlacementSimilarity {
    fn name(&self) -> &str {
        "placement"
    }

    fn score(&self, a: &Frame, b: &Frame) -> f64 {
        let same_parent = matches!((&a.parent_id, &b.parent_id), (Some(pa), Some(pb)) if pa == pb);
        if same_parent && a.frame_type == b.frame_type {
            1.0
        } else {
            0.0
        }
    }
}

/// Fraction of input keys whose values match structurally.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputSimilarity;

impl SimilarityScorer for InputSimilarity {
    fn name(&self) -> &str {
        "inputs"
    }

    fn score(&self, a: &Frame, b: &Frame) -> f64 {
        map_similarity(&a.inputs, &b.inputs).unwrap_or(0.0)
    }
}

/// Takes the maximum over a set of scorers.
pub struct MaxScorer {
    scorers: Vec<Box<dyn SimilarityScorer>>,
}

impl MaxScorer {
    /// An empty combinator; scores 0.0 until scorers are added.
    pub fn new() -> Self {
        Self {
            scorers: Vec::new(),
        }
    }

    /// The default combination: name, placement, and input similarity.
    pub fn standard() -> Self {
        Self::new()
            .with(NameSimilarity)
            .with(PlacementSimilarity)
            .with(InputSimilarity)
    }

    pub fn with(mut self, scorer: impl SimilarityScorer + 'static) -> Self {
        self.scorers.push(Box::new(scorer));
        self
    }

    /// Number of combined scorers.
    pub fn len(&self) -> usize {
        self.scorers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }
}

impl Default for MaxScorer {
    fn default() -> Self {
        Self::standard()
    }
}

impl SimilarityScorer for MaxScorer {
    fn name(&self) -> &str {
        "max"
    }

    fn score(&self, a: &Frame, b: &Frame) -> f64 {
        let mut best = 0.0_f64;
        for scorer in &self.scorers {
            best = best.max(scorer.score(a, b));
            if best >= 1.0 {
                break;
            }
        }
        best
    }
}

/// `1 - distance / max_len` over trimmed, lower-cased strings.
///
/// Two empty strings carry no evidence and score 0.0.
pub fn normalized_edit_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 0.0;
    }
    1.0 - edit_distance(&a, &b) as f64 / max_len as f64
}

/// Levenshtein distance (insert, delete, substitute all cost 1).
pub fn edit_distance(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Fraction of keys (over the union of both maps) whose values are equal.
///
/// Returns `None` when both maps are empty.
pub fn map_similarity(a: &BTreeMap<String, Value>, b: &BTreeMap<String, Value>) -> Option<f64> {
    let union = a.len() + b.keys().filter(|k| !a.contains_key(*k)).count();
    if union == 0 {
        return None;
    }
    let matching = a
        .iter()
        .filter(|(key, value)| b.get(*key) == Some(*value))
        .count();
    Some(matching as f64 / union as f64)
}
