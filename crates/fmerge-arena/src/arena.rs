//! The frame arena and its traversal algorithms.
//!
//! [`FrameArena`] borrows a stack's frames into a flat slot vector and keeps
//! two indexes: frame id -> slot, and parent id -> sorted child ids. Parent
//! links are never followed as pointers, so a cyclic or dangling parent
//! chain can only ever produce an [`ArenaError`], never an infinite walk.
//!
//! # Invariants
//!
//! - Frame ids are unique within the arena (first occurrence wins).
//! - Every upward walk carries a visited set and stops on the first repeat.
//! - The child index also records parents that are not frames of the stack,
//!   so structural comparison sees every parent id a child refers to.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use fmerge_types::{Frame, FrameId};
use tracing::{debug, warn};

use crate::error::{ArenaError, ArenaResult};

/// A flat arena over one stack's frames plus parent/children index maps.
#[derive(Clone, Debug, Default)]
pub struct FrameArena<'a> {
    /// Frames in stack order, one slot per unique id.
    slots: Vec<&'a Frame>,
    /// Frame id -> slot.
    index: HashMap<&'a FrameId, usize>,
    /// Parent id -> child ids (sorted, so traversal order is stable).
    children: BTreeMap<&'a FrameId, BTreeSet<&'a FrameId>>,
}

impl<'a> FrameArena<'a> {
    /// Build an arena over `frames`.
    pub fn build(frames: &'a [Frame]) -> Self {
        let mut arena = Self::default();
        for frame in frames {
            arena.insert(frame);
        }
        debug!(
            frames = arena.slots.len(),
            parents = arena.children.len(),
            "built frame arena"
        );
        arena
    }

    /// Build an arena over several frame slices; earlier slices win on
    /// duplicate ids.
    pub fn build_from<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = &'a [Frame]>,
    {
        let mut arena = Self::default();
        for frames in sources {
            for frame in frames {
                arena.insert(frame);
            }
        }
        arena
    }

    fn insert(&mut self, frame: &'a Frame) {
        if self.index.contains_key(&frame.id) {
            warn!(frame = %frame.id, "duplicate frame id in stack; keeping first");
            return;
        }
        self.index.insert(&frame.id, self.slots.len());
        self.slots.push(frame);
        if let Some(parent) = &frame.parent_id {
            self.children.entry(parent).or_default().insert(&frame.id);
        }
    }

    /// Number of frames in the arena.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the arena holds no frames.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All frames in stack order.
    pub fn frames(&self) -> impl Iterator<Item = &'a Frame> + '_ {
        self.slots.iter().copied()
    }

    pub fn get(&self, id: &FrameId) -> Option<&'a Frame> {
        self.index.get(id).map(|&slot| self.slots[slot])
    }

    pub fn contains(&self, id: &FrameId) -> bool {
        self.index.contains_key(id)
    }

    /// The child ids recorded under `parent`, if any frame names it as parent.
    pub fn children_of(&self, parent: &FrameId) -> Option<&BTreeSet<&'a FrameId>> {
        self.children.get(parent)
    }

    /// The full parent -> children index, ordered by parent id.
    pub fn child_index(&self) -> &BTreeMap<&'a FrameId, BTreeSet<&'a FrameId>> {
        &self.children
    }

    /// Frames with no parent id, in stack order.
    pub fn roots(&self) -> Vec<&'a Frame> {
        self.slots.iter().copied().filter(|f| f.is_root()).collect()
    }

    // ---------------------------------------------------------------
    // Upward walks
    // ---------------------------------------------------------------

    /// Depth of a frame: the number of parent links to its root.
    ///
    /// Fails if the frame is missing, a parent link dangles, or the parent
    /// chain loops back on itself.
    pub fn depth(&self, id: &FrameId) -> ArenaResult<usize> {
        Ok(self.ancestors(id)?.len())
    }

    /// Ancestors of a frame, nearest first. The frame itself is not included.
    pub fn ancestors(&self, id: &FrameId) -> ArenaResult<Vec<&'a Frame>> {
        let start = self
            .get(id)
            .ok_or_else(|| ArenaError::FrameNotFound(id.clone()))?;

        let mut visited: HashSet<&FrameId> = HashSet::new();
        visited.insert(&start.id);
        let mut chain = Vec::new();
        let mut current = start;

        while let Some(parent_id) = &current.parent_id {
            let parent = self.get(parent_id).ok_or_else(|| ArenaError::DanglingParent {
                frame: current.id.clone(),
                parent: parent_id.clone(),
            })?;
            if !visited.insert(&parent.id) {
                return Err(ArenaError::CycleDetected(parent.id.clone()));
            }
            chain.push(parent);
            current = parent;
        }

        Ok(chain)
    }

    /// Returns `true` if walking up from `id` loops.
    pub fn in_cycle(&self, id: &FrameId) -> bool {
        matches!(self.ancestors(id), Err(ArenaError::CycleDetected(_)))
    }

    // ---------------------------------------------------------------
    // Downward walks
    // ---------------------------------------------------------------

    /// Descendants of `id` up to `max_depth` levels (BFS downward), each
    /// paired with its distance from `id`.
    ///
    /// `id` itself is not included and need not be a frame of the arena.
    /// Siblings are visited in id order.
    pub fn descendants(&self, id: &FrameId, max_depth: usize) -> Vec<(&'a Frame, usize)> {
        let mut visited: HashSet<&FrameId> = HashSet::new();
        visited.insert(id);
        let mut result = Vec::new();
        let mut queue: VecDeque<(&FrameId, usize)> = VecDeque::new();
        queue.push_back((id, 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            let Some(child_ids) = self.children.get(current) else {
                continue;
            };
            for &child_id in child_ids {
                if !visited.insert(child_id) {
                    continue;
                }
                if let Some(child) = self.get(child_id) {
                    result.push((child, depth + 1));
                    queue.push_back((child_id, depth + 1));
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn frame(id: &str, parent: Option<&str>) -> Frame {
        let base = Frame::new(id, "task", id, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        match parent {
            Some(p) => base.with_parent(p, 0),
            None => base,
        }
    }

    fn fid(id: &str) -> FrameId {
        FrameId::new(id)
    }

    /// root -> a -> b -> c, root -> d
    fn chain() -> Vec<Frame> {
        vec![
            frame("root", None),
            frame("a", Some("root")),
            frame("b", Some("a")),
            frame("c", Some("b")),
            frame("d", Some("root")),
        ]
    }

    #[test]
    fn empty_arena() {
        let frames: Vec<Frame> = Vec::new();
        let arena = FrameArena::build(&frames);
        assert!(arena.is_empty());
        assert!(arena.roots().is_empty());
        assert!(arena.child_index().is_empty());
    }

    #[test]
    fn depth_follows_parent_links() {
        let frames = chain();
        let arena = FrameArena::build(&frames);
        assert_eq!(arena.depth(&fid("root")).unwrap(), 0);
        assert_eq!(arena.depth(&fid("a")).unwrap(), 1);
        assert_eq!(arena.depth(&fid("c")).unwrap(), 3);
        assert_eq!(arena.depth(&fid("d")).unwrap(), 1);
    }

    #[test]
    fn ancestors_nearest_first() {
        let frames = chain();
        let arena = FrameArena::build(&frames);
        let ids: Vec<&str> = arena
            .ancestors(&fid("c"))
            .unwrap()
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "a", "root"]);
    }

    #[test]
    fn child_index_is_sorted() {
        let frames = vec![
            frame("root", None),
            frame("z", Some("root")),
            frame("m", Some("root")),
            frame("a", Some("root")),
        ];
        let arena = FrameArena::build(&frames);
        let kids: Vec<&str> = arena
            .children_of(&fid("root"))
            .unwrap()
            .iter()
            .map(|id| id.as_str())
            .collect();
        assert_eq!(kids, vec!["a", "m", "z"]);
    }

    #[test]
    fn self_referential_parent_is_a_cycle() {
        let frames = vec![frame("loop", Some("loop"))];
        let arena = FrameArena::build(&frames);
        assert_eq!(
            arena.depth(&fid("loop")),
            Err(ArenaError::CycleDetected(fid("loop")))
        );
        assert!(arena.in_cycle(&fid("loop")));
    }

    #[test]
    fn two_frame_cycle_terminates() {
        let frames = vec![frame("x", Some("y")), frame("y", Some("x"))];
        let arena = FrameArena::build(&frames);
        assert!(matches!(arena.depth(&fid("x")), Err(ArenaError::CycleDetected(_))));
        assert!(arena.roots().is_empty());
        // Downward walks also terminate.
        let below = arena.descendants(&fid("x"), usize::MAX);
        assert_eq!(below.len(), 1);
    }

    #[test]
    fn dangling_parent_is_reported() {
        let frames = vec![frame("orphan", Some("ghost"))];
        let arena = FrameArena::build(&frames);
        assert_eq!(
            arena.depth(&fid("orphan")),
            Err(ArenaError::DanglingParent {
                frame: fid("orphan"),
                parent: fid("ghost"),
            })
        );
        // The dangling parent still shows up in the child index.
        assert!(arena.children_of(&fid("ghost")).is_some());
    }

    #[test]
    fn missing_frame_is_reported() {
        let frames = chain();
        let arena = FrameArena::build(&frames);
        assert_eq!(
            arena.depth(&fid("nope")),
            Err(ArenaError::FrameNotFound(fid("nope")))
        );
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let frames = vec![frame("a", None), frame("a", Some("elsewhere"))];
        let arena = FrameArena::build(&frames);
        assert_eq!(arena.len(), 1);
        assert!(arena.get(&fid("a")).unwrap().is_root());
        assert!(arena.children_of(&fid("elsewhere")).is_none());
    }

    #[test]
    fn descendants_respect_max_depth() {
        let frames = chain();
        let arena = FrameArena::build(&frames);
        let all = arena.descendants(&fid("root"), usize::MAX);
        assert_eq!(all.len(), 4);
        let shallow = arena.descendants(&fid("root"), 1);
        let ids: Vec<&str> = shallow.iter().map(|(f, _)| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
        assert!(shallow.iter().all(|(_, depth)| *depth == 1));
    }

    #[test]
    fn build_from_prefers_earlier_sources() {
        let first = vec![frame("shared", None)];
        let second = vec![frame("shared", Some("p")), frame("extra", None)];
        let arena = FrameArena::build_from([first.as_slice(), second.as_slice()]);
        assert_eq!(arena.len(), 2);
        assert!(arena.get(&fid("shared")).unwrap().is_root());
    }
}
