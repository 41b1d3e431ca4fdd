//! The divergence tree: both stacks' frames laid over a shared base frame.
//!
//! Nodes are the base frame plus the union (by id) of both stacks' frames.
//! A node is tagged by where its frame lives and whether anything about it
//! disagrees between the two sides:
//!
//! - `common`: in both stacks with identical content (or the base itself)
//! - `branch1` / `branch2`: only in one stack
//! - `conflict`: implicated by a detected conflict, or present in both
//!   stacks with differing content

use std::collections::{BTreeSet, HashMap};

use fmerge_types::{ConflictId, Frame, FrameId, FrameStack, FrameState, MergeConflict, Severity};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::{layout, LayoutMode, Position};

/// Where a node's frame lives and whether the sides agree on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffNodeKind {
    Common,
    Branch1,
    Branch2,
    Conflict,
}

impl DiffNodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Branch1 => "branch1",
            Self::Branch2 => "branch2",
            Self::Conflict => "conflict",
        }
    }
}

/// The relationship an edge draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffEdgeKind {
    /// Frame to parent (roots hang off the base).
    Parent,
    /// Between the two frames of a detected conflict.
    Conflict,
    /// The second stack's parent link for a shared frame it re-parented.
    Merge,
}

/// Conflict details attached to a `conflict` node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Highest severity among the conflicts implicating this frame.
    pub severity: Option<Severity>,
    pub conflicts: Vec<ConflictId>,
    /// The frame exists in both stacks but its content differs.
    pub content_differs: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiffNode {
    pub id: FrameId,
    pub kind: DiffNodeKind,
    pub label: String,
    #[serde(rename = "type")]
    pub frame_type: String,
    pub state: FrameState,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiffEdge {
    pub from: FrameId,
    pub to: FrameId,
    pub kind: DiffEdgeKind,
}

/// A renderable graph of two branches relative to a shared base.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiffTree {
    pub base: FrameId,
    pub nodes: Vec<DiffNode>,
    pub edges: Vec<DiffEdge>,
    pub layout: LayoutMode,
}

impl DiffTree {
    pub fn node(&self, id: &FrameId) -> Option<&DiffNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Number of nodes with the given tag.
    pub fn count(&self, kind: DiffNodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    pub fn edges_of(&self, kind: DiffEdgeKind) -> impl Iterator<Item = &DiffEdge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// Returns `true` if the two branches agree on every frame.
    pub fn is_converged(&self) -> bool {
        self.nodes.iter().all(|n| n.kind == DiffNodeKind::Common)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Returns `true` if two copies of the same frame disagree on anything a
/// reviewer would care about.
pub fn content_differs(a: &Frame, b: &Frame) -> bool {
    a.name != b.name
        || a.frame_type != b.frame_type
        || a.state != b.state
        || a.parent_id != b.parent_id
        || a.outputs != b.outputs
        || a.digest_text != b.digest_text
}

/// Where a frame was found.
struct Placement<'a> {
    /// Stack 1's copy if present, else stack 2's.
    frame: &'a Frame,
    other: Option<&'a Frame>,
    kind: DiffNodeKind,
}

/// Build the divergence tree for `base` and the two stacks.
pub fn build_tree(
    base: &Frame,
    stack1: &FrameStack,
    stack2: &FrameStack,
    conflicts: &[MergeConflict],
    mode: LayoutMode,
) -> DiffTree {
    let placements = place_frames(base, stack1, stack2);
    let present: HashMap<&FrameId, usize> = placements
        .iter()
        .enumerate()
        .map(|(i, p)| (&p.frame.id, i))
        .collect();

    let mut nodes: Vec<DiffNode> = placements
        .iter()
        .map(|p| {
            let implicated: Vec<&MergeConflict> =
                conflicts.iter().filter(|c| c.implicates(&p.frame.id)).collect();
            let differs = p.other.is_some_and(|other| content_differs(p.frame, other));
            let (kind, metadata) = if implicated.is_empty() && !differs {
                (p.kind, None)
            } else {
                let metadata = NodeMetadata {
                    severity: implicated.iter().map(|c| c.severity).max(),
                    conflicts: implicated.iter().map(|c| c.id).collect(),
                    content_differs: differs,
                };
                (DiffNodeKind::Conflict, Some(metadata))
            };
            DiffNode {
                id: p.frame.id.clone(),
                kind,
                label: p.frame.name.clone(),
                frame_type: p.frame.frame_type.clone(),
                state: p.frame.state,
                position: Position::default(),
                metadata,
            }
        })
        .collect();

    let edges = build_edges(base, &placements, &present, conflicts);

    let created: Vec<_> = placements.iter().map(|p| p.frame.created_at).collect();
    let positions = layout(mode, &base.id, &nodes, &edges, &created);
    for (node, position) in nodes.iter_mut().zip(positions) {
        node.position = position;
    }

    debug!(
        base = %base.id,
        nodes = nodes.len(),
        edges = edges.len(),
        layout = mode.as_str(),
        "built divergence tree"
    );

    DiffTree {
        base: base.id.clone(),
        nodes,
        edges,
        layout: mode,
    }
}

/// Base first, then stack 1 in order, then frames only stack 2 has.
fn place_frames<'a>(
    base: &'a Frame,
    stack1: &'a FrameStack,
    stack2: &'a FrameStack,
) -> Vec<Placement<'a>> {
    let mut seen: BTreeSet<&FrameId> = BTreeSet::new();
    let mut placements = vec![Placement {
        frame: base,
        other: None,
        kind: DiffNodeKind::Common,
    }];
    seen.insert(&base.id);

    for frame in &stack1.frames {
        if !seen.insert(&frame.id) {
            continue;
        }
        let other = stack2.frame(&frame.id);
        placements.push(Placement {
            frame,
            other,
            kind: if other.is_some() {
                DiffNodeKind::Common
            } else {
                DiffNodeKind::Branch1
            },
        });
    }
    for frame in &stack2.frames {
        if !seen.insert(&frame.id) {
            continue;
        }
        placements.push(Placement {
            frame,
            other: None,
            kind: DiffNodeKind::Branch2,
        });
    }
    placements
}

fn build_edges(
    base: &Frame,
    placements: &[Placement<'_>],
    present: &HashMap<&FrameId, usize>,
    conflicts: &[MergeConflict],
) -> Vec<DiffEdge> {
    // A parent link is drawn only to an existing, different node; anything
    // else (root, dangling, self-loop) hangs off the base.
    let parent_of = |frame: &Frame| -> FrameId {
        match &frame.parent_id {
            Some(parent) if parent != &frame.id && present.contains_key(parent) => parent.clone(),
            _ => base.id.clone(),
        }
    };

    let mut edges = Vec::new();
    for placement in placements.iter().skip(1) {
        let frame = placement.frame;
        let parent = parent_of(frame);
        if let Some(other) = placement.other {
            let alternate = parent_of(other);
            if alternate != parent {
                edges.push(DiffEdge {
                    from: frame.id.clone(),
                    to: alternate,
                    kind: DiffEdgeKind::Merge,
                });
            }
        }
        edges.push(DiffEdge {
            from: frame.id.clone(),
            to: parent,
            kind: DiffEdgeKind::Parent,
        });
    }

    let conflict_edges: BTreeSet<DiffEdge> = conflicts
        .iter()
        .filter(|c| c.frame1 != c.frame2)
        .filter(|c| present.contains_key(&c.frame1) && present.contains_key(&c.frame2))
        .map(|c| DiffEdge {
            from: c.frame1.clone(),
            to: c.frame2.clone(),
            kind: DiffEdgeKind::Conflict,
        })
        .collect();
    edges.extend(conflict_edges);
    edges
}
