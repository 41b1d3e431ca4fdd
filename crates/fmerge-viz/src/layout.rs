//! Deterministic 2-D placement of divergence tree nodes.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use fmerge_types::FrameId;
use serde::{Deserialize, Serialize};

use crate::tree::{DiffEdge, DiffEdgeKind, DiffNode, DiffNodeKind};

/// Horizontal distance between neighbouring nodes.
pub const H_SPACING: f64 = 150.0;
/// Vertical distance between rows.
pub const V_SPACING: f64 = 100.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// How nodes are arranged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Rows by distance from the base, each row centred on x = 0.
    #[default]
    Tree,
    /// Columns by creation time, one lane per node kind.
    Timeline,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Timeline => "timeline",
        }
    }
}

/// Positions for `nodes`, in node order.
///
/// `created` holds each node's creation time, parallel to `nodes`.
pub(crate) fn layout(
    mode: LayoutMode,
    base: &FrameId,
    nodes: &[DiffNode],
    edges: &[DiffEdge],
    created: &[DateTime<Utc>],
) -> Vec<Position> {
    match mode {
        LayoutMode::Tree => tree_layout(base, nodes, edges),
        LayoutMode::Timeline => timeline_layout(nodes, created),
    }
}

fn tree_layout(base: &FrameId, nodes: &[DiffNode], edges: &[DiffEdge]) -> Vec<Position> {
    let mut children: BTreeMap<&FrameId, BTreeSet<&FrameId>> = BTreeMap::new();
    for edge in edges.iter().filter(|e| e.kind == DiffEdgeKind::Parent) {
        children.entry(&edge.to).or_default().insert(&edge.from);
    }

    let mut rows: Vec<Vec<&FrameId>> = Vec::new();
    let mut visited: HashSet<&FrameId> = HashSet::new();
    let mut queue: VecDeque<(&FrameId, usize)> = VecDeque::new();
    visited.insert(base);
    queue.push_back((base, 0));

    while let Some((id, depth)) = queue.pop_front() {
        if rows.len() <= depth {
            rows.push(Vec::new());
        }
        rows[depth].push(id);
        for &child in children.get(id).into_iter().flatten() {
            if visited.insert(child) {
                queue.push_back((child, depth + 1));
            }
        }
    }

    // Parent cycles never reach the base; give them their own row.
    let stranded: Vec<&FrameId> = nodes
        .iter()
        .map(|n| &n.id)
        .filter(|id| !visited.contains(id))
        .collect();
    if !stranded.is_empty() {
        rows.push(stranded);
    }

    let mut positions: HashMap<&FrameId, Position> = HashMap::new();
    for (depth, row) in rows.iter().enumerate() {
        let offset = (row.len() as f64 - 1.0) * H_SPACING / 2.0;
        for (i, &id) in row.iter().enumerate() {
            positions.insert(
                id,
                Position {
                    x: i as f64 * H_SPACING - offset,
                    y: depth as f64 * V_SPACING,
                },
            );
        }
    }

    nodes
        .iter()
        .map(|n| positions.get(&n.id).copied().unwrap_or_default())
        .collect()
}

fn lane(kind: DiffNodeKind) -> f64 {
    match kind {
        DiffNodeKind::Branch1 => 0.0,
        DiffNodeKind::Common => 1.0,
        DiffNodeKind::Conflict => 2.0,
        DiffNodeKind::Branch2 => 3.0,
    }
}

fn timeline_layout(nodes: &[DiffNode], created: &[DateTime<Utc>]) -> Vec<Position> {
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| {
        created
            .get(a)
            .cmp(&created.get(b))
            .then_with(|| nodes[a].id.cmp(&nodes[b].id))
    });

    let mut positions = vec![Position::default(); nodes.len()];
    for (column, index) in order.into_iter().enumerate() {
        positions[index] = Position {
            x: column as f64 * H_SPACING,
            y: lane(nodes[index].kind) * V_SPACING,
        };
    }
    positions
}
