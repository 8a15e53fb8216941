//! Edge records connecting pairs of nodes.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::node::NodeId;

/// Unique identifier for edges.
pub type EdgeId = Uuid;

/// A connection between two distinct nodes.
///
/// Anchor points are cached world positions on each endpoint's boundary.
/// They are recomputed together whenever either endpoint moves or
/// resizes; an edge never outlives its endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub(crate) id: EdgeId,
    /// Node the edge starts at.
    pub source: NodeId,
    /// Node the edge ends at.
    pub target: NodeId,
    /// Cached boundary point on the source node.
    pub source_anchor: Point,
    /// Cached boundary point on the target node.
    pub target_anchor: Point,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, source_anchor: Point, target_anchor: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            target,
            source_anchor,
            target_anchor,
        }
    }

    /// Get the unique identifier.
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Whether the edge has the given node as either endpoint.
    pub fn touches(&self, id: NodeId) -> bool {
        self.source == id || self.target == id
    }

    /// Whether the edge connects the given pair, in either direction.
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}
