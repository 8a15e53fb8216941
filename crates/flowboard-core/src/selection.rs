//! Selection state and the drag-rectangle used to build it.

use std::collections::HashSet;

use kurbo::{Point, Rect};

use crate::edge::EdgeId;
use crate::node::NodeId;
use crate::store::Diagram;

/// The set of currently selected elements.
///
/// Node and edge selection are mutually exclusive: selecting one kind
/// clears the other. Fields are private so that invariant holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    nodes: HashSet<NodeId>,
    edges: HashSet<EdgeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select exactly one node, discarding everything else.
    pub fn select_node(&mut self, id: NodeId) {
        self.clear();
        self.nodes.insert(id);
    }

    /// Add or remove a node from the selection.
    pub fn toggle_node(&mut self, id: NodeId) {
        self.edges.clear();
        if !self.nodes.remove(&id) {
            self.nodes.insert(id);
        }
    }

    /// Replace the node selection wholesale.
    pub fn set_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.clear();
        self.nodes.extend(ids);
    }

    /// Select exactly one edge, discarding everything else.
    pub fn select_edge(&mut self, id: EdgeId) {
        self.clear();
        self.edges.insert(id);
    }

    /// Add or remove an edge from the selection.
    pub fn toggle_edge(&mut self, id: EdgeId) {
        self.nodes.clear();
        if !self.edges.remove(&id) {
            self.edges.insert(id);
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    pub fn is_node_selected(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn is_edge_selected(&self, id: EdgeId) -> bool {
        self.edges.contains(&id)
    }

    /// Whether the given node is the only selected element.
    pub fn is_sole_node(&self, id: NodeId) -> bool {
        self.edges.is_empty() && self.nodes.len() == 1 && self.nodes.contains(&id)
    }

    /// Whether the given edge is the only selected element.
    pub fn is_sole_edge(&self, id: EdgeId) -> bool {
        self.nodes.is_empty() && self.edges.len() == 1 && self.edges.contains(&id)
    }

    pub fn nodes(&self) -> &HashSet<NodeId> {
        &self.nodes
    }

    pub fn edges(&self) -> &HashSet<EdgeId> {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Drop references to elements no longer present in the diagram.
    pub fn prune(&mut self, diagram: &Diagram) {
        self.nodes.retain(|id| diagram.node(*id).is_some());
        self.edges.retain(|id| diagram.edge(*id).is_some());
    }
}

/// An in-progress drag rectangle, tracked in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionBox {
    /// Corner where the drag started.
    pub start: Point,
    /// Corner under the pointer right now.
    pub end: Point,
}

impl SelectionBox {
    pub fn new(start: Point) -> Self {
        Self { start, end: start }
    }

    /// The normalized rectangle between the two corners, whichever
    /// direction the drag went.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }
}
