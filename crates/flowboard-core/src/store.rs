//! The diagram document and the store that owns all editor state.

use std::collections::{HashMap, HashSet};

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::edge::{Edge, EdgeId};
use crate::geometry;
use crate::history::{History, Snapshot};
use crate::node::{Node, NodeId, NodeKind, NodePatch};
use crate::selection::{Selection, SelectionBox};
use crate::tools::ToolMode;
use crate::viewport::Viewport;

/// World-space offset applied to duplicated elements.
const DUPLICATE_OFFSET: Vec2 = Vec2::new(20.0, 20.0);

/// Errors surfaced when loading a serialized diagram.
#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("invalid diagram JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate element id {0}")]
    DuplicateId(Uuid),
    #[error("edge {edge} references missing node {node}")]
    DanglingEdge { edge: EdgeId, node: NodeId },
    #[error("edge {0} connects a node to itself")]
    SelfLoop(EdgeId),
    #[error("nodes {a} and {b} are connected more than once")]
    DuplicateEdge { a: NodeId, b: NodeId },
}

/// The diagram content: nodes and the edges between them.
///
/// This is the persisted document. Vec order is draw order, with later
/// nodes rendered on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Look up a node by id, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Whether the two nodes are already connected, in either direction.
    pub fn has_edge_between(&self, a: NodeId, b: NodeId) -> bool {
        self.edges.iter().any(|e| e.connects(a, b))
    }

    /// All edges with the given node as an endpoint.
    pub fn edges_of(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.touches(id))
    }

    /// Remove a node and every edge touching it. Returns whether the
    /// node existed.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|e| !e.touches(id));
        true
    }

    /// Remove an edge. Returns whether it existed.
    pub fn remove_edge(&mut self, id: EdgeId) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        self.edges.len() != before
    }

    /// Recompute cached anchors for every edge touching the given
    /// node. Both ends of each affected edge are updated together,
    /// since moving one endpoint changes the facing direction of both.
    pub fn refresh_edges_of(&mut self, id: NodeId) {
        let Self { nodes, edges } = self;
        for edge in edges.iter_mut().filter(|e| e.touches(id)) {
            let (Some(source), Some(target)) = (
                nodes.iter().find(|n| n.id == edge.source),
                nodes.iter().find(|n| n.id == edge.target),
            ) else {
                continue;
            };
            let (source_anchor, target_anchor) = geometry::edge_anchors(source, target);
            edge.source_anchor = source_anchor;
            edge.target_anchor = target_anchor;
        }
    }

    /// Topmost node under a world point, if any.
    pub fn node_at(&self, point: Point, tolerance: f64) -> Option<&Node> {
        self.nodes
            .iter()
            .rev()
            .find(|n| geometry::hit_test(n, point, tolerance))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, DiagramError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a diagram from JSON, rejecting structurally invalid
    /// documents and clamping out-of-range node fields.
    pub fn from_json(json: &str) -> Result<Self, DiagramError> {
        let mut diagram: Diagram = serde_json::from_str(json)?;
        diagram.validate()?;
        for node in &mut diagram.nodes {
            let size = node.size;
            node.set_size(size);
            node.stroke_width = node.stroke_width.max(0.0);
        }
        Ok(diagram)
    }

    fn validate(&self) -> Result<(), DiagramError> {
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id) {
                return Err(DiagramError::DuplicateId(node.id));
            }
        }
        for (i, edge) in self.edges.iter().enumerate() {
            if !ids.insert(edge.id) {
                return Err(DiagramError::DuplicateId(edge.id));
            }
            if edge.source == edge.target {
                return Err(DiagramError::SelfLoop(edge.id));
            }
            for endpoint in [edge.source, edge.target] {
                if self.node(endpoint).is_none() {
                    return Err(DiagramError::DanglingEdge {
                        edge: edge.id,
                        node: endpoint,
                    });
                }
            }
            if self.edges[..i]
                .iter()
                .any(|other| other.connects(edge.source, edge.target))
            {
                return Err(DiagramError::DuplicateEdge {
                    a: edge.source,
                    b: edge.target,
                });
            }
        }
        Ok(())
    }
}

/// The single source of truth for the editor.
///
/// Owns the diagram plus all transient interaction state (selection,
/// viewport, tool, in-progress selection box) and the undo history.
/// Every mutation goes through a method here; invalid requests are
/// silent no-ops rather than errors, since they routinely arise from
/// stale pointer input.
#[derive(Debug, Clone, Default)]
pub struct DiagramStore {
    pub diagram: Diagram,
    pub viewport: Viewport,
    pub tool: ToolMode,
    pub selection: Selection,
    pub selection_box: Option<SelectionBox>,
    history: History,
}

impl DiagramStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document, with empty history.
    pub fn with_diagram(diagram: Diagram) -> Self {
        Self {
            diagram,
            ..Self::default()
        }
    }

    /// Record the current diagram and viewport as an undo point.
    ///
    /// Mutating operations call this themselves; gesture drivers call
    /// it once on pointer release after a run of uncommitted updates.
    pub fn commit(&mut self) {
        self.history.commit(Snapshot {
            diagram: self.diagram.clone(),
            viewport: self.viewport,
        });
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Restore the previous snapshot, if any.
    pub fn undo(&mut self) {
        if let Some(snapshot) = self.history.undo() {
            self.apply_snapshot(snapshot);
        }
    }

    /// Restore the next snapshot, if any.
    pub fn redo(&mut self) {
        if let Some(snapshot) = self.history.redo() {
            self.apply_snapshot(snapshot);
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.diagram = snapshot.diagram;
        self.viewport = snapshot.viewport;
        self.selection.clear();
        self.selection_box = None;
        self.drop_stale_connection();
    }

    /// If the pending connection source no longer exists, forget it
    /// but keep the connect tool active.
    fn drop_stale_connection(&mut self) {
        if let ToolMode::Connect { source: Some(id) } = self.tool {
            if self.diagram.node(id).is_none() {
                self.tool = ToolMode::Connect { source: None };
            }
        }
    }

    /// Add a node with its kind's defaults, select it exclusively,
    /// and commit.
    pub fn add_node(&mut self, kind: NodeKind, position: Point) -> NodeId {
        let node = Node::new(kind, position);
        let id = node.id;
        self.diagram.nodes.push(node);
        self.selection.select_node(id);
        self.commit();
        id
    }

    /// Add a borderless text node. Same flow as [`Self::add_node`].
    pub fn add_text_node(&mut self, position: Point) -> NodeId {
        self.add_node(NodeKind::Text, position)
    }

    /// Merge a patch into a node without committing history or
    /// refreshing edge anchors.
    ///
    /// Drags call this per pointer move; the gesture driver calls
    /// [`Self::refresh_edges`] to settle anchors and [`Self::commit`]
    /// once on release. Unknown ids are ignored.
    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) {
        let Some(node) = self.diagram.node_mut(id) else {
            return;
        };
        node.apply(patch);
    }

    /// Recompute anchors of all edges touching the node.
    pub fn refresh_edges(&mut self, id: NodeId) {
        self.diagram.refresh_edges_of(id);
    }

    /// Delete a node and every edge attached to it, then commit.
    /// Unknown ids are ignored.
    pub fn delete_node(&mut self, id: NodeId) {
        if !self.diagram.remove_node(id) {
            return;
        }
        self.selection.prune(&self.diagram);
        self.drop_stale_connection();
        self.commit();
    }

    /// Click-selection for nodes.
    ///
    /// With `multi` the node toggles in and out of the selection.
    /// Without it, clicking the only selected node deselects it, and
    /// anything else becomes the sole selection. Edge selection is
    /// always displaced. Never commits.
    pub fn select_node(&mut self, id: NodeId, multi: bool) {
        if self.diagram.node(id).is_none() {
            return;
        }
        if multi {
            self.selection.toggle_node(id);
        } else if self.selection.is_sole_node(id) {
            self.selection.clear();
        } else {
            self.selection.select_node(id);
        }
    }

    /// Click-selection for edges, mirroring [`Self::select_node`].
    pub fn select_edge(&mut self, id: EdgeId, multi: bool) {
        if self.diagram.edge(id).is_none() {
            return;
        }
        if multi {
            self.selection.toggle_edge(id);
        } else if self.selection.is_sole_edge(id) {
            self.selection.clear();
        } else {
            self.selection.select_edge(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Delete every selected element in one step with one commit.
    /// Edges attached to deleted nodes go too. Empty selection is a
    /// no-op without a commit.
    pub fn delete_selected(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let edges: Vec<EdgeId> = self.selection.edges().iter().copied().collect();
        let nodes: Vec<NodeId> = self.selection.nodes().iter().copied().collect();
        for id in edges {
            self.diagram.remove_edge(id);
        }
        for id in nodes {
            self.diagram.remove_node(id);
        }
        self.selection.clear();
        self.drop_stale_connection();
        self.commit();
    }

    /// Clone the selected nodes, and the edges running between them,
    /// slightly offset from the originals. The copies become the new
    /// selection. Returns the ids of the new nodes.
    pub fn duplicate_selected(&mut self) -> Vec<NodeId> {
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
        let mut copies: Vec<Node> = Vec::new();
        for node in &self.diagram.nodes {
            if !self.selection.is_node_selected(node.id) {
                continue;
            }
            let mut copy = node.clone();
            copy.id = Uuid::new_v4();
            copy.position += DUPLICATE_OFFSET;
            mapping.insert(node.id, copy.id);
            copies.push(copy);
        }
        if copies.is_empty() {
            return Vec::new();
        }
        let mut edge_copies: Vec<Edge> = Vec::new();
        for edge in &self.diagram.edges {
            // Only edges running between two selected nodes are copied.
            let (Some(&source), Some(&target)) =
                (mapping.get(&edge.source), mapping.get(&edge.target))
            else {
                continue;
            };
            let (Some(source_node), Some(target_node)) = (
                copies.iter().find(|n| n.id == source),
                copies.iter().find(|n| n.id == target),
            ) else {
                continue;
            };
            let (source_anchor, target_anchor) = geometry::edge_anchors(source_node, target_node);
            edge_copies.push(Edge::new(source, target, source_anchor, target_anchor));
        }
        let ids: Vec<NodeId> = copies.iter().map(|n| n.id).collect();
        self.diagram.nodes.extend(copies);
        self.diagram.edges.extend(edge_copies);
        self.selection.set_nodes(ids.iter().copied());
        self.commit();
        ids
    }

    /// Connect two nodes with a new edge and commit.
    ///
    /// Returns `None` without committing when the edge would be a
    /// self-loop, a duplicate of an existing connection, or reference
    /// a missing node. On success the active tool reverts to select.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> Option<EdgeId> {
        if source == target {
            log::debug!("add_edge: rejecting self-loop on {source}");
            return None;
        }
        if self.diagram.has_edge_between(source, target) {
            log::debug!("add_edge: {source} and {target} already connected");
            return None;
        }
        let (Some(source_node), Some(target_node)) =
            (self.diagram.node(source), self.diagram.node(target))
        else {
            log::debug!("add_edge: missing endpoint");
            return None;
        };
        let (source_anchor, target_anchor) = geometry::edge_anchors(source_node, target_node);
        let edge = Edge::new(source, target, source_anchor, target_anchor);
        let id = edge.id;
        self.diagram.edges.push(edge);
        self.tool = ToolMode::Select;
        self.commit();
        Some(id)
    }

    /// First click of the two-click connection gesture. Ignored when
    /// the node does not exist.
    pub fn start_connection(&mut self, id: NodeId) {
        if self.diagram.node(id).is_none() {
            return;
        }
        self.tool = ToolMode::Connect { source: Some(id) };
    }

    /// Second click of the connection gesture.
    ///
    /// Clicking the source node again abandons the pending connection
    /// but stays in the connect tool. A rejected target (duplicate)
    /// keeps the pending source so the user can pick another node.
    pub fn end_connection(&mut self, id: NodeId) {
        let ToolMode::Connect {
            source: Some(source),
        } = self.tool
        else {
            return;
        };
        if source == id {
            self.tool = ToolMode::Connect { source: None };
            return;
        }
        self.add_edge(source, id);
    }

    pub fn set_tool(&mut self, tool: ToolMode) {
        self.tool = tool;
    }

    /// Escape: abandon any pending connection and in-progress
    /// selection box.
    pub fn cancel(&mut self) {
        if matches!(self.tool, ToolMode::Connect { .. }) {
            self.tool = ToolMode::Select;
        }
        self.selection_box = None;
    }

    /// Zoom around a screen-space pivot. Not an undoable action.
    pub fn zoom(&mut self, delta: f64, pivot: Point) {
        self.viewport.zoom(delta, pivot);
    }

    /// Pan by a screen-space delta. Not an undoable action.
    pub fn pan(&mut self, delta: Vec2) {
        self.viewport.pan(delta);
    }

    /// Begin a selection box at a world point.
    pub fn start_selection_box(&mut self, point: Point) {
        self.selection_box = Some(SelectionBox::new(point));
    }

    /// Track the pointer during a selection-box drag.
    pub fn update_selection_box(&mut self, point: Point) {
        if let Some(selection_box) = &mut self.selection_box {
            selection_box.end = point;
        }
    }

    /// Finish the selection box: every node whose bounds overlap the
    /// box (touching counts) becomes the new selection, replacing the
    /// old one. Never commits.
    pub fn end_selection_box(&mut self) {
        let Some(selection_box) = self.selection_box.take() else {
            return;
        };
        let rect = selection_box.rect();
        let hits: Vec<NodeId> = self
            .diagram
            .nodes
            .iter()
            .filter(|n| geometry::rects_overlap(n.bounds(), rect))
            .map(|n| n.id)
            .collect();
        self.selection.set_nodes(hits);
    }

    /// Empty the document, reset the viewport, and commit.
    pub fn clear(&mut self) {
        self.diagram = Diagram::new();
        self.viewport = Viewport::default();
        self.selection.clear();
        self.selection_box = None;
        self.drop_stale_connection();
        self.commit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::MIN_NODE_SIZE;
    use kurbo::Size;

    /// A rectangle at the origin and an ellipse to its right, far
    /// enough apart that the connecting ray is horizontal. The second
    /// `add_node` leaves the ellipse sole-selected, so tests that need
    /// a neutral selection must clear it.
    fn store_with_two_nodes() -> (DiagramStore, NodeId, NodeId) {
        let mut store = DiagramStore::new();
        let a = store.add_node(NodeKind::Rectangle, Point::new(0.0, 0.0));
        let b = store.add_node(NodeKind::Ellipse, Point::new(200.0, 0.0));
        (store, a, b)
    }

    #[test]
    fn test_add_node_selects_and_commits() {
        let mut store = DiagramStore::new();
        let id = store.add_node(NodeKind::Rectangle, Point::new(10.0, 20.0));
        assert_eq!(store.diagram.nodes.len(), 1);
        assert_eq!(store.history_len(), 1);
        assert!(store.selection.is_sole_node(id));

        let node = store.diagram.node(id).unwrap();
        assert_eq!(node.kind, NodeKind::Rectangle);
        assert!((node.size.width - 160.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_text_node_style() {
        let mut store = DiagramStore::new();
        let id = store.add_text_node(Point::ZERO);
        let node = store.diagram.node(id).unwrap();
        assert_eq!(node.kind, NodeKind::Text);
        assert_eq!(node.fill, crate::node::SerializableColor::transparent());
        assert!(node.stroke_width.abs() < f64::EPSILON);
        assert_eq!(store.history_len(), 1);
    }

    #[test]
    fn test_update_node_skips_commit() {
        let mut store = DiagramStore::new();
        let id = store.add_node(NodeKind::Rectangle, Point::ZERO);
        store.update_node(id, NodePatch::move_to(Point::new(300.0, 300.0)));

        let node = store.diagram.node(id).unwrap();
        assert!((node.position.x - 300.0).abs() < f64::EPSILON);
        assert_eq!(store.history_len(), 1);

        // Unknown ids are ignored.
        store.update_node(Uuid::new_v4(), NodePatch::move_to(Point::ZERO));
        assert_eq!(store.diagram.nodes.len(), 1);
    }

    #[test]
    fn test_update_node_enforces_size_floor() {
        let mut store = DiagramStore::new();
        let id = store.add_node(NodeKind::Rectangle, Point::ZERO);
        store.update_node(id, NodePatch::resize(Size::new(5.0, 5.0)));

        let node = store.diagram.node(id).unwrap();
        assert!((node.size.width - MIN_NODE_SIZE).abs() < f64::EPSILON);
        assert!((node.size.height - MIN_NODE_SIZE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_edge_lifecycle_with_undo_redo() {
        let (mut store, a, b) = store_with_two_nodes();
        assert_eq!(store.history_len(), 2);

        store.start_connection(a);
        store.end_connection(b);
        assert_eq!(store.history_len(), 3);
        assert_eq!(store.diagram.edges.len(), 1);
        assert_eq!(store.tool, ToolMode::Select);

        // Horizontal ray: out the rectangle's right side, into the
        // ellipse's left extreme.
        let edge = &store.diagram.edges[0];
        assert!((edge.source_anchor.x - 160.0).abs() < 1e-9);
        assert!((edge.source_anchor.y - 50.0).abs() < 1e-9);
        assert!((edge.target_anchor.x - 200.0).abs() < 1e-9);
        assert!((edge.target_anchor.y - 50.0).abs() < 1e-9);

        store.undo();
        assert_eq!(store.diagram.nodes.len(), 2);
        assert!(store.diagram.edges.is_empty());
        assert!(store.selection.is_empty());

        store.redo();
        assert_eq!(store.diagram.edges.len(), 1);
        assert!(store.selection.is_empty());

        store.delete_node(a);
        assert_eq!(store.diagram.nodes.len(), 1);
        assert!(store.diagram.edges.is_empty());
    }

    #[test]
    fn test_refresh_edges_recomputes_both_anchors() {
        let (mut store, a, b) = store_with_two_nodes();
        store.add_edge(a, b);
        let before = store.diagram.edges[0].source_anchor;

        store.update_node(a, NodePatch::move_to(Point::new(0.0, 200.0)));
        // Anchors stay stale until the gesture refreshes them.
        assert_eq!(store.diagram.edges[0].source_anchor, before);

        store.refresh_edges(a);
        let (expected_source, expected_target) = geometry::edge_anchors(
            store.diagram.node(a).unwrap(),
            store.diagram.node(b).unwrap(),
        );
        let edge = &store.diagram.edges[0];
        assert!((edge.source_anchor.x - expected_source.x).abs() < 1e-9);
        assert!((edge.source_anchor.y - expected_source.y).abs() < 1e-9);
        assert!((edge.target_anchor.x - expected_target.x).abs() < 1e-9);
        assert!((edge.target_anchor.y - expected_target.y).abs() < 1e-9);
        assert_ne!(edge.source_anchor, before);
    }

    #[test]
    fn test_delete_node_cascades_edges() {
        let mut store = DiagramStore::new();
        let a = store.add_node(NodeKind::Rectangle, Point::new(0.0, 0.0));
        let b = store.add_node(NodeKind::Rectangle, Point::new(300.0, 0.0));
        let c = store.add_node(NodeKind::Rectangle, Point::new(0.0, 300.0));
        store.add_edge(a, b);
        store.add_edge(b, c);
        store.add_edge(a, c);
        assert_eq!(store.diagram.edges.len(), 3);

        store.delete_node(b);
        assert_eq!(store.diagram.nodes.len(), 2);
        assert_eq!(store.diagram.edges.len(), 1);
        assert!(store.diagram.edges[0].connects(a, c));
        assert_eq!(store.diagram.edges_of(b).count(), 0);
    }

    #[test]
    fn test_delete_unknown_node_is_noop() {
        let (mut store, _, _) = store_with_two_nodes();
        let len = store.history_len();
        store.delete_node(Uuid::new_v4());
        assert_eq!(store.diagram.nodes.len(), 2);
        assert_eq!(store.history_len(), len);
    }

    #[test]
    fn test_select_node_rules() {
        let (mut store, a, b) = store_with_two_nodes();
        let len = store.history_len();

        store.select_node(a, false);
        assert!(store.selection.is_sole_node(a));

        store.select_node(b, true);
        assert!(store.selection.is_node_selected(a));
        assert!(store.selection.is_node_selected(b));

        store.select_node(a, true);
        assert!(!store.selection.is_node_selected(a));
        assert!(store.selection.is_node_selected(b));

        // Plain click on the only selected node deselects it.
        store.select_node(b, false);
        assert!(store.selection.is_empty());

        store.select_node(Uuid::new_v4(), false);
        assert!(store.selection.is_empty());

        // Selection changes never commit.
        assert_eq!(store.history_len(), len);
    }

    #[test]
    fn test_select_edge_rules() {
        let (mut store, a, b) = store_with_two_nodes();
        let edge = store.add_edge(a, b).unwrap();

        store.select_node(a, false);
        store.select_edge(edge, false);
        assert!(store.selection.is_edge_selected(edge));
        assert!(!store.selection.is_node_selected(a));

        store.select_edge(edge, false);
        assert!(store.selection.is_empty());

        store.select_edge(edge, true);
        assert!(store.selection.is_edge_selected(edge));
        store.select_node(a, false);
        assert!(!store.selection.is_edge_selected(edge));
    }

    #[test]
    fn test_delete_selected_commits_once() {
        let (mut store, a, b) = store_with_two_nodes();
        store.add_edge(a, b);
        let len = store.history_len();

        store.select_node(a, false);
        store.select_node(b, true);
        store.delete_selected();

        assert!(store.diagram.is_empty());
        assert!(store.selection.is_empty());
        assert_eq!(store.history_len(), len + 1);
    }

    #[test]
    fn test_delete_selected_empty_is_noop() {
        let (mut store, _, _) = store_with_two_nodes();
        // The helper's last `add_node` left its node selected.
        assert!(!store.selection.is_empty());
        store.clear_selection();

        let len = store.history_len();
        store.delete_selected();
        assert_eq!(store.diagram.nodes.len(), 2);
        assert_eq!(store.history_len(), len);
    }

    #[test]
    fn test_delete_selected_edge_leaves_nodes() {
        let (mut store, a, b) = store_with_two_nodes();
        let edge = store.add_edge(a, b).unwrap();
        store.select_edge(edge, false);
        store.delete_selected();
        assert_eq!(store.diagram.nodes.len(), 2);
        assert!(store.diagram.edges.is_empty());
    }

    #[test]
    fn test_add_edge_rejects_invalid() {
        let (mut store, a, b) = store_with_two_nodes();
        let len = store.history_len();

        assert!(store.add_edge(a, a).is_none());
        assert!(store.add_edge(a, Uuid::new_v4()).is_none());
        assert!(store.add_edge(a, b).is_some());
        assert!(store.add_edge(b, a).is_none());

        assert_eq!(store.diagram.edges.len(), 1);
        // Only the successful add committed.
        assert_eq!(store.history_len(), len + 1);
    }

    #[test]
    fn test_connection_protocol() {
        let (mut store, a, b) = store_with_two_nodes();

        store.set_tool(ToolMode::Connect { source: None });
        store.end_connection(b);
        assert_eq!(store.tool, ToolMode::Connect { source: None });

        store.start_connection(a);
        assert!(store.tool.is_connecting());
        // Clicking the source again abandons the pending connection.
        store.end_connection(a);
        assert_eq!(store.tool, ToolMode::Connect { source: None });
        assert!(store.diagram.edges.is_empty());

        store.start_connection(a);
        store.end_connection(b);
        assert_eq!(store.diagram.edges.len(), 1);
        assert_eq!(store.tool, ToolMode::Select);

        // A rejected target keeps the pending source.
        store.start_connection(a);
        store.end_connection(b);
        assert_eq!(store.diagram.edges.len(), 1);
        assert_eq!(store.tool, ToolMode::Connect { source: Some(a) });

        store.start_connection(Uuid::new_v4());
        assert_eq!(store.tool, ToolMode::Connect { source: Some(a) });
    }

    #[test]
    fn test_cancel_clears_transient_state() {
        let (mut store, a, _) = store_with_two_nodes();
        store.start_connection(a);
        store.start_selection_box(Point::ZERO);

        store.cancel();
        assert_eq!(store.tool, ToolMode::Select);
        assert!(store.selection_box.is_none());

        // Cancel does not leave a placement tool.
        store.set_tool(ToolMode::Place(NodeKind::Diamond));
        store.cancel();
        assert_eq!(store.tool, ToolMode::Place(NodeKind::Diamond));
    }

    #[test]
    fn test_delete_pending_source_resets_connection() {
        let (mut store, a, b) = store_with_two_nodes();
        store.start_connection(a);
        store.delete_node(a);
        assert_eq!(store.tool, ToolMode::Connect { source: None });

        // Undo that removes the source has the same effect.
        store.undo();
        store.start_connection(b);
        store.undo();
        assert_eq!(store.tool, ToolMode::Connect { source: None });
    }

    #[test]
    fn test_zoom_pan_not_historized() {
        let mut store = DiagramStore::new();
        store.add_node(NodeKind::Rectangle, Point::ZERO);
        store.pan(Vec2::new(100.0, 0.0));
        store.zoom(0.5, Point::ZERO);
        assert_eq!(store.history_len(), 1);
        assert!((store.viewport.scale - 1.5).abs() < 1e-9);

        // The next commit captures the viewport; undo restores the
        // one recorded with the earlier snapshot.
        store.add_node(NodeKind::Rectangle, Point::new(300.0, 0.0));
        store.undo();
        assert!((store.viewport.scale - 1.0).abs() < f64::EPSILON);
        assert!(store.viewport.offset.x.abs() < f64::EPSILON);
    }

    #[test]
    fn test_selection_box_selects_overlapping() {
        let mut store = DiagramStore::new();
        let small = store.add_node(NodeKind::Rectangle, Point::new(10.0, 10.0));
        store.update_node(small, NodePatch::resize(Size::new(20.0, 20.0)));
        let far = store.add_node(NodeKind::Rectangle, Point::new(100.0, 100.0));
        let partial = store.add_node(NodeKind::Rectangle, Point::new(40.0, 40.0));
        store.update_node(partial, NodePatch::resize(Size::new(20.0, 20.0)));
        let len = store.history_len();

        store.start_selection_box(Point::new(0.0, 0.0));
        store.update_selection_box(Point::new(50.0, 50.0));
        store.end_selection_box();

        assert!(store.selection.is_node_selected(small));
        // Partial overlap is enough.
        assert!(store.selection.is_node_selected(partial));
        assert!(!store.selection.is_node_selected(far));
        assert!(store.selection_box.is_none());
        assert_eq!(store.history_len(), len);
    }

    #[test]
    fn test_selection_box_replaces_selection() {
        let mut store = DiagramStore::new();
        let near = store.add_node(NodeKind::Rectangle, Point::new(0.0, 0.0));
        let far = store.add_node(NodeKind::Rectangle, Point::new(1000.0, 1000.0));

        store.select_node(far, false);
        store.start_selection_box(Point::new(-10.0, -10.0));
        store.update_selection_box(Point::new(50.0, 50.0));
        store.end_selection_box();
        assert!(store.selection.is_node_selected(near));
        assert!(!store.selection.is_node_selected(far));

        // An empty sweep clears the selection.
        store.start_selection_box(Point::new(-500.0, -500.0));
        store.update_selection_box(Point::new(-400.0, -400.0));
        store.end_selection_box();
        assert!(store.selection.is_empty());
    }

    #[test]
    fn test_undo_redo_bounds() {
        let mut store = DiagramStore::new();
        store.undo();
        store.redo();
        assert!(store.diagram.is_empty());

        store.add_node(NodeKind::Rectangle, Point::ZERO);
        // The first commit is the undo floor.
        store.undo();
        assert_eq!(store.diagram.nodes.len(), 1);
        store.redo();
        assert_eq!(store.diagram.nodes.len(), 1);
    }

    #[test]
    fn test_commit_truncates_redo_branch() {
        let mut store = DiagramStore::new();
        let a = store.add_node(NodeKind::Rectangle, Point::ZERO);
        store.add_node(NodeKind::Rectangle, Point::new(300.0, 0.0));

        store.undo();
        assert_eq!(store.diagram.nodes.len(), 1);

        store.add_node(NodeKind::Diamond, Point::new(600.0, 0.0));
        assert!(!store.can_redo());
        store.redo();
        assert_eq!(store.diagram.nodes.len(), 2);

        store.undo();
        assert_eq!(store.diagram.nodes.len(), 1);
        assert_eq!(store.diagram.nodes[0].id(), a);
    }

    #[test]
    fn test_clear_resets_everything() {
        let (mut store, a, _) = store_with_two_nodes();
        store.start_connection(a);
        store.pan(Vec2::new(50.0, 50.0));
        store.start_selection_box(Point::ZERO);

        store.clear();
        assert!(store.diagram.is_empty());
        assert!(store.selection.is_empty());
        assert!(store.selection_box.is_none());
        assert_eq!(store.viewport, Viewport::default());
        assert_eq!(store.tool, ToolMode::Connect { source: None });

        store.undo();
        assert_eq!(store.diagram.nodes.len(), 2);
    }

    #[test]
    fn test_duplicate_selected_copies_structure() {
        let (mut store, a, b) = store_with_two_nodes();
        store.add_edge(a, b);
        store.select_node(a, false);
        store.select_node(b, true);

        let copies = store.duplicate_selected();
        assert_eq!(copies.len(), 2);
        assert_eq!(store.diagram.nodes.len(), 4);
        assert_eq!(store.diagram.edges.len(), 2);

        // Copies are offset and become the selection.
        let copy_a = store.diagram.node(copies[0]).unwrap();
        assert!((copy_a.position.x - 20.0).abs() < f64::EPSILON);
        assert!((copy_a.position.y - 20.0).abs() < f64::EPSILON);
        assert!(store.selection.is_node_selected(copies[0]));
        assert!(store.selection.is_node_selected(copies[1]));
        assert!(!store.selection.is_node_selected(a));

        // The edge between the originals was copied to the pair, with
        // anchors recomputed for the shifted geometry.
        let new_edge = store
            .diagram
            .edges
            .iter()
            .find(|e| !e.connects(a, b))
            .unwrap();
        assert!(new_edge.connects(copies[0], copies[1]));
        assert!((new_edge.source_anchor.x - 180.0).abs() < 1e-9);
        assert!((new_edge.source_anchor.y - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_nothing_selected() {
        let (mut store, _, _) = store_with_two_nodes();
        store.clear_selection();
        let len = store.history_len();
        let copies = store.duplicate_selected();
        assert!(copies.is_empty());
        assert_eq!(store.diagram.nodes.len(), 2);
        assert_eq!(store.history_len(), len);
    }

    #[test]
    fn test_with_diagram_starts_fresh() {
        let (store, a, b) = store_with_two_nodes();
        let restored = DiagramStore::with_diagram(store.diagram.clone());
        assert_eq!(restored.diagram.nodes.len(), 2);
        assert!(restored.diagram.node(a).is_some());
        assert!(restored.diagram.node(b).is_some());
        assert_eq!(restored.history_len(), 0);
        assert!(restored.selection.is_empty());
        assert_eq!(restored.tool, ToolMode::Select);
    }

    #[test]
    fn test_json_round_trip() {
        let (mut store, a, b) = store_with_two_nodes();
        store.add_edge(a, b);

        let json = store.diagram.to_json().unwrap();
        let parsed = Diagram::from_json(&json).unwrap();
        assert_eq!(parsed, store.diagram);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let (store, a, b) = store_with_two_nodes();

        let mut dangling = store.diagram.clone();
        dangling
            .edges
            .push(Edge::new(a, Uuid::new_v4(), Point::ZERO, Point::ZERO));
        let json = dangling.to_json().unwrap();
        assert!(matches!(
            Diagram::from_json(&json),
            Err(DiagramError::DanglingEdge { .. })
        ));

        let mut looped = store.diagram.clone();
        looped.edges.push(Edge::new(a, a, Point::ZERO, Point::ZERO));
        let json = looped.to_json().unwrap();
        assert!(matches!(
            Diagram::from_json(&json),
            Err(DiagramError::SelfLoop(_))
        ));

        let mut doubled = store.diagram.clone();
        doubled.edges.push(Edge::new(a, b, Point::ZERO, Point::ZERO));
        doubled.edges.push(Edge::new(b, a, Point::ZERO, Point::ZERO));
        let json = doubled.to_json().unwrap();
        assert!(matches!(
            Diagram::from_json(&json),
            Err(DiagramError::DuplicateEdge { .. })
        ));

        let mut shadowed = store.diagram.clone();
        shadowed.nodes[1].id = shadowed.nodes[0].id;
        let json = shadowed.to_json().unwrap();
        assert!(matches!(
            Diagram::from_json(&json),
            Err(DiagramError::DuplicateId(_))
        ));

        assert!(matches!(
            Diagram::from_json("not json"),
            Err(DiagramError::Parse(_))
        ));
    }

    #[test]
    fn test_from_json_clamps_fields() {
        let (mut store, a, _) = store_with_two_nodes();
        {
            let node = store.diagram.node_mut(a).unwrap();
            node.size = Size::new(5.0, 5.0);
            node.stroke_width = -2.0;
        }
        let json = store.diagram.to_json().unwrap();
        let parsed = Diagram::from_json(&json).unwrap();
        let node = parsed.node(a).unwrap();
        assert!((node.size.width - MIN_NODE_SIZE).abs() < f64::EPSILON);
        assert!((node.size.height - MIN_NODE_SIZE).abs() < f64::EPSILON);
        assert!(node.stroke_width.abs() < f64::EPSILON);
    }

    #[test]
    fn test_node_at_prefers_topmost() {
        let mut store = DiagramStore::new();
        let bottom = store.add_node(NodeKind::Rectangle, Point::ZERO);
        let top = store.add_node(NodeKind::Rectangle, Point::new(50.0, 25.0));

        let hit = store.diagram.node_at(Point::new(60.0, 40.0), 0.0);
        assert_eq!(hit.map(|n| n.id()), Some(top));

        let hit = store.diagram.node_at(Point::new(10.0, 10.0), 0.0);
        assert_eq!(hit.map(|n| n.id()), Some(bottom));

        assert!(store.diagram.node_at(Point::new(1000.0, 0.0), 0.0).is_none());
    }
}
