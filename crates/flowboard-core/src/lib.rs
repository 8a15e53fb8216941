//! Flowboard core library.
//!
//! The state and interaction engine for a node-and-edge diagram
//! editor: document model, boundary geometry, viewport transform,
//! bounded undo history, and the store that ties them together.
//! No rendering or platform code lives here; a presentation layer
//! drives the store with translated input events and re-reads its
//! state to draw.

pub mod edge;
pub mod geometry;
pub mod history;
pub mod input;
pub mod node;
pub mod selection;
pub mod store;
pub mod tools;
pub mod viewport;

pub use edge::{Edge, EdgeId};
pub use history::{History, Snapshot, MAX_HISTORY};
pub use input::{classify_drag, key_command, DragGesture, KeyCommand, Modifiers, MouseButton};
pub use node::{Node, NodeId, NodeKind, NodePatch, SerializableColor, MIN_NODE_SIZE};
pub use selection::{Selection, SelectionBox};
pub use store::{Diagram, DiagramError, DiagramStore};
pub use tools::ToolMode;
pub use viewport::{Viewport, MAX_SCALE, MIN_SCALE};
