//! Tool modes for the editor.

use serde::{Deserialize, Serialize};

use crate::node::{NodeId, NodeKind};

/// The active tool, including any in-progress connection.
///
/// A pending connection source only exists inside the `Connect`
/// variant, so switching tools can never leave one behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolMode {
    /// Click to select, drag to box-select.
    #[default]
    Select,
    /// Click to place a node of the given kind.
    Place(NodeKind),
    /// Two-click edge creation; `source` holds the first click.
    Connect { source: Option<NodeId> },
}

impl ToolMode {
    /// Map a single-character hotkey to a tool.
    pub fn from_hotkey(key: &str) -> Option<Self> {
        match key {
            "v" => Some(ToolMode::Select),
            "r" => Some(ToolMode::Place(NodeKind::Rectangle)),
            "e" => Some(ToolMode::Place(NodeKind::Ellipse)),
            "d" => Some(ToolMode::Place(NodeKind::Diamond)),
            "t" => Some(ToolMode::Place(NodeKind::Text)),
            "l" => Some(ToolMode::Connect { source: None }),
            _ => None,
        }
    }

    /// Whether a connection has been started and awaits its target.
    pub fn is_connecting(&self) -> bool {
        matches!(self, ToolMode::Connect { source: Some(_) })
    }

    /// The pending connection source, if one exists.
    pub fn connection_source(&self) -> Option<NodeId> {
        match self {
            ToolMode::Connect { source } => *source,
            _ => None,
        }
    }
}
