//! Node records for the diagram.

use kurbo::{Point, Rect, Size};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for nodes.
pub type NodeId = Uuid;

/// Minimum node width/height in world units, enforced on every mutation.
pub const MIN_NODE_SIZE: f64 = 20.0;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// The closed set of node kinds the editor can place.
///
/// Kind-specific behavior (boundary intersection, placement defaults)
/// dispatches on this variant; there is no open-ended shape registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Rectangle,
    Ellipse,
    Diamond,
    Text,
}

impl NodeKind {
    /// Size given to newly placed nodes of this kind.
    pub fn default_size(&self) -> Size {
        match self {
            NodeKind::Rectangle | NodeKind::Ellipse => Size::new(160.0, 100.0),
            NodeKind::Diamond => Size::new(140.0, 140.0),
            NodeKind::Text => Size::new(120.0, 40.0),
        }
    }

    /// Fill given to newly placed nodes. Text renders without a box.
    pub fn default_fill(&self) -> SerializableColor {
        match self {
            NodeKind::Text => SerializableColor::transparent(),
            _ => SerializableColor::white(),
        }
    }

    /// Stroke given to newly placed nodes.
    pub fn default_stroke(&self) -> SerializableColor {
        match self {
            NodeKind::Text => SerializableColor::transparent(),
            _ => SerializableColor::black(),
        }
    }

    /// Stroke width given to newly placed nodes.
    pub fn default_stroke_width(&self) -> f64 {
        match self {
            NodeKind::Text => 0.0,
            _ => 2.0,
        }
    }
}

/// A placed shape or text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) id: NodeId,
    /// What the node renders as.
    pub kind: NodeKind,
    /// Top-left corner in world coordinates.
    pub position: Point,
    /// Width and height, both at least [`MIN_NODE_SIZE`].
    pub size: Size,
    /// Text content (label for shapes, body for text nodes).
    pub text: String,
    /// Fill color.
    pub fill: SerializableColor,
    /// Stroke color.
    pub stroke: SerializableColor,
    /// Stroke width (never negative).
    pub stroke_width: f64,
}

impl Node {
    /// Create a node at a world position with its kind's defaults.
    pub fn new(kind: NodeKind, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            size: kind.default_size(),
            text: String::new(),
            fill: kind.default_fill(),
            stroke: kind.default_stroke(),
            stroke_width: kind.default_stroke_width(),
        }
    }

    /// Get the unique identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Center of the node in world coordinates.
    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.size.width / 2.0,
            self.position.y + self.size.height / 2.0,
        )
    }

    /// Axis-aligned bounding box in world coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Set the size, clamping both dimensions to the minimum floor.
    pub fn set_size(&mut self, size: Size) {
        self.size = Size::new(
            size.width.max(MIN_NODE_SIZE),
            size.height.max(MIN_NODE_SIZE),
        );
    }

    /// Merge the populated fields of a patch into this node.
    pub fn apply(&mut self, patch: NodePatch) {
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(size) = patch.size {
            self.set_size(size);
        }
        if let Some(text) = patch.text {
            self.text = text;
        }
        if let Some(fill) = patch.fill {
            self.fill = fill;
        }
        if let Some(stroke) = patch.stroke {
            self.stroke = stroke;
        }
        if let Some(stroke_width) = patch.stroke_width {
            self.stroke_width = stroke_width.max(0.0);
        }
    }
}

/// Partial update for a node; unset fields are left untouched.
///
/// Continuous gestures build one of these per pointer move, so the
/// store can merge without knowing which property is being edited.
#[derive(Debug, Clone, Default)]
pub struct NodePatch {
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub text: Option<String>,
    pub fill: Option<SerializableColor>,
    pub stroke: Option<SerializableColor>,
    pub stroke_width: Option<f64>,
}

impl NodePatch {
    /// Patch that only moves the node.
    pub fn move_to(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Patch that only resizes the node.
    pub fn resize(size: Size) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }
}
