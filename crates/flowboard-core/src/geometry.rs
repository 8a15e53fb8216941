//! Boundary and hit-test geometry for nodes.
//!
//! Pure functions over node outlines. Every boundary routine degrades
//! to the node center instead of failing when the input ray or outline
//! is degenerate.

use kurbo::{Point, Rect, Vec2};

use crate::node::{Node, NodeKind};

/// Determinant threshold below which two lines count as parallel.
const PARALLEL_EPSILON: f64 = 1e-10;

/// Point on the node's outline where a ray from its center toward
/// `external` exits the shape.
///
/// Returns the center itself when `external` coincides with it.
pub fn anchor_point(node: &Node, external: Point) -> Point {
    let center = node.center();
    let dir = external - center;
    if dir.hypot2() < f64::EPSILON {
        return center;
    }
    let half_w = node.size.width / 2.0;
    let half_h = node.size.height / 2.0;
    match node.kind {
        NodeKind::Rectangle | NodeKind::Text => rect_anchor(center, half_w, half_h, dir),
        NodeKind::Ellipse => ellipse_anchor(center, half_w, half_h, dir),
        NodeKind::Diamond => diamond_anchor(center, half_w, half_h, dir),
    }
}

/// Boundary anchors for both endpoints of an edge, each aimed at the
/// other node's center. Always computed as a pair so the cached values
/// stay consistent.
pub fn edge_anchors(source: &Node, target: &Node) -> (Point, Point) {
    (
        anchor_point(source, target.center()),
        anchor_point(target, source.center()),
    )
}

fn rect_anchor(center: Point, half_w: f64, half_h: f64, dir: Vec2) -> Point {
    // Compare the ray slope against the corner diagonal to pick the
    // exit side, then scale the direction to reach it. A vertical ray
    // (dir.x == 0) always lands in the top/bottom branch.
    let t = if dir.y.abs() * half_w <= dir.x.abs() * half_h {
        half_w / dir.x.abs()
    } else {
        half_h / dir.y.abs()
    };
    Point::new(center.x + dir.x * t, center.y + dir.y * t)
}

fn ellipse_anchor(center: Point, half_w: f64, half_h: f64, dir: Vec2) -> Point {
    // Parametric approximation: the ray angle is used directly as the
    // ellipse parameter, which coincides with the true intersection
    // only for circles. Non-circular ellipses attach slightly off the
    // ray but always on the boundary.
    let theta = dir.y.atan2(dir.x);
    Point::new(
        center.x + half_w * theta.cos(),
        center.y + half_h * theta.sin(),
    )
}

fn diamond_anchor(center: Point, half_w: f64, half_h: f64, dir: Vec2) -> Point {
    let top = Point::new(center.x, center.y - half_h);
    let right = Point::new(center.x + half_w, center.y);
    let bottom = Point::new(center.x, center.y + half_h);
    let left = Point::new(center.x - half_w, center.y);

    // The ray direction selects one of the four diamond sides.
    let (seg_a, seg_b) = if dir.x >= 0.0 {
        if dir.y < 0.0 { (top, right) } else { (right, bottom) }
    } else if dir.y < 0.0 {
        (left, top)
    } else {
        (bottom, left)
    };

    line_intersection(center, center + dir, seg_a, seg_b).unwrap_or(center)
}

/// Intersection of the infinite lines through (`p1`, `p2`) and
/// (`p3`, `p4`), or `None` when they are parallel or degenerate.
pub fn line_intersection(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<Point> {
    let d = (p1.x - p2.x) * (p3.y - p4.y) - (p1.y - p2.y) * (p3.x - p4.x);
    if d.abs() < PARALLEL_EPSILON {
        return None;
    }
    let a = p1.x * p2.y - p1.y * p2.x;
    let b = p3.x * p4.y - p3.y * p4.x;
    Some(Point::new(
        (a * (p3.x - p4.x) - (p1.x - p2.x) * b) / d,
        (a * (p3.y - p4.y) - (p1.y - p2.y) * b) / d,
    ))
}

/// Whether a world point lies on the node, within `tolerance`.
///
/// Ellipses and diamonds test their actual outline, not just the
/// bounding box.
pub fn hit_test(node: &Node, point: Point, tolerance: f64) -> bool {
    if !node.bounds().inflate(tolerance, tolerance).contains(point) {
        return false;
    }
    let center = node.center();
    let half_w = node.size.width / 2.0 + tolerance;
    let half_h = node.size.height / 2.0 + tolerance;
    match node.kind {
        NodeKind::Rectangle | NodeKind::Text => true,
        NodeKind::Ellipse => {
            let nx = (point.x - center.x) / half_w;
            let ny = (point.y - center.y) / half_h;
            nx * nx + ny * ny <= 1.0
        }
        NodeKind::Diamond => {
            (point.x - center.x).abs() / half_w + (point.y - center.y).abs() / half_h <= 1.0
        }
    }
}

/// Whether two rectangles overlap, counting shared edges as overlap.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}
