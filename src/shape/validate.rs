//! Node validation rules.
//!
//! Every rule is a pure function of the node and its two neighbours, so the
//! result never depends on anything else in the shape.

use super::node::{Node, NodeType, Point};

/// Pin an END node to its boundary. The closing node mirrors the opening
/// node's value so the cycle is continuous across the wrap.
pub(crate) fn validate_end(node: &Node, is_last: bool, start_y: f64) -> Node {
    let (x, y) = if is_last {
        (1.0, start_y)
    } else {
        (0.0, node.point.y)
    };

    Node::end(x, y)
}

/// Validate a node that sits between `prev` and `next`.
///
/// Returns `None` when the surrounding order is broken (`prev` lies right of
/// `next`) or the node carries non-finite coordinates. The caller treats this
/// as corrupt shape data.
pub(crate) fn validate_middle(node: &Node, prev: &Node, next: &Node) -> Option<Node> {
    if prev.point.x > next.point.x || !node.is_finite() {
        return None;
    }

    let mut out = *node;
    if out.node_type == NodeType::End {
        out.node_type = NodeType::Point;
    }
    out.point.x = out.point.x.clamp(prev.point.x, next.point.x);

    let left = prev.point.x - out.point.x; // <= 0
    let right = next.point.x - out.point.x; // >= 0

    match out.node_type {
        NodeType::End | NodeType::Point => {
            out.handle1 = Point::ZERO;
            out.handle2 = Point::ZERO;
        }

        NodeType::AutoSmooth => {
            let (h1, h2) = auto_smooth_handles(out.point, prev.point, next.point);
            out.handle1 = h1;
            out.handle2 = h2;
        }

        NodeType::SymmetricSmooth => {
            let limit = left.max(-right);
            out.handle1 = clamp_left(out.handle1, limit);
            out.handle2 = -out.handle1;
        }

        NodeType::Smooth => {
            out.handle1 = clamp_left(out.handle1, left);
            let len1 = out.handle1.length();
            let len2 = out.handle2.length();
            if len1 > 0.0 {
                out.handle2 = -out.handle1 * (len2 / len1);
            }
            out.handle2 = clamp_right(out.handle2, right);
        }

        NodeType::Corner => {
            out.handle1 = clamp_left(out.handle1, left);
            out.handle2 = clamp_right(out.handle2, right);
        }
    }

    Some(out)
}

/// Handles for an AUTO_SMOOTH node.
///
/// Horizontal reach is half the distance to the nearer neighbour. Local
/// extrema get flat handles; elsewhere the handles follow the neighbour-to-
/// neighbour slope, scaled by the ratio of the smaller to the larger value
/// step so the curve never overshoots the nearer neighbour.
pub(crate) fn auto_smooth_handles(point: Point, prev: Point, next: Point) -> (Point, Point) {
    let reach = (point.x - prev.x).min(next.x - point.x) / 2.0;
    let dy_prev = point.y - prev.y;
    let dy_next = next.y - point.y;
    let span = next.x - prev.x;

    if dy_prev * dy_next <= 0.0 || span <= 0.0 {
        return (Point::new(-reach, 0.0), Point::new(reach, 0.0));
    }

    let slope = (next.y - prev.y) / span;
    let (small, large) = if dy_prev.abs() < dy_next.abs() {
        (dy_prev.abs(), dy_next.abs())
    } else {
        (dy_next.abs(), dy_prev.abs())
    };
    let hy = slope * reach * (small / large);

    (Point::new(-reach, -hy), Point::new(reach, hy))
}

/// Keep a left handle inside `[limit, 0]` on the x axis. Overlong handles are
/// shortened along their own direction.
fn clamp_left(handle: Point, limit: f64) -> Point {
    if handle.x > 0.0 {
        return Point::new(0.0, handle.y);
    }
    if handle.x < limit {
        return handle * (limit / handle.x);
    }
    handle
}

/// Mirror of [`clamp_left`] for right handles, `limit >= 0`.
fn clamp_right(handle: Point, limit: f64) -> Point {
    if handle.x < 0.0 {
        return Point::new(0.0, handle.y);
    }
    if handle.x > limit {
        return handle * (limit / handle.x);
    }
    handle
}
