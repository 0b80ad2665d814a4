use crate::MAP_RES;

use super::node::{Node, Point};

/*
Rasterizing a Bezier Segment
============================

Each pair of adjacent nodes spans one cubic Bezier segment:

    P1 = n1.point                 (start)
    P2 = n1.point + n1.handle2    (start tangent)
    P3 = n2.point + n2.handle1    (end tangent)
    P4 = n2.point                 (end)

    B(t) = (1-t)^3 P1 + 3(1-t)^2 t P2 + 3(1-t) t^2 P3 + t^3 P4,  t in [0, 1]

The curve is sampled at twice the map resolution over the x distance it
covers, so every map bucket receives at least one line piece. Consecutive
samples are joined by straight lines and every bucket whose x lies on a line
piece is overwritten with the interpolated value.

    map bucket i  <->  x = i / MAP_RES

Handles are clamped so that no control point leaves [n1.x, n2.x]; the curve
stays inside that x range (convex hull property) and segments only share the
bucket under their common node. If a segment still folds back on itself in x,
the later sample wins.

x = 1.0 maps to bucket MAP_RES, which wraps to bucket 0: the closing END node
and the opening END node hold the same value, so the wrap is seamless.
*/

#[inline]
fn bezier(p1: Point, p2: Point, p3: Point, p4: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    p1 * (mt * mt * mt) + p2 * (3.0 * mt * mt * t) + p3 * (3.0 * mt * t * t) + p4 * (t * t * t)
}

/// Rasterize the segment between two adjacent nodes into `map`.
pub(crate) fn render_segment(map: &mut [f64; MAP_RES], n1: &Node, n2: &Node) {
    let p1 = n1.point;
    let p2 = n1.point + n1.handle2;
    let p3 = n2.point + n2.handle1;
    let p4 = n2.point;

    let steps = ((n2.point.x - n1.point.x).abs() * MAP_RES as f64 * 2.0) as usize + 1;

    let mut last = p1;
    for step in 1..=steps {
        let t = step as f64 / steps as f64;
        let p = bezier(p1, p2, p3, p4, t);
        draw_line(map, last, p);
        last = p;
    }
}

/// Write the straight line `a -> b` into every bucket it covers.
pub(crate) fn draw_line(map: &mut [f64; MAP_RES], a: Point, b: Point) {
    let res = MAP_RES as f64;

    if b.x > a.x {
        let first = (a.x * res).ceil().max(0.0) as usize;
        let last = (b.x * res).floor().max(0.0) as usize;
        for i in first..=last {
            let x = i as f64 / res;
            map[i % MAP_RES] = if x >= b.x {
                b.y
            } else {
                a.y + (b.y - a.y) * (x - a.x) / (b.x - a.x)
            };
        }
    } else {
        let i = (b.x * res).floor().max(0.0) as usize;
        map[i % MAP_RES] = b.y;
    }
}
