//! User-drawn envelope curves.
//!
//! A [`Shape`] is an ordered list of Bezier [`Node`]s bounded by two END nodes
//! at x = 0 and x = 1, plus a lookup map rasterized from it. Node edits
//! validate the touched nodes and re-rasterize only the segments around them,
//! so the map is consistent after every call and an edit never costs more
//! than a few segments. Storage is fixed-size; nothing here allocates.

/// Point, node type and node value types.
pub mod node;
/// Bezier segment and line rasterization into the lookup map.
pub mod render;
/// Per-node-type handle and position rules.
pub mod validate;

pub use node::{Node, NodeType, Point, NODE_FLOATS};

use crate::{MAP_RES, MAX_NODES};

use self::render::render_segment;
use self::validate::{validate_end, validate_middle};

pub struct Shape {
    nodes: [Node; MAX_NODES],
    len: usize,
    map: [f64; MAP_RES],
    default_end: f64,
}

impl Shape {
    /// Create a flat shape at `default_end`.
    pub fn new(default_end: f64) -> Self {
        let mut shape = Self {
            nodes: [Node::default(); MAX_NODES],
            len: 0,
            map: [default_end; MAP_RES],
            default_end,
        };
        shape.set_default_shape();
        shape
    }

    /// Reset to the two-node flat shape at the default end value.
    pub fn set_default_shape(&mut self) {
        self.nodes[0] = Node::end(0.0, self.default_end);
        self.nodes[1] = Node::end(1.0, self.default_end);
        self.len = 2;
        self.map.fill(self.default_end);
    }

    /// Change the fallback value used by [`Shape::set_default_shape`].
    /// The current nodes are left alone.
    pub fn set_default_end(&mut self, value: f64) {
        self.default_end = value;
    }

    pub fn default_end(&self) -> f64 {
        self.default_end
    }

    /// Same as [`Shape::set_default_shape`]; part of the editor interface.
    pub fn clear_shape(&mut self) {
        self.set_default_shape();
    }

    /// True while the shape is the untouched flat default.
    pub fn is_default(&self) -> bool {
        self.len == 2
            && self.nodes[0].point.y == self.default_end
            && self.nodes[1].point.y == self.default_end
    }

    pub fn size(&self) -> usize {
        self.len
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes().get(index)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes[..self.len]
    }

    pub fn map(&self) -> &[f64; MAP_RES] {
        &self.map
    }

    /// Insert a node at the position given by its x coordinate.
    ///
    /// Returns `false` if the shape is full, the node is not finite or the
    /// data turned out corrupt (the shape is then reset to its default).
    pub fn insert_node(&mut self, node: Node) -> bool {
        let index = self.nodes()[1..]
            .iter()
            .position(|n| n.point.x > node.point.x)
            .map_or(self.len - 1, |i| i + 1);

        self.insert_node_at(index, node)
    }

    /// Insert a node in front of `index`. END positions (0 and `size()`) are
    /// rejected, as are nodes with non-finite coordinates.
    pub fn insert_node_at(&mut self, index: usize, node: Node) -> bool {
        if self.len >= MAX_NODES || index == 0 || index >= self.len || !node.is_finite() {
            return false;
        }

        self.nodes.copy_within(index..self.len, index + 1);
        self.nodes[index] = node;
        self.len += 1;

        self.refresh(index)
    }

    /// Replace the node at `index`. Non-finite nodes are rejected and leave
    /// the shape untouched.
    ///
    /// END nodes keep their x position and lose their handles. The closing
    /// END node always mirrors the opening one, so changing it has no effect:
    /// the `y` passed in is replaced by the opening node's `y` and the call
    /// still returns `true`. Change node 0 to move the value at both ends.
    pub fn change_node(&mut self, index: usize, node: Node) -> bool {
        if index >= self.len || !node.is_finite() {
            return false;
        }

        self.nodes[index] = node;
        self.refresh(index)
    }

    /// Remove the node at `index`. END nodes cannot be deleted.
    pub fn delete_node(&mut self, index: usize) -> bool {
        if index == 0 || index + 1 >= self.len {
            return false;
        }

        self.nodes.copy_within(index + 1..self.len, index);
        self.len -= 1;

        // The node now at `index` is the former right neighbour
        self.refresh_gap(index)
    }

    /// Replace every node and re-rasterize the whole map. Falls back to the
    /// default shape and returns `false` if `nodes` cannot form a shape.
    pub fn load_nodes(&mut self, nodes: &[Node]) -> bool {
        if nodes.len() < 2 || nodes.len() > MAX_NODES {
            self.set_default_shape();
            return false;
        }

        self.nodes[..nodes.len()].copy_from_slice(nodes);
        self.len = nodes.len();
        self.validate_shape()
    }

    /// Validate one node against its neighbours without re-rasterizing.
    ///
    /// Returns `false` for an invalid index or corrupt ordering. Corruption
    /// resets the whole shape.
    pub fn validate_node(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }

        let last = self.len - 1;
        if index == 0 || index == last {
            self.nodes[index] = validate_end(&self.nodes[index], index == last, self.nodes[0].point.y);
            return true;
        }

        match validate_middle(&self.nodes[index], &self.nodes[index - 1], &self.nodes[index + 1]) {
            Some(node) => {
                self.nodes[index] = node;
                true
            }
            None => {
                self.set_default_shape();
                false
            }
        }
    }

    /// Validate every node in order, then rasterize the full map.
    pub fn validate_shape(&mut self) -> bool {
        if self.len < 2 {
            self.set_default_shape();
            return false;
        }

        for i in 0..self.len {
            if !self.validate_node(i) {
                return false;
            }
        }

        self.render_segments(0, self.len - 1);
        true
    }

    /// Linearly interpolated map lookup. `x` wraps modulo 1.
    #[inline]
    pub fn get_map_value(&self, x: f64) -> f64 {
        if !x.is_finite() {
            return self.map[0];
        }

        let pos = x.rem_euclid(1.0) * MAP_RES as f64;
        let base = pos.floor();
        let frac = pos - base;
        let i0 = (base as usize) % MAP_RES;
        let i1 = (i0 + 1) % MAP_RES;

        self.map[i0] + frac * (self.map[i1] - self.map[i0])
    }

    /// Write the 7-float encoding of every node into `out`. Returns the number
    /// of nodes written (limited by the length of `out`).
    pub fn write_node_floats(&self, out: &mut [f32]) -> usize {
        let mut written = 0;
        for (node, chunk) in self.nodes().iter().zip(out.chunks_exact_mut(NODE_FLOATS)) {
            chunk.copy_from_slice(&node.to_floats());
            written += 1;
        }
        written
    }

    /// Revalidate the node at `index` and its neighbours, then re-rasterize
    /// two segments on either side.
    fn refresh(&mut self, index: usize) -> bool {
        // The edited node first: it is clamped between untouched neighbours
        // before they look at it.
        if !self.validate_node(index) {
            return false;
        }
        if index > 0 && !self.validate_node(index - 1) {
            return false;
        }
        if index + 1 < self.len && !self.validate_node(index + 1) {
            return false;
        }

        let last = self.len - 1;
        self.render_segments(index.saturating_sub(2), (index + 2).min(last));

        if index == 0 {
            self.refresh_closing_end()
        } else {
            true
        }
    }

    /// Revalidate after a deletion joined nodes `index - 1` and `index`.
    fn refresh_gap(&mut self, index: usize) -> bool {
        if !self.validate_node(index - 1) || !self.validate_node(index) {
            return false;
        }

        let last = self.len - 1;
        self.render_segments(index.saturating_sub(2), (index + 1).min(last));
        true
    }

    /// The opening END node changed: carry its value over to the closing one.
    fn refresh_closing_end(&mut self) -> bool {
        let last = self.len - 1;
        if !self.validate_node(last) {
            return false;
        }
        if last > 1 && !self.validate_node(last - 1) {
            return false;
        }

        self.render_segments(last.saturating_sub(2), last);
        true
    }

    /// Rasterize segments between node `from` and node `to`.
    ///
    /// A zero-width segment (a vertical step) writes into the last bucket of
    /// the segment before it, so the window runs on through any steps after
    /// `to` plus the segment behind them. Bucket 0 is shared with the closing
    /// segment at x = 1 and always holds the closing END value.
    fn render_segments(&mut self, from: usize, to: usize) {
        let last = self.len - 1;
        let mut to = to.min(last);
        if to < last && self.nodes[to + 1].point.x <= self.nodes[to].point.x {
            while to < last && self.nodes[to + 1].point.x <= self.nodes[to].point.x {
                to += 1;
            }
            to = (to + 1).min(last);
        }

        for i in from..to {
            let (n1, n2) = (self.nodes[i], self.nodes[i + 1]);
            render_segment(&mut self.map, &n1, &n2);
        }
        self.map[0] = self.nodes[last].point.y;
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn edited_shape() -> Shape {
        let mut shape = Shape::new(0.0);
        assert!(shape.insert_node(Node::at(NodeType::Point, 0.25, 1.0)));
        assert!(shape.insert_node(Node::at(NodeType::AutoSmooth, 0.5, 0.5)));
        assert!(shape.insert_node(Node::new(
            NodeType::Smooth,
            Point::new(0.6, 0.2),
            Point::new(-0.05, 0.1),
            Point::new(0.05, 0.0),
        )));
        assert!(shape.insert_node(Node::new(
            NodeType::Corner,
            Point::new(0.8, 0.9),
            Point::new(-0.1, 0.0),
            Point::new(0.05, -0.3),
        )));
        shape
    }

    fn assert_maps_match(a: &Shape, b: &Shape) {
        for (i, (x, y)) in a.map().iter().zip(b.map().iter()).enumerate() {
            assert!((x - y).abs() < TOLERANCE, "bucket {i}: {x} != {y}");
        }
    }

    #[test]
    fn default_shape_is_flat() {
        let shape = Shape::new(0.75);
        assert_eq!(shape.size(), 2);
        assert!(shape.is_default());
        for i in 0..100 {
            assert_eq!(shape.get_map_value(i as f64 / 100.0), 0.75);
        }
    }

    #[test]
    fn map_is_finite_and_ends_match_end_nodes() {
        let shape = edited_shape();
        for i in 0..(4 * MAP_RES) {
            let x = i as f64 / (4 * MAP_RES) as f64;
            assert!(shape.get_map_value(x).is_finite());
        }

        let start = shape.node(0).unwrap().point.y;
        let end = shape.node(shape.size() - 1).unwrap().point.y;
        assert_eq!(shape.get_map_value(0.0), start);
        assert!((shape.get_map_value(1.0 - 1e-9) - end).abs() < 1e-4);
    }

    #[test]
    fn map_value_interpolates_and_wraps() {
        let mut shape = Shape::new(0.0);
        assert!(shape.insert_node(Node::at(NodeType::Point, 0.5, 1.0)));

        assert!((shape.get_map_value(0.25) - 0.5).abs() < TOLERANCE);
        assert!((shape.get_map_value(1.25) - 0.5).abs() < TOLERANCE);
        assert!((shape.get_map_value(-0.75) - 0.5).abs() < TOLERANCE);
        // Halfway between buckets
        let x = 100.5 / MAP_RES as f64;
        assert!((shape.get_map_value(x) - 2.0 * x).abs() < TOLERANCE);
    }

    #[test]
    fn inserted_nodes_stay_sorted() {
        let mut shape = Shape::new(0.0);
        assert!(shape.insert_node(Node::at(NodeType::Point, 0.7, 1.0)));
        assert!(shape.insert_node(Node::at(NodeType::Point, 0.2, 1.0)));
        assert!(shape.insert_node(Node::at(NodeType::Point, 0.5, 1.0)));

        let xs: Vec<f64> = shape.nodes().iter().map(|n| n.point.x).collect();
        assert_eq!(xs, vec![0.0, 0.2, 0.5, 0.7, 1.0]);
    }

    #[test]
    fn partial_rendering_matches_full_render() {
        let mut shape = edited_shape();
        assert!(shape.change_node(2, Node::at(NodeType::AutoSmooth, 0.3, 0.1)));
        assert!(shape.delete_node(3));
        assert!(shape.change_node(0, Node::end(0.0, 0.4)));
        assert!(shape.insert_node(Node::at(NodeType::SymmetricSmooth, 0.9, 0.6)));

        let mut full = Shape::new(0.0);
        assert!(full.load_nodes(shape.nodes()));

        assert_maps_match(&shape, &full);
    }

    #[test]
    fn validate_shape_is_idempotent() {
        let mut shape = edited_shape();
        assert!(shape.validate_shape());
        let nodes: Vec<Node> = shape.nodes().to_vec();
        let map = *shape.map();

        assert!(shape.validate_shape());
        for (a, b) in nodes.iter().zip(shape.nodes()) {
            assert_eq!(a.node_type, b.node_type);
            for (p, q) in [(a.point, b.point), (a.handle1, b.handle1), (a.handle2, b.handle2)] {
                assert!((p - q).length() < 1e-12);
            }
        }
        for (a, b) in map.iter().zip(shape.map().iter()) {
            assert!((a - b).abs() < TOLERANCE);
        }
    }

    #[test]
    fn end_nodes_cannot_be_deleted_or_moved() {
        let mut shape = Shape::new(0.0);
        assert!(!shape.delete_node(0));
        assert!(!shape.delete_node(1));

        assert!(shape.change_node(1, Node::at(NodeType::Corner, 0.5, 0.8)));
        assert_eq!(shape.node(1), Some(&Node::end(1.0, 0.0)));
    }

    #[test]
    fn opening_end_value_is_mirrored() {
        let mut shape = Shape::new(0.0);
        assert!(shape.insert_node(Node::at(NodeType::Point, 0.5, 1.0)));
        assert!(shape.change_node(0, Node::end(0.0, 0.6)));

        assert_eq!(shape.node(2).unwrap().point.y, 0.6);
        assert_eq!(shape.get_map_value(0.0), 0.6);
        assert!((shape.get_map_value(1.0 - 1.0 / MAP_RES as f64) - 0.6).abs() < 1e-3);
    }

    #[test]
    fn insert_fails_at_capacity() {
        let mut shape = Shape::new(0.0);
        for i in 1..(MAX_NODES - 1) {
            let x = i as f64 / MAX_NODES as f64;
            assert!(shape.insert_node(Node::at(NodeType::Point, x, 0.5)));
        }
        assert_eq!(shape.size(), MAX_NODES);

        let before = *shape.map();
        assert!(!shape.insert_node(Node::at(NodeType::Point, 0.99, 1.0)));
        assert_eq!(shape.size(), MAX_NODES);
        assert_eq!(&before, shape.map());
    }

    #[test]
    fn invalid_indices_are_rejected() {
        let mut shape = Shape::new(0.0);
        assert!(!shape.change_node(5, Node::at(NodeType::Point, 0.5, 1.0)));
        assert!(!shape.insert_node_at(0, Node::at(NodeType::Point, 0.5, 1.0)));
        assert!(!shape.insert_node_at(2, Node::at(NodeType::Point, 0.5, 1.0)));
        assert!(!shape.validate_node(2));
        assert!(shape.is_default());
    }

    #[test]
    fn corrupt_order_resets_to_default() {
        let mut shape = Shape::new(0.25);
        let nodes = [
            Node::end(0.0, 0.0),
            Node::at(NodeType::Point, 0.6, 1.0),
            Node::at(NodeType::Point, 0.7, 1.0),
            Node::at(NodeType::Point, 0.2, 1.0),
            Node::end(1.0, 0.0),
        ];

        assert!(!shape.load_nodes(&nodes));
        assert!(shape.is_default());
        assert_eq!(shape.get_map_value(0.5), 0.25);
    }

    #[test]
    fn dragging_past_a_neighbour_clamps() {
        let mut shape = Shape::new(0.0);
        assert!(shape.insert_node(Node::at(NodeType::Point, 0.25, 1.0)));
        assert!(shape.insert_node(Node::at(NodeType::Point, 0.5, 1.0)));

        assert!(shape.change_node(2, Node::at(NodeType::Point, 0.1, 1.0)));
        assert_eq!(shape.node(2).unwrap().point.x, 0.25);
    }

    fn stepped_shape() -> Shape {
        let mut shape = Shape::new(0.0);
        assert!(shape.load_nodes(&[
            Node::end(0.0, 0.0),
            Node::at(NodeType::Point, 0.2, 0.5),
            Node::at(NodeType::Point, 0.4, 0.3),
            Node::at(NodeType::Point, 0.7, 0.2),
            Node::at(NodeType::Point, 0.7, 0.9),
            Node::end(1.0, 0.0),
        ]));
        shape
    }

    fn assert_matches_full_render(shape: &Shape) {
        let mut full = Shape::new(0.0);
        assert!(full.load_nodes(shape.nodes()));
        assert_maps_match(shape, &full);
    }

    #[test]
    fn edits_before_a_step_match_full_render() {
        let mut shape = stepped_shape();
        let step = (0.7 * MAP_RES as f64) as usize;
        assert_eq!(shape.map()[step], 0.9);

        assert!(shape.change_node(1, Node::at(NodeType::Point, 0.2, 0.6)));
        assert_eq!(shape.map()[step], 0.9);
        assert_matches_full_render(&shape);

        assert!(shape.insert_node(Node::at(NodeType::AutoSmooth, 0.3, 0.1)));
        assert_matches_full_render(&shape);

        assert!(shape.delete_node(2));
        assert_matches_full_render(&shape);

        // Double step: the window runs through both zero-width segments
        assert!(shape.insert_node_at(5, Node::at(NodeType::Point, 0.7, 0.4)));
        assert!(shape.change_node(2, Node::at(NodeType::Point, 0.45, 0.8)));
        assert_matches_full_render(&shape);
    }

    #[test]
    fn step_at_the_start_keeps_bucket_zero_on_the_end_value() {
        let mut shape = Shape::new(0.3);
        assert!(shape.insert_node(Node::at(NodeType::Point, 0.0, 0.9)));
        assert!(shape.insert_node(Node::at(NodeType::Point, 0.5, 0.1)));
        assert_eq!(shape.map()[0], 0.3);
        assert_matches_full_render(&shape);
    }

    #[test]
    fn non_finite_edits_leave_shape_untouched() {
        let mut shape = Shape::new(0.0);
        assert!(shape.insert_node(Node::at(NodeType::Point, 0.5, 1.0)));
        let nodes = shape.nodes().to_vec();
        let map = *shape.map();

        assert!(!shape.insert_node(Node::at(NodeType::Point, 0.3, f64::NAN)));
        assert!(!shape.change_node(
            1,
            Node::new(
                NodeType::Corner,
                Point::new(0.5, 0.5),
                Point::new(f64::NEG_INFINITY, 0.0),
                Point::ZERO,
            ),
        ));
        assert!(!shape.change_node(0, Node::end(0.0, f64::INFINITY)));

        assert_eq!(shape.nodes(), &nodes[..]);
        assert_eq!(shape.map(), &map);
        assert!(!shape.is_default());
    }

    #[test]
    fn closing_end_change_keeps_opening_value() {
        let mut shape = Shape::new(0.2);
        assert!(shape.insert_node(Node::at(NodeType::Point, 0.5, 1.0)));
        let map = *shape.map();

        assert!(shape.change_node(2, Node::end(1.0, 0.9)));
        assert_eq!(shape.node(2), Some(&Node::end(1.0, 0.2)));
        assert_eq!(shape.map(), &map);
    }

    #[test]
    fn float_encoding_round_trips_through_inserts() {
        let shape = edited_shape();
        let mut floats = [0.0f32; MAX_NODES * NODE_FLOATS];
        let count = shape.write_node_floats(&mut floats);
        assert_eq!(count, shape.size());

        let mut copy = Shape::new(0.0);
        assert!(copy.change_node(0, Node::from_floats(&floats[..7].try_into().unwrap()).unwrap()));
        for chunk in floats[NODE_FLOATS..(count - 1) * NODE_FLOATS].chunks_exact(NODE_FLOATS) {
            let node = Node::from_floats(chunk.try_into().unwrap()).unwrap();
            assert!(copy.insert_node(node));
        }

        // f32 encoding: compare within single precision
        for (a, b) in shape.map().iter().zip(copy.map().iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn default_end_only_applies_on_reset() {
        let mut shape = Shape::new(0.0);
        assert!(shape.insert_node(Node::at(NodeType::Point, 0.5, 1.0)));
        shape.set_default_end(20_000.0);
        assert!(!shape.is_default());

        shape.clear_shape();
        assert_eq!(shape.default_end(), 20_000.0);
        assert!(shape.is_default());
        assert_eq!(shape.get_map_value(0.3), 20_000.0);
    }
}
