//! Benchmarks for shape editing and lookup.
//!
//! Edits re-rasterize only the segments next to the touched node; loading
//! a whole shape renders every segment.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use shaper_dsp::{
    shape::{Node, NodeType, Point, Shape},
    MAX_NODES,
};

use crate::BLOCK_SIZES;

fn smooth_shape(nodes: usize) -> Vec<Node> {
    let inner = nodes.saturating_sub(2);
    let mut shape = vec![Node::end(0.0, 0.5)];
    for i in 0..inner {
        let x = (i + 1) as f64 / (inner + 1) as f64;
        let y = if i % 2 == 0 { 0.9 } else { 0.1 };
        shape.push(Node::new(
            NodeType::Smooth,
            Point::new(x, y),
            Point::new(-0.01, 0.0),
            Point::new(0.01, 0.0),
        ));
    }
    shape.push(Node::end(1.0, 0.5));
    shape
}

pub fn bench_shape(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/shape");

    for nodes in [4, 16, MAX_NODES] {
        let layout = smooth_shape(nodes);
        let mut shape = Shape::new(0.5);

        group.bench_with_input(BenchmarkId::new("load_nodes", nodes), &nodes, |b, _| {
            b.iter(|| shape.load_nodes(black_box(&layout)))
        });

        // Drag one inner node up and down
        let index = nodes / 2;
        let mut lift = 0.0;
        group.bench_with_input(BenchmarkId::new("change_node", nodes), &nodes, |b, _| {
            b.iter(|| {
                lift = if lift > 0.0 { 0.0 } else { 0.2 };
                let mut node = layout[index];
                node.point.y = (node.point.y + lift).min(1.0);
                shape.change_node(black_box(index), node)
            })
        });
    }

    let mut shape = Shape::new(0.5);
    shape.load_nodes(&smooth_shape(MAX_NODES / 2));
    group.bench_function("insert_delete", |b| {
        b.iter(|| {
            shape.insert_node(black_box(Node::at(NodeType::AutoSmooth, 0.33, 0.7)));
            let index = shape
                .nodes()
                .iter()
                .position(|n| n.point.x == 0.33)
                .unwrap_or(1);
            shape.delete_node(black_box(index))
        })
    });

    for &size in BLOCK_SIZES {
        let step = 1.0 / size as f64;
        group.bench_with_input(BenchmarkId::new("get_map_value", size), &size, |b, &size| {
            b.iter(|| {
                let mut sum = 0.0;
                for i in 0..size {
                    sum += shape.get_map_value(black_box(i as f64 * step));
                }
                sum
            })
        });
    }

    group.finish();
}
