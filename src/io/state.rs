//! Line-oriented textual shape state.
//!
//! One line per node:
//!
//! ```text
//! shp:0; typ:0; ptx:0; pty:1; h1x:0; h1y:0; h2x:0; h2y:0;
//! shp:0; typ:2; ptx:0.5; pty:0.25; h1x:-0.1; h1y:0; h2x:0.1; h2y:0;
//! ```
//!
//! Parsing is permissive per shape: a bad line ruins only the shape it
//! belongs to, which then falls back to its default. Problems are logged and
//! never surface as hard errors to the engine.

use std::fmt::Write;

use log::warn;
use thiserror::Error;

use crate::{
    shape::{Node, NodeType, Point},
    MAX_NODES, MAX_SHAPES,
};

const NUMBER_FIELDS: [&str; 6] = ["ptx", "pty", "h1x", "h1y", "h2x", "h2y"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    #[error("line {line}: missing field `{field}`")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: field `{field}` has invalid value `{value}`")]
    InvalidValue {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: shape {shape} out of range")]
    ShapeOutOfRange { line: usize, shape: usize },

    #[error("line {line}: unknown node type {code}")]
    UnknownNodeType { line: usize, code: i64 },

    #[error("shape {shape} has more than {MAX_NODES} nodes")]
    TooManyNodes { shape: usize },
}

/// Outcome of decoding one shape.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedShape {
    /// No line mentioned this shape.
    Missing,
    Nodes(Vec<Node>),
    /// At least one line for this shape was bad.
    Invalid,
}

/// One line for `node` of shape `shape`.
pub fn encode_node(shape: usize, node: &Node) -> String {
    format!(
        "shp:{shape}; typ:{}; ptx:{}; pty:{}; h1x:{}; h1y:{}; h2x:{}; h2y:{};",
        node.node_type.code(),
        node.point.x,
        node.point.y,
        node.handle1.x,
        node.handle1.y,
        node.handle2.x,
        node.handle2.y,
    )
}

/// All nodes of all shapes, shape by shape.
pub fn encode_shapes<'a, I>(shapes: I) -> String
where
    I: IntoIterator<Item = &'a [Node]>,
{
    let mut out = String::new();
    for (index, nodes) in shapes.into_iter().enumerate() {
        for node in nodes {
            // Writing into a String cannot fail
            let _ = writeln!(out, "{}", encode_node(index, node));
        }
    }
    out
}

/// Decode state text into one result per shape.
pub fn decode_shapes(text: &str) -> [DecodedShape; MAX_SHAPES] {
    let mut shapes: [DecodedShape; MAX_SHAPES] = std::array::from_fn(|_| DecodedShape::Missing);

    for (number, line) in text.lines().enumerate() {
        let line_no = number + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let shape = match parse_shape_index(line, line_no) {
            Ok(shape) => shape,
            Err(err) => {
                warn!("skipping state line: {err}");
                continue;
            }
        };

        if shapes[shape] == DecodedShape::Invalid {
            continue;
        }

        let node = match parse_node(line, line_no) {
            Ok(node) => node,
            Err(err) => {
                warn!("dropping stored shape {shape}: {err}");
                shapes[shape] = DecodedShape::Invalid;
                continue;
            }
        };

        let full = matches!(&shapes[shape], DecodedShape::Nodes(nodes) if nodes.len() >= MAX_NODES);
        if full {
            warn!("dropping stored shape: {}", StateError::TooManyNodes { shape });
            shapes[shape] = DecodedShape::Invalid;
        } else if let DecodedShape::Nodes(nodes) = &mut shapes[shape] {
            nodes.push(node);
        } else {
            shapes[shape] = DecodedShape::Nodes(vec![node]);
        }
    }

    shapes
}

/// Parse one full line.
pub fn parse_line(line: &str, line_no: usize) -> Result<(usize, Node), StateError> {
    Ok((parse_shape_index(line, line_no)?, parse_node(line, line_no)?))
}

fn parse_shape_index(line: &str, line_no: usize) -> Result<usize, StateError> {
    let value = field(line, "shp", line_no)?;
    let shape = value.parse::<usize>().map_err(|_| StateError::InvalidValue {
        line: line_no,
        field: "shp",
        value: value.to_string(),
    })?;

    if shape >= MAX_SHAPES {
        return Err(StateError::ShapeOutOfRange {
            line: line_no,
            shape,
        });
    }
    Ok(shape)
}

fn parse_node(line: &str, line_no: usize) -> Result<Node, StateError> {
    let value = field(line, "typ", line_no)?;
    let code = value.parse::<i64>().map_err(|_| StateError::InvalidValue {
        line: line_no,
        field: "typ",
        value: value.to_string(),
    })?;
    let node_type = u8::try_from(code)
        .ok()
        .and_then(NodeType::from_code)
        .ok_or(StateError::UnknownNodeType {
            line: line_no,
            code,
        })?;

    let mut numbers = [0.0; NUMBER_FIELDS.len()];
    for (slot, name) in numbers.iter_mut().zip(NUMBER_FIELDS) {
        let value = field(line, name, line_no)?;
        *slot = value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| StateError::InvalidValue {
                line: line_no,
                field: name,
                value: value.to_string(),
            })?;
    }

    let [x, y, h1x, h1y, h2x, h2y] = numbers;
    Ok(Node::new(
        node_type,
        Point::new(x, y),
        Point::new(h1x, h1y),
        Point::new(h2x, h2y),
    ))
}

fn field<'a>(line: &'a str, name: &'static str, line_no: usize) -> Result<&'a str, StateError> {
    line.split(';')
        .filter_map(|part| part.split_once(':'))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .ok_or(StateError::MissingField {
            line: line_no,
            field: name,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_node() -> Node {
        Node::new(
            NodeType::Smooth,
            Point::new(0.5, -0.25),
            Point::new(-0.125, 0.1),
            Point::new(0.2, -0.16),
        )
    }

    #[test]
    fn test_encode_node_format() {
        let line = encode_node(2, &Node::end(0.0, 1.0));
        assert_eq!(line, "shp:2; typ:0; ptx:0; pty:1; h1x:0; h1y:0; h2x:0; h2y:0;");
    }

    #[test]
    fn test_line_round_trip_is_exact() {
        let node = sample_node();
        let line = encode_node(3, &node);
        assert_eq!(parse_line(&line, 1), Ok((3, node)));
    }

    #[test]
    fn test_fields_may_be_reordered_and_spaced() {
        let line = "typ:1 ;shp: 0; pty:0.5;ptx:0.25; h2y:0; h2x:0; h1y:0; h1x:0;";
        let (shape, node) = parse_line(line, 1).unwrap();
        assert_eq!(shape, 0);
        assert_eq!(node, Node::at(NodeType::Point, 0.25, 0.5));
    }

    #[test]
    fn test_errors_name_the_problem() {
        let missing = parse_line("shp:0; typ:1; ptx:0.5;", 4);
        assert_eq!(
            missing,
            Err(StateError::MissingField {
                line: 4,
                field: "pty"
            })
        );

        let line = encode_node(0, &sample_node()).replace("typ:4", "typ:9");
        assert_eq!(
            parse_line(&line, 2),
            Err(StateError::UnknownNodeType { line: 2, code: 9 })
        );

        let line = encode_node(7, &sample_node());
        assert_eq!(
            parse_line(&line, 1),
            Err(StateError::ShapeOutOfRange { line: 1, shape: 7 })
        );

        let line = encode_node(0, &sample_node()).replace("pty:-0.25", "pty:inf");
        assert!(matches!(
            parse_line(&line, 1),
            Err(StateError::InvalidValue { field: "pty", .. })
        ));
    }

    #[test]
    fn test_decode_keeps_good_shapes() {
        let good = [Node::end(0.0, 0.5), sample_node(), Node::end(1.0, 0.5)];
        let mut text = encode_shapes([&good[..], &good[..]]);
        text.push_str("shp:1; typ:1; ptx:zero; pty:0; h1x:0; h1y:0; h2x:0; h2y:0;\n");
        text.push_str("garbage without shape\n");

        let decoded = decode_shapes(&text);
        assert_eq!(decoded[0], DecodedShape::Nodes(good.to_vec()));
        assert_eq!(decoded[1], DecodedShape::Invalid);
        assert_eq!(decoded[2], DecodedShape::Missing);
    }

    #[test]
    fn test_decode_rejects_oversized_shape() {
        let nodes = vec![Node::at(NodeType::Point, 0.5, 0.0); MAX_NODES + 1];
        let text = encode_shapes([&nodes[..]]);
        assert_eq!(decode_shapes(&text)[0], DecodedShape::Invalid);
    }

    #[test]
    fn test_error_messages() {
        let err = StateError::MissingField {
            line: 3,
            field: "h1x",
        };
        assert_eq!(err.to_string(), "line 3: missing field `h1x`");
    }
}
