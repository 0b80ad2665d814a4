mod app;
mod ui;

use color_eyre::eyre::Result as EyreResult;
use shaper_dsp::{
    engine::Method,
    shape::{Node, NodeType, Point},
    transport::BaseUnit,
};

use app::ShaperApp;

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    // One bar per cycle: a gate that opens on the beat and decays
    let gate = [
        Node::end(0.0, 1.0),
        Node::new(
            NodeType::Smooth,
            Point::new(0.2, 0.25),
            Point::new(-0.08, 0.3),
            Point::new(0.08, -0.1),
        ),
        Node::at(NodeType::Point, 0.45, 0.0),
        Node::at(NodeType::Corner, 0.5, 1.0),
        Node::at(NodeType::AutoSmooth, 0.7, 0.2),
        Node::end(1.0, 1.0),
    ];

    ShaperApp::new()
        .bpm(110.0)
        .base(BaseUnit::Bars, 1.0)
        .method(Method::Level)
        .shape(&gate)
        .run()
}
