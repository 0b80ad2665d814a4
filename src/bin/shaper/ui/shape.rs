//! Shape widget - the stage envelope over one cycle, its output level and
//! the playhead

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use shaper_dsp::MONITOR_BUCKETS;

use super::{EngineSnapshot, SessionInfo};

/// Map points drawn across the width
const SHAPE_POINTS: usize = 256;

pub fn render_shape(frame: &mut Frame, area: Rect, session: &SessionInfo, snapshot: &EngineSnapshot) {
    let block = Block::default()
        .title(format!(" Stage 0: {:?} ", session.method))
        .borders(Borders::ALL);

    let (min, max) = session.value_range;
    let span = if max > min { max - min } else { 1.0 };
    let normalize = |value: f64| ((value - min) / span).clamp(0.0, 1.0);

    let map = &session.map;
    let shape: Vec<(f64, f64)> = if map.is_empty() {
        Vec::new()
    } else {
        (0..SHAPE_POINTS)
            .map(|i| {
                let x = i as f64 / (SHAPE_POINTS - 1) as f64;
                let index = ((x * (map.len() - 1) as f64).round() as usize).min(map.len() - 1);
                (x, normalize(map[index]))
            })
            .collect()
    };

    let level: Vec<(f64, f64)> = snapshot
        .output_peak
        .iter()
        .enumerate()
        .map(|(i, &peak)| {
            let x = (i as f64 + 0.5) / MONITOR_BUCKETS as f64;
            (x, (peak as f64).clamp(0.0, 1.0))
        })
        .collect();

    let playhead = [(snapshot.position, 0.0), (snapshot.position, 1.0)];
    let playhead_color = if snapshot.halted {
        Color::DarkGray
    } else {
        Color::Yellow
    };

    let datasets = vec![
        Dataset::default()
            .name("level")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Magenta))
            .data(&level),
        Dataset::default()
            .name("shape")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&shape),
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(playhead_color))
            .data(&playhead),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .labels(vec![format!("{min}"), format!("{max}")])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
