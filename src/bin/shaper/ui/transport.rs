//! Transport bar widget - tempo, run state, cycle position and output level

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use shaper_dsp::transport::{BaseUnit, TransportState};

use super::{EngineSnapshot, SessionInfo};

/// Level statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

fn cycle_label(unit: BaseUnit, value: f64) -> String {
    let unit = match unit {
        BaseUnit::Seconds => "s",
        BaseUnit::Beats => "beats",
        BaseUnit::Bars => "bars",
    };
    format!("{value} {unit}")
}

pub fn render_transport(
    frame: &mut Frame,
    area: Rect,
    session: &SessionInfo,
    transport: &TransportState,
    snapshot: &EngineSnapshot,
    stats: &AudioStats,
) {
    let block = Block::default().title(" shaper ").borders(Borders::ALL);

    let (symbol, label, color) = if snapshot.halted {
        ("■", "Muted", Color::Yellow)
    } else {
        ("▶", "Running", Color::Green)
    };
    let seconds = snapshot.frame as f64 / session.sample_rate;

    let line = Line::from(vec![
        Span::styled(
            format!(" BPM: {:.0}  ", transport.bpm),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{symbol} {label}  "), Style::default().fg(color)),
        Span::styled(
            format!(
                "Cycle {}  pos {:.3}  ",
                cycle_label(session.base_unit, session.base_value),
                snapshot.position
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled(format!("{seconds:.1}s  "), Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!(
                "{:.1}kHz x{}  ",
                session.sample_rate / 1000.0,
                session.channels
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
