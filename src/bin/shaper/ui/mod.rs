//! TUI module for the shaper demo
//!
//! Shows the transport, the stage shape with its playhead, the output
//! oscilloscope and spectrum, and forwards key presses to the audio thread.

mod shape;
mod spectrum;
pub mod state;
mod transport;
mod waveform;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use std::time::Duration;

use shaper_dsp::{engine::ShaperMessage, transport::TransportState};

pub use state::{EngineSnapshot, SessionInfo};

use shape::render_shape;
use spectrum::{render_spectrum, SpectrumAnalyzer};
use transport::{render_transport, AudioStats};
use waveform::render_waveform;

/// Audio visualization buffer size
const VIS_BUFFER_SIZE: usize = 1024;
const BPM_STEP: f64 = 5.0;
const MIN_BPM: f64 = 20.0;
const MAX_BPM: f64 = 300.0;

/// UI application state
pub struct UiApp {
    /// Control messages to the audio thread
    control_tx: Producer<ShaperMessage>,
    /// Ring buffer receiver for output samples
    scope_rx: Consumer<f32>,
    /// Ring buffer receiver for engine snapshots
    snapshot_rx: Consumer<EngineSnapshot>,
    session: SessionInfo,
    /// Transport as last sent to the engine
    transport: TransportState,
    /// Latest snapshot received
    snapshot: EngineSnapshot,
    /// Output sample buffer for visualization
    audio_buffer: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        control_tx: Producer<ShaperMessage>,
        scope_rx: Consumer<f32>,
        snapshot_rx: Consumer<EngineSnapshot>,
        session: SessionInfo,
    ) -> Self {
        let spectrum = SpectrumAnalyzer::new(VIS_BUFFER_SIZE, session.sample_rate as f32);
        Self {
            control_tx,
            scope_rx,
            snapshot_rx,
            transport: session.transport,
            session,
            snapshot: EngineSnapshot::new(),
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            spectrum,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_snapshots();
            self.spectrum.update(&self.audio_buffer);

            terminal.draw(|frame| self.render(frame))?;

            // Non-blocking, ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    /// Read every pending sample, keeping the last VIS_BUFFER_SIZE
    fn poll_audio(&mut self) {
        while let Ok(sample) = self.scope_rx.pop() {
            self.audio_buffer.push(sample);
        }

        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
    }

    /// Keep only the latest snapshot
    fn poll_snapshots(&mut self) {
        while let Ok(snapshot) = self.snapshot_rx.pop() {
            self.snapshot = snapshot;
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => {
                self.transport.speed = if self.transport.speed == 0.0 { 1.0 } else { 0.0 };
                self.send_transport();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.transport.bpm = (self.transport.bpm + BPM_STEP).min(MAX_BPM);
                self.send_transport();
            }
            KeyCode::Char('-') => {
                self.transport.bpm = (self.transport.bpm - BPM_STEP).max(MIN_BPM);
                self.send_transport();
            }
            _ => {}
        }
    }

    fn send_transport(&mut self) {
        // A full queue means the audio thread is stalled; the next key retries
        let _ = self.control_tx.push(ShaperMessage::Transport(self.transport));
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Transport bar
                Constraint::Min(8),    // Shape
                Constraint::Length(8), // Waveform + spectrum
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_transport(frame, chunks[0], &self.session, &self.transport, &self.snapshot, &stats);

        render_shape(frame, chunks[1], &self.session, &self.snapshot);

        let scopes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        render_waveform(frame, scopes[0], &self.audio_buffer);
        render_spectrum(frame, scopes[1], self.spectrum.data());

        let help = Paragraph::new(" [Q] Quit  [Space] Start/Stop  [+/-] BPM")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
