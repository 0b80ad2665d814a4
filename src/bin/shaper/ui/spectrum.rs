//! Spectrum analyzer widget
//!
//! Hann-windowed FFT of the output, folded into log-spaced bands. Each band
//! shows the loudest FFT bin it covers and falls back slowly, so short gates
//! from the shaper stay visible for a few frames.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::{ops::Range, sync::Arc};

const SPECTRUM_BANDS: usize = 48;
const FLOOR_DB: f64 = -100.0;
/// dB a band may fall per UI frame
const FALL_DB: f64 = 3.0;

pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// FFT bins covered by each band
    bands: Vec<Range<usize>>,
    /// (log10 of band centre in Hz, magnitude in dB)
    spectrum: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    /// `len` is the FFT size and must match the buffers passed to `update`.
    pub fn new(len: usize, sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len);

        let window = (0..len)
            .map(|i| {
                if len > 1 {
                    let phase = std::f32::consts::TAU * i as f32 / (len - 1) as f32;
                    0.5 * (1.0 - phase.cos())
                } else {
                    1.0
                }
            })
            .collect();

        let half = (len / 2).max(1);
        let bin_hz = sample_rate as f64 / len.max(1) as f64;
        let max_hz = (sample_rate as f64 / 2.0).min(20_000.0).max(40.0);
        let ratio = max_hz / 20.0;
        let edge = |band: usize| 20.0 * ratio.powf(band as f64 / SPECTRUM_BANDS as f64);

        let mut bands = Vec::with_capacity(SPECTRUM_BANDS);
        let mut spectrum = Vec::with_capacity(SPECTRUM_BANDS);
        for band in 0..SPECTRUM_BANDS {
            let (low, high) = (edge(band), edge(band + 1));
            let start = ((low / bin_hz) as usize).min(half - 1);
            let end = ((high / bin_hz).ceil() as usize).clamp(start + 1, half);
            bands.push(start..end);
            spectrum.push(((low * high).sqrt().log10(), FLOOR_DB));
        }

        Self {
            window,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); len],
            bands,
            spectrum,
        }
    }

    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for ((slot, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (band, (_, magnitude_db)) in self.bands.iter().zip(self.spectrum.iter_mut()) {
            let power = self.scratch[band.clone()]
                .iter()
                .map(|bin| bin.norm_sqr())
                .fold(1e-12f32, f32::max);
            let db = (10.0 * (power as f64).log10()).max(FLOOR_DB);
            *magnitude_db = db.max(*magnitude_db - FALL_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.spectrum
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &[(f64, f64)]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(spectrum);

    let (low, high) = spectrum
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &(x, _)| (lo.min(x), hi.max(x)));
    let x_bounds = if low < high { [low, high] } else { [1.0, 4.5] };

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds(x_bounds)
                .labels(vec!["20", "1k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 10.0])
                .labels(vec!["-100", "-45", "10"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
