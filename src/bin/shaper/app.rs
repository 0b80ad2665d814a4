//! Shaper demo - application builder and audio runner

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use rtrb::RingBuffer;

use shaper_dsp::{
    engine::{Method, ShaperMessage},
    io::StereoBuffer,
    shape::Node,
    transport::{BaseUnit, TransportState},
    EngineConfig, ShaperEngine, MAX_BLOCK_SIZE, MONITOR_BUCKETS,
};

use super::ui::{EngineSnapshot, SessionInfo, UiApp};

/// Capacity of the UI -> audio control queue
const CONTROL_QUEUE_SIZE: usize = 256;
/// Capacity of the audio -> UI scope queue, in samples
const SCOPE_QUEUE_SIZE: usize = 16_384;
const SNAPSHOT_QUEUE_SIZE: usize = 16;

/// Internal test tone fed into stage 0
const TONE_HZ: f32 = 220.0;
const TONE_AMP: f32 = 0.3;

/// Demo application builder
pub struct ShaperApp {
    bpm: f64,
    base_unit: BaseUnit,
    base_value: f64,
    method: Method,
    shape: Vec<Node>,
}

impl ShaperApp {
    pub fn new() -> Self {
        Self {
            bpm: 120.0,
            base_unit: BaseUnit::Bars,
            base_value: 1.0,
            method: Method::Level,
            shape: Vec::new(),
        }
    }

    /// Set the tempo in beats per minute
    pub fn bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    /// Set the cycle length
    pub fn base(mut self, unit: BaseUnit, value: f64) -> Self {
        self.base_unit = unit;
        self.base_value = value;
        self
    }

    /// Method of stage 0
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Shape of stage 0. Left empty, the stage keeps its flat default.
    pub fn shape(mut self, nodes: &[Node]) -> Self {
        self.shape = nodes.to_vec();
        self
    }

    /// Run the application (takes over the terminal, plays audio)
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f64;
        let channels = config.channels() as usize;

        let mut engine = self.build_engine(sample_rate)?;
        let limits = engine.config().method_limits(self.method);
        let session = SessionInfo {
            sample_rate,
            channels,
            base_unit: self.base_unit,
            base_value: self.base_value,
            method: self.method,
            value_range: (limits.min, limits.max),
            map: engine
                .shape(0)
                .map(|shape| shape.map().to_vec())
                .unwrap_or_default(),
            transport: *engine.transport().state(),
        };

        let (control_tx, mut control_rx) = RingBuffer::<ShaperMessage>::new(CONTROL_QUEUE_SIZE);
        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_QUEUE_SIZE);
        let (mut snapshot_tx, snapshot_rx) = RingBuffer::<EngineSnapshot>::new(SNAPSHOT_QUEUE_SIZE);

        let mut input = StereoBuffer::new(MAX_BLOCK_SIZE);
        let mut output = StereoBuffer::new(MAX_BLOCK_SIZE);
        let mut tone = TestTone::new(TONE_HZ, sample_rate as f32);

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| {
                    let total_frames = data.len() / channels;
                    let mut frames_written = 0;

                    while frames_written < total_frames {
                        let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);

                        tone.fill(&mut input, frames);
                        engine.render_block(
                            &mut control_rx,
                            input.channels(frames),
                            output.channels_mut(frames),
                        );

                        let start = frames_written * channels;
                        output.interleave(&mut data[start..start + frames * channels], channels);

                        // The scope is best effort; drop samples when the UI lags
                        for &sample in &output.left[..frames] {
                            if scope_tx.push(sample).is_err() {
                                break;
                            }
                        }

                        frames_written += frames;
                    }

                    let _ = snapshot_tx.push(snapshot(&engine));
                },
                |err| eprintln!("Audio error: {}", err),
                None,
            )
            .wrap_err("failed to build output stream")?;

        stream.play().wrap_err("failed to start output stream")?;

        let mut terminal = ratatui::init();
        let result = UiApp::new(control_tx, scope_rx, snapshot_rx, session).run(&mut terminal);
        ratatui::restore();

        result
    }

    fn build_engine(&self, sample_rate: f64) -> EyreResult<ShaperEngine> {
        let config = EngineConfig {
            base_unit: self.base_unit,
            base_value: self.base_value,
            ..EngineConfig::with_sample_rate(sample_rate)
        };
        let mut engine = ShaperEngine::new(config);

        engine
            .set_method(0, self.method)
            .wrap_err("failed to set stage method")?;
        if !self.shape.is_empty() && !engine.load_shape(0, &self.shape) {
            return Err(eyre!("preset shape is not a valid shape"));
        }

        engine.handle_message(ShaperMessage::Transport(TransportState {
            bpm: self.bpm,
            ..TransportState::default()
        }));

        Ok(engine)
    }
}

impl Default for ShaperApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Sine generator standing in for a host's audio input
struct TestTone {
    phase: f32,
    increment: f32,
}

impl TestTone {
    fn new(frequency: f32, sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            increment: frequency / sample_rate,
        }
    }

    fn fill(&mut self, buffer: &mut StereoBuffer, frames: usize) {
        let [left, right] = buffer.channels_mut(frames);
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let sample = TONE_AMP * (std::f32::consts::TAU * self.phase).sin();
            *l = sample;
            *r = sample;
            self.phase = (self.phase + self.increment).fract();
        }
    }
}

/// Allocation-free view of the engine for the UI thread
fn snapshot(engine: &ShaperEngine) -> EngineSnapshot {
    let mut output_peak = [0.0; MONITOR_BUCKETS];
    if let Some(monitor) = engine.monitor(0) {
        for (peak, bucket) in output_peak.iter_mut().zip(monitor.buckets()) {
            if bucket.touched {
                *peak = bucket.output_max.max(-bucket.output_min);
            }
        }
    }

    EngineSnapshot {
        position: engine.position(),
        frame: engine.frame(),
        halted: engine.is_halted(),
        output_peak,
    }
}
