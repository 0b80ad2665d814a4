//! Shared state types for UI communication
//!
//! Static session data is handed over once at start-up; per-callback
//! updates are `Copy` so the audio thread never allocates to send them.

use shaper_dsp::{engine::Method, transport::{BaseUnit, TransportState}, MONITOR_BUCKETS};

/// Static state built before the stream starts (can allocate)
#[derive(Clone, Debug)]
pub struct SessionInfo {
    pub sample_rate: f64,
    pub channels: usize,
    pub base_unit: BaseUnit,
    pub base_value: f64,
    /// Method of the displayed stage
    pub method: Method,
    /// Envelope range of that method, used as chart bounds
    pub value_range: (f64, f64),
    /// Rasterized shape of the displayed stage
    pub map: Vec<f64>,
    /// Transport the engine started with
    pub transport: TransportState,
}

/// Dynamic state sent from the audio callback (allocation-free, Copy)
#[derive(Clone, Copy, Debug)]
pub struct EngineSnapshot {
    /// Cyclic position in `[0, 1)`
    pub position: f64,
    pub frame: u64,
    pub halted: bool,
    /// Output peak of the displayed stage per monitor bucket
    pub output_peak: [f32; MONITOR_BUCKETS],
}

impl EngineSnapshot {
    pub fn new() -> Self {
        Self {
            position: 0.0,
            frame: 0,
            halted: false,
            output_peak: [0.0; MONITOR_BUCKETS],
        }
    }
}
