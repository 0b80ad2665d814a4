pub mod dsp; // Filter cascade, splice buffer, stereo primitives
pub mod engine; // Shaper stages and the per-sample effect chain
pub mod io;
pub mod shape; // Bezier nodes rasterized into lookup maps
pub mod transport; // Host musical position to cyclic position

pub use engine::{EngineConfig, ShaperEngine};

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Number of shaper stages in one engine.
pub const MAX_SHAPES: usize = 4;
/// Node capacity of one shape, including both END nodes.
pub const MAX_NODES: usize = 64;
/// Resolution of the rasterized shape map.
pub const MAP_RES: usize = 1024;

/// Butterworth filter order. Realized as `F_ORDER / 2` two-pole sections.
pub const F_ORDER: usize = 8;
/// Number of slope taps (offsets 1, 2, 4, ...) in the splice score.
pub const P_ORDER: usize = 6;
/// Guard band kept clear at each edge of a splice search window.
pub const FADER_SIZE: usize = 64;
/// Ring buffer capacity for the pitch shifter, in frames.
pub const PITCH_BUFFER_SIZE: usize = 1024;
/// Longest delay a stage can be driven to.
pub const MAX_DELAY_MS: f64 = 1000.0;

/// Position buckets per cycle for monitoring extrema.
pub const MONITOR_BUCKETS: usize = 64;
