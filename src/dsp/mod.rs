//! Low-level DSP primitives used by the shaper stages.
//!
//! These components are allocation-free once constructed and realtime-safe,
//! so a stage can own them directly. They stay focused on the
//! signal-processing math; the engine decides which one runs for which
//! envelope value.

/// Butterworth low-pass / high-pass cascade with per-sample coefficients.
pub mod filter;
/// Ring buffer with splice seeking for pitch-shift and delay.
pub mod splice;
/// Level, gain, balance, width and dry/wet on stereo frames.
pub mod stereo;

pub use filter::{ButterworthFilter, FilterKind};
pub use splice::AudioBuffer;
pub use stereo::Frame;
