//! Host musical position to cyclic shape position.
//!
//! The engine never sees absolute song time. It asks the [`Transport`] for the
//! position within the current cycle, a value in `[0, 1)` that indexes every
//! stage's shape. The cycle length is `base_value` units of the [`BaseUnit`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Position Bookkeeping
====================

The transport keeps one reference point: a frame number and the musical
position reached at that frame. Positions for later frames are extrapolated
from the reference, so nothing is accumulated per sample and rounding errors
cannot drift.

    elapsed = frame - ref_frame

    Seconds:  pos = ref_cycle + elapsed / (rate * base_value)
    Beats:    pos = beats(frame) / base_value
    Bars:     pos = beats(frame) / beats_per_bar / base_value

    beats(frame) = bar * beats_per_bar + bar_beat
                 + elapsed * speed * bpm / (60 * rate)

All positions are taken modulo 1.

Every tempo, speed or meter change first moves the reference point to the
frame of the change, so the curve continues smoothly at the new rate. A host
relocation (bar, bar_beat) replaces the musical position outright.

Seconds mode runs freely; it ignores tempo and transport speed.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseUnit {
    Seconds,
    #[default]
    Beats,
    Bars,
}

impl BaseUnit {
    pub fn code(self) -> u8 {
        match self {
            BaseUnit::Seconds => 0,
            BaseUnit::Beats => 1,
            BaseUnit::Bars => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(BaseUnit::Seconds),
            1 => Some(BaseUnit::Beats),
            2 => Some(BaseUnit::Bars),
            _ => None,
        }
    }
}

/// Tempo, speed and meter as reported by the host, plus the musical position
/// they apply from.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub bpm: f64,
    /// 0.0 stopped, 1.0 playing.
    pub speed: f64,
    pub beats_per_bar: f64,
    pub beat_unit: u32,
    pub bar: i64,
    pub bar_beat: f64,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            speed: 1.0,
            beats_per_bar: 4.0,
            beat_unit: 4,
            bar: 0,
            bar_beat: 0.0,
        }
    }
}

impl TransportState {
    /// Musical position in beats from the start of bar 0.
    pub fn beats(&self) -> f64 {
        self.bar as f64 * self.beats_per_bar + self.bar_beat
    }
}

#[derive(Debug, Clone)]
pub struct Transport {
    sample_rate: f64,
    base_unit: BaseUnit,
    base_value: f64,
    state: TransportState,
    ref_frame: u64,
    ref_cycle: f64,
}

impl Transport {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            base_unit: BaseUnit::default(),
            base_value: 1.0,
            state: TransportState::default(),
            ref_frame: 0,
            ref_cycle: 0.0,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn base_unit(&self) -> BaseUnit {
        self.base_unit
    }

    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    /// Tempo, speed and meter in effect. `bar` / `bar_beat` are the musical
    /// position at the last reference point.
    pub fn state(&self) -> &TransportState {
        &self.state
    }

    /// Change the cycle length. Takes effect at `frame`.
    pub fn set_base(&mut self, unit: BaseUnit, value: f64, frame: u64) {
        self.reanchor(frame);
        self.base_unit = unit;
        self.base_value = value;
    }

    /// Apply new tempo, speed and meter from `frame` on. The musical position
    /// carries on from where the old tempo left it; `state.bar` and
    /// `state.bar_beat` are ignored (see [`Transport::relocate`]).
    pub fn update(&mut self, state: TransportState, frame: u64) {
        self.reanchor(frame);
        self.state = TransportState {
            bar: self.state.bar,
            bar_beat: self.state.bar_beat,
            ..state
        };
    }

    /// Jump to a host position at `frame`.
    pub fn relocate(&mut self, bar: i64, bar_beat: f64, frame: u64) {
        self.reanchor(frame);
        self.state.bar = bar;
        self.state.bar_beat = bar_beat;
    }

    /// Stopped transport or nonsense tempo. The engine mutes while halted.
    pub fn is_halted(&self) -> bool {
        self.state.bpm < 1.0 || (self.state.speed == 0.0 && self.base_unit != BaseUnit::Seconds)
    }

    /// Musical position in beats at `frame`.
    pub fn beats_at(&self, frame: u64) -> f64 {
        let elapsed = frame.saturating_sub(self.ref_frame) as f64;
        self.state.beats() + elapsed * self.state.speed * self.state.bpm / (60.0 * self.sample_rate)
    }

    /// Cyclic position at `frame`, in `[0, 1)`.
    pub fn position(&self, frame: u64) -> f64 {
        let base = if self.base_value > 0.0 {
            self.base_value
        } else {
            1.0
        };

        let cycles = match self.base_unit {
            BaseUnit::Seconds => {
                let elapsed = frame.saturating_sub(self.ref_frame) as f64;
                self.ref_cycle + elapsed / (self.sample_rate * base)
            }
            BaseUnit::Beats => self.beats_at(frame) / base,
            BaseUnit::Bars => {
                let beats_per_bar = if self.state.beats_per_bar > 0.0 {
                    self.state.beats_per_bar
                } else {
                    4.0
                };
                self.beats_at(frame) / beats_per_bar / base
            }
        };

        let pos = cycles.rem_euclid(1.0);
        // rem_euclid can round up to exactly 1.0 for tiny negative inputs
        if pos >= 1.0 {
            0.0
        } else {
            pos
        }
    }

    /// Move the reference point to `frame`, keeping the musical position.
    fn reanchor(&mut self, frame: u64) {
        if self.base_unit == BaseUnit::Seconds {
            self.ref_cycle = self.position(frame);
        } else {
            self.ref_cycle = 0.0;
        }

        let beats = self.beats_at(frame);
        let beats_per_bar = if self.state.beats_per_bar > 0.0 {
            self.state.beats_per_bar
        } else {
            4.0
        };
        let bar = (beats / beats_per_bar).floor();
        self.state.bar = bar as i64;
        self.state.bar_beat = beats - bar * beats_per_bar;
        self.ref_frame = frame;
    }
}
