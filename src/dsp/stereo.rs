//! Stateless stereo primitives driven by an envelope value.

use std::ops::{Add, AddAssign, Mul};

/*
Stereo Methods
==============

Every method takes one stereo frame and one envelope value `v` and returns one
stereo frame. Nothing here keeps state between samples.

| method  | v range    | output                                          |
| ------- | ---------- | ----------------------------------------------- |
| level   | 0 .. 1     | (L v, R v)                                      |
| gain    | -70 .. 30  | (L g, R g),  g = 10^(v/20)                      |
| balance | -1 .. 1    | v < 0: (L + (-v) R, R (1 + v))                  |
|         |            | v >= 0: (L (1 - v), R + v L)                    |
| width   | 0 .. 4     | m = (L + R)/2, s = (L - R) v/2, (m + s, m - s)  |

Balance moves signal from one side to the other rather than just attenuating
it, so a hard-panned balance keeps the full mono sum:

    v = -1:  (L + R, 0)
    v =  0:  (L, R)
    v = +1:  (0, R + L)

Width scales the side signal. v = 0 collapses to mono, v = 1 leaves the frame
unchanged, v > 1 widens.
*/

/// One stereo sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    pub const SILENCE: Frame = Frame {
        left: 0.0,
        right: 0.0,
    };

    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Same value on both channels.
    pub const fn mono(value: f32) -> Self {
        Self::new(value, value)
    }

    pub fn min_sample(self) -> f32 {
        self.left.min(self.right)
    }

    pub fn max_sample(self) -> f32 {
        self.left.max(self.right)
    }
}

impl Add for Frame {
    type Output = Frame;

    fn add(self, rhs: Frame) -> Frame {
        Frame::new(self.left + rhs.left, self.right + rhs.right)
    }
}

impl AddAssign for Frame {
    fn add_assign(&mut self, rhs: Frame) {
        self.left += rhs.left;
        self.right += rhs.right;
    }
}

impl Mul<f32> for Frame {
    type Output = Frame;

    fn mul(self, rhs: f32) -> Frame {
        Frame::new(self.left * rhs, self.right * rhs)
    }
}

/// Convert decibels to a linear factor.
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

#[inline]
pub fn level(frame: Frame, value: f64) -> Frame {
    frame * value as f32
}

/// Gain in dB.
#[inline]
pub fn gain(frame: Frame, db: f64) -> Frame {
    frame * db_to_gain(db) as f32
}

#[inline]
pub fn balance(frame: Frame, value: f64) -> Frame {
    let v = value as f32;
    if v < 0.0 {
        Frame::new(frame.left - v * frame.right, frame.right * (1.0 + v))
    } else {
        Frame::new(frame.left * (1.0 - v), frame.right + v * frame.left)
    }
}

#[inline]
pub fn width(frame: Frame, value: f64) -> Frame {
    let mid = (frame.left + frame.right) * 0.5;
    let side = (frame.left - frame.right) * value as f32 * 0.5;
    Frame::new(mid + side, mid - side)
}

/// Linear crossfade from `dry` (0.0) to `wet` (1.0).
#[inline]
pub fn blend_dry_wet(dry: Frame, wet: Frame, mix: f32) -> Frame {
    dry * (1.0 - mix) + wet * mix
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Frame = Frame::new(0.5, -0.25);

    #[test]
    fn test_level_scales_both_channels() {
        assert_eq!(level(FRAME, 0.5), Frame::new(0.25, -0.125));
        assert_eq!(level(FRAME, 0.0), Frame::SILENCE);
    }

    #[test]
    fn test_gain_in_db() {
        assert_eq!(gain(FRAME, 0.0), FRAME);
        let quieter = gain(FRAME, -6.0);
        assert!((quieter.left - 0.5 * 0.501_187).abs() < 1e-5);
        assert!((db_to_gain(20.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_balance_moves_signal_across() {
        let frame = Frame::new(0.25, 0.5);
        assert_eq!(balance(frame, 0.0), frame);
        assert_eq!(balance(frame, -1.0), Frame::new(0.75, 0.0));
        assert_eq!(balance(frame, 1.0), Frame::new(0.0, 0.75));
        assert_eq!(balance(frame, -0.5), Frame::new(0.5, 0.25));
    }

    #[test]
    fn test_width() {
        assert_eq!(width(FRAME, 1.0), FRAME);
        assert_eq!(width(FRAME, 0.0), Frame::mono(0.125));
        // Doubled side signal
        assert_eq!(width(FRAME, 2.0), Frame::new(0.875, -0.625));
    }

    #[test]
    fn test_blend_dry_wet() {
        let wet = Frame::new(1.0, 1.0);
        assert_eq!(blend_dry_wet(FRAME, wet, 0.0), FRAME);
        assert_eq!(blend_dry_wet(FRAME, wet, 1.0), wet);
        assert_eq!(blend_dry_wet(Frame::SILENCE, wet, 0.25), Frame::mono(0.25));
    }

    #[test]
    fn test_frame_extrema() {
        assert_eq!(FRAME.min_sample(), -0.25);
        assert_eq!(FRAME.max_sample(), 0.5);
    }
}
