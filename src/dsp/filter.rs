use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::F_ORDER;

/*
Butterworth Cascade
===================

An order-N Butterworth filter is built from N/2 two-pole sections in series.
Each section is a bilinear-transformed analog biquad whose pole pair sits on
the Butterworth circle.

Vocabulary
----------

  cutoff      The -3 dB frequency of the whole cascade.

  section     One two-pole stage. Section i owns the pole pair at angle
              r_i = sin(pi * (2i + 1) / (2N)).

  history     Two delay cells per section (buffer1 = w[n-1],
              buffer2 = w[n-2]). They persist between samples even though the
              coefficients are recomputed on every call.


The Math
--------

    a   = tan(pi * f / rate)          prewarped cutoff
    s   = a^2 + 2 a r + 1
    c1  = 2 (1 - a^2) / s
    c2  = -(a^2 - 2 a r + 1) / s

    w0  = x + c1 w1 + c2 w2           recursive part, shared
    LP: c0 = a^2 / s,  y = c0 (w0 + 2 w1 + w2)
    HP: c0 = 1 / s,    y = c0 (w0 - 2 w1 + w2)

    w2 <- w1 <- w0

The output of section i is the input of section i + 1.

| type      | c0       | zeros at | DC gain | Nyquist gain |
| --------- | -------- | -------- | ------- | ------------ |
| low-pass  | a^2 / s  | z = -1   | 1       | 0            |
| high-pass | 1 / s    | z = +1   | 0       | 1            |

Coefficients are cheap enough to recompute per sample, which lets the
envelope sweep the cutoff at audio rate. History is only cleared by an explicit
reset (transport stop, invalid tempo, method change).
*/

/// Number of cascaded two-pole sections.
pub const SECTIONS: usize = F_ORDER / 2;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
}

/// Coefficients `(c0, c1, c2)` of section `index` for the given cutoff.
#[inline]
pub fn section_coefficients(
    kind: FilterKind,
    cutoff_hz: f64,
    sample_rate: f64,
    index: usize,
) -> (f64, f64, f64) {
    let a = (PI * cutoff_hz / sample_rate).tan();
    let a2 = a * a;
    let r = (PI * (2.0 * index as f64 + 1.0) / (2.0 * F_ORDER as f64)).sin();
    let s = a2 + 2.0 * a * r + 1.0;

    let c0 = match kind {
        FilterKind::LowPass => a2 / s,
        FilterKind::HighPass => 1.0 / s,
    };
    let c1 = 2.0 * (1.0 - a2) / s;
    let c2 = -(a2 - 2.0 * a * r + 1.0) / s;

    (c0, c1, c2)
}

/// One channel of an `F_ORDER` Butterworth low-pass or high-pass filter.
#[derive(Debug, Clone)]
pub struct ButterworthFilter {
    kind: FilterKind,
    buffer1: [f64; SECTIONS],
    buffer2: [f64; SECTIONS],
}

impl ButterworthFilter {
    pub fn new(kind: FilterKind) -> Self {
        Self {
            kind,
            buffer1: [0.0; SECTIONS],
            buffer2: [0.0; SECTIONS],
        }
    }

    pub fn lowpass() -> Self {
        Self::new(FilterKind::LowPass)
    }

    pub fn highpass() -> Self {
        Self::new(FilterKind::HighPass)
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Switch response. History is kept; callers reset when needed.
    pub fn set_kind(&mut self, kind: FilterKind) {
        self.kind = kind;
    }

    /// Filter one sample at `cutoff_hz`. The cutoff is used as given; clamp it
    /// below Nyquist before calling.
    #[inline]
    pub fn next_sample(&mut self, sample: f32, cutoff_hz: f64, sample_rate: f64) -> f32 {
        let mut x = sample as f64;

        for i in 0..SECTIONS {
            let (c0, c1, c2) = section_coefficients(self.kind, cutoff_hz, sample_rate, i);
            let w1 = self.buffer1[i];
            let w2 = self.buffer2[i];
            let w0 = x + c1 * w1 + c2 * w2;

            x = match self.kind {
                FilterKind::LowPass => c0 * (w0 + 2.0 * w1 + w2),
                FilterKind::HighPass => c0 * (w0 - 2.0 * w1 + w2),
            };

            self.buffer2[i] = w1;
            self.buffer1[i] = w0;
        }

        x as f32
    }

    /// Filter a block in place at a fixed cutoff.
    pub fn render(&mut self, buffer: &mut [f32], cutoff_hz: f64, sample_rate: f64) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, cutoff_hz, sample_rate);
        }
    }

    /// Zero the history of every section.
    pub fn reset(&mut self) {
        self.buffer1 = [0.0; SECTIONS];
        self.buffer2 = [0.0; SECTIONS];
    }

    /// True if every history cell is zero.
    pub fn is_cleared(&self) -> bool {
        self.buffer1.iter().chain(self.buffer2.iter()).all(|&w| w == 0.0)
    }
}
