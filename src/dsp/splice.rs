use std::ops::RangeInclusive;

use crate::{FADER_SIZE, MAX_DELAY_MS, PITCH_BUFFER_SIZE, P_ORDER};

/*
Splice-Seeking Ring Buffer
==========================

One circular buffer of recent input frames, one write pointer and two read
pointers. Both pitch-shifting and the modulated delay read from history at a
rate or offset that drifts away from the write pointer. Sooner or later the
reader has to jump. Jumping to an arbitrary frame clicks, so the jump target is
chosen by comparing the waveform around the reader with the waveform around
each candidate frame.

Pointers
--------

  w_ptr    next frame to write (integer)
  r_ptr1   pitch: fractional read position
           delay: splice anchor, where r_ptr2 last jumped to
  r_ptr2   delay: integer read position

  lag = (w_ptr - r_ptr1) mod capacity

Readable history is the frames w-cap+1 ..= w. A reader is valid while
0 <= lag < cap-1.


Pitch
-----

    x[w] <- input
    if lag >= cap-1: seek
    out = x[r] (linear interpolation)
    w += 1, r += 2^(semitones/12)

    pitching up   r overtakes w. Seek backwards:  j = w - i, i in [cap/2, cap-FADER]
    pitching down r falls a full buffer behind.
                  Seek forwards:                  j = w - i, i in [FADER, cap/2]

    ratio == 1 and r == w at start: lag stays 0, output == input, no latency.


Overlay score
-------------

    score(j) = (x[r] - x[j])^2
             + sum_k  1/(k+1) * ( (s_r - s_j-)^2 + (s_j+ - s_r)^2 )

    d     = 2^k, k in 0..P_ORDER   (1, 2, 4, 8, 16, 32)
    s_j-  = (x[j] - x[j-d]) / d
    s_j+  = (x[j+d] - x[j]) / d
    s_r   measured on the side of r that holds history

The scan keeps the lowest score and bails out of a candidate as soon as its
running score exceeds the best so far. Candidates are never compared against
unwritten frames: the guard band FADER_SIZE > 2^(P_ORDER-1) keeps every tap
inside readable history.


Delay
-----

    x[w] <- input
    out = x[r2]
    once r2 has travelled max(delay, FADER) frames past the anchor:
        target = w - delay
        j in target +/- FADER, inside [w - cap + FADER, w]
        r2, anchor <- best j
    w += 1, r2 += 1

Between splices the lag is constant, so the output is an exact copy of past
input. After a splice the lag is within FADER frames of the requested delay.
*/

const WEIGHTS: [f32; P_ORDER] = {
    let mut weights = [0.0; P_ORDER];
    let mut k = 0;
    while k < P_ORDER {
        weights[k] = 1.0 / (k as f32 + 1.0);
        k += 1;
    }
    weights
};

/// Slopes of one frame at tap distances 1, 2, 4, ...
type Slopes = [f32; P_ORDER];

/// The waveform around the reader that candidates are compared against.
struct Overlay {
    value: f32,
    before: Slopes,
    after: Slopes,
}

impl Overlay {
    /// Reader with history on one side only: the same slopes are compared
    /// against both sides of every candidate.
    fn one_sided(value: f32, slopes: Slopes) -> Self {
        Self {
            value,
            before: slopes,
            after: slopes,
        }
    }
}

/// Convert a delay time to frames.
#[inline]
pub fn delay_frames(delay_ms: f64, sample_rate: f64) -> f64 {
    delay_ms * sample_rate / 1000.0
}

#[derive(Debug, Clone)]
pub struct AudioBuffer {
    buffer: Vec<f32>,
    w_ptr: usize,
    r_ptr1: f64,
    r_ptr2: usize,
    splices: u64,
}

impl AudioBuffer {
    /// Ring buffer of `capacity` frames. Anything smaller than four guard
    /// bands is raised to that.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(4 * FADER_SIZE);
        Self {
            buffer: vec![0.0; capacity],
            w_ptr: 0,
            r_ptr1: 0.0,
            r_ptr2: 0,
            splices: 0,
        }
    }

    /// Buffer sized for the pitch shifter.
    pub fn for_pitch() -> Self {
        Self::new(PITCH_BUFFER_SIZE)
    }

    /// Buffer sized for the longest delay at `sample_rate`.
    pub fn for_delay(sample_rate: f64) -> Self {
        let max_frames = delay_frames(MAX_DELAY_MS, sample_rate).ceil().max(0.0) as usize;
        Self::new(max_frames + 2 * FADER_SIZE)
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of splices performed since construction or the last reset.
    pub fn splice_count(&self) -> u64 {
        self.splices
    }

    /// Longest delay in frames this buffer can hold.
    pub fn max_delay_frames(&self) -> usize {
        self.capacity() - 2 * FADER_SIZE
    }

    /// Frames between the write pointer and the delay reader.
    pub fn delay_lag(&self) -> usize {
        let cap = self.capacity();
        (self.w_ptr + cap - self.r_ptr2) % cap
    }

    /// Frames between the write pointer and the pitch reader.
    pub fn pitch_lag(&self) -> f64 {
        (self.w_ptr as f64 - self.r_ptr1).rem_euclid(self.capacity() as f64)
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.w_ptr = 0;
        self.r_ptr1 = 0.0;
        self.r_ptr2 = 0;
        self.splices = 0;
    }

    /// Pitch-shift one frame by `semitones`.
    pub fn pitch(&mut self, sample: f32, semitones: f64) -> f32 {
        let cap = self.capacity();
        let ratio = (semitones / 12.0).exp2();

        self.buffer[self.w_ptr] = sample;

        let lag = self.pitch_lag();
        if lag >= (cap - 1) as f64 {
            if ratio >= 1.0 {
                self.seek_backward(lag);
            } else {
                self.seek_forward(lag);
            }
        }

        let out = self.read_interpolated(self.r_ptr1);

        self.w_ptr = (self.w_ptr + 1) % cap;
        self.r_ptr1 = (self.r_ptr1 + ratio).rem_euclid(cap as f64);

        out
    }

    /// Delay one frame by roughly `delay_frames`. Delays longer than
    /// [`AudioBuffer::max_delay_frames`] are shortened.
    pub fn delay(&mut self, sample: f32, delay_frames: f64) -> f32 {
        let cap = self.capacity();
        let delay = if delay_frames.is_finite() {
            (delay_frames.round().max(0.0) as usize).min(self.max_delay_frames())
        } else {
            0
        };

        self.buffer[self.w_ptr] = sample;

        let travelled = (self.r_ptr2 as f64 - self.r_ptr1).rem_euclid(cap as f64) as usize;
        if travelled >= delay.max(FADER_SIZE) {
            self.seek_delay(delay);
        }

        let out = self.buffer[self.r_ptr2];

        self.w_ptr = (self.w_ptr + 1) % cap;
        self.r_ptr2 = (self.r_ptr2 + 1) % cap;

        out
    }

    /// Reader overtook the writer: jump back half a buffer or more.
    fn seek_backward(&mut self, lag: f64) {
        let cap = self.capacity();
        let w = self.w_ptr as isize;
        let offset = cap as f64 - lag; // (0, 1]
        let slopes = self.backward_slopes(w);
        let overlay = Overlay::one_sided(self.at(w), slopes);

        let best = self.best_candidate(&overlay, w, (cap / 2)..=(cap - FADER_SIZE), None);
        self.r_ptr1 = (best as f64 + offset).rem_euclid(cap as f64);
        self.splices += 1;
    }

    /// Reader fell a whole buffer behind: jump forward to at most half a
    /// buffer of lag.
    fn seek_forward(&mut self, lag: f64) {
        let cap = self.capacity();
        let w = self.w_ptr as isize;
        let oldest = w + 1 - cap as isize;
        let offset = (cap - 1) as f64 - lag; // (-1, 0]
        let slopes = self.forward_slopes(oldest);
        let overlay = Overlay::one_sided(self.at(oldest), slopes);

        let best = self.best_candidate(&overlay, w, FADER_SIZE..=(cap / 2), None);
        self.r_ptr1 = (best as f64 + offset).rem_euclid(cap as f64);
        self.splices += 1;
    }

    fn seek_delay(&mut self, delay: usize) {
        let cap = self.capacity() as isize;
        let w = self.w_ptr as isize;
        let lag = self.delay_lag();
        let reference = w - lag as isize;

        let before = self.backward_slopes(reference);
        let after = std::array::from_fn(|k| {
            let d = 1isize << k;
            if reference + d <= w {
                (self.at(reference + d) - self.at(reference)) / d as f32
            } else {
                before[k]
            }
        });
        let overlay = Overlay {
            value: self.at(reference),
            before,
            after,
        };

        let target = w - delay as isize;
        let newest = (target + FADER_SIZE as isize).min(w);
        let oldest = (target - FADER_SIZE as isize).max(w - cap + FADER_SIZE as isize);
        let window = ((w - newest) as usize)..=((w - oldest) as usize);
        // A reader already inside the window overlays itself perfectly
        let current = window.contains(&lag).then_some(lag);

        let best = self.best_candidate(&overlay, w, window, current);
        if best != self.r_ptr2 {
            self.splices += 1;
        }
        self.r_ptr2 = best;
        self.r_ptr1 = best as f64;
    }

    /// Scan `j = w - i` for every `i` in `distances` and return the wrapped
    /// index of the candidate that overlays best. `first` is scored before
    /// the scan and wins ties.
    fn best_candidate(
        &self,
        overlay: &Overlay,
        w: isize,
        distances: RangeInclusive<usize>,
        first: Option<usize>,
    ) -> usize {
        let mut best_score = f32::INFINITY;
        let mut best = w - *first.as_ref().unwrap_or(distances.start()) as isize;

        for i in first.into_iter().chain(distances) {
            let j = w - i as isize;
            let score = self.overlay_score(overlay, j, w, best_score);
            if score < best_score {
                best_score = score;
                best = j;
            }
        }

        self.wrap(best)
    }

    /// Overlay score of candidate `j`. Forward taps past `newest` are skipped.
    /// Stops early once the running score exceeds `best`.
    #[inline]
    fn overlay_score(&self, overlay: &Overlay, j: isize, newest: isize, best: f32) -> f32 {
        let xj = self.at(j);
        let mut score = (overlay.value - xj) * (overlay.value - xj);

        for k in 0..P_ORDER {
            if score > best {
                break;
            }
            let d = 1isize << k;
            let scale = 1.0 / d as f32;

            let before = overlay.before[k] - (xj - self.at(j - d)) * scale;
            score += WEIGHTS[k] * before * before;

            if j + d <= newest {
                let after = (self.at(j + d) - xj) * scale - overlay.after[k];
                score += WEIGHTS[k] * after * after;
            }
        }

        score
    }

    fn backward_slopes(&self, frame: isize) -> Slopes {
        let x = self.at(frame);
        std::array::from_fn(|k| {
            let d = 1isize << k;
            (x - self.at(frame - d)) / d as f32
        })
    }

    fn forward_slopes(&self, frame: isize) -> Slopes {
        let x = self.at(frame);
        std::array::from_fn(|k| {
            let d = 1isize << k;
            (self.at(frame + d) - x) / d as f32
        })
    }

    #[inline]
    fn wrap(&self, frame: isize) -> usize {
        frame.rem_euclid(self.capacity() as isize) as usize
    }

    #[inline]
    fn at(&self, frame: isize) -> f32 {
        self.buffer[self.wrap(frame)]
    }

    #[inline]
    fn read_interpolated(&self, position: f64) -> f32 {
        let cap = self.capacity();
        let base = position.floor();
        let frac = (position - base) as f32;
        let i0 = (base as usize) % cap;
        let i1 = (i0 + 1) % cap;

        self.buffer[i0] + frac * (self.buffer[i1] - self.buffer[i0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const SAMPLE_RATE: f64 = 48_000.0;

    fn sine(freq: f64, amplitude: f64, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (amplitude * (2.0 * PI * freq * i as f64 / SAMPLE_RATE).sin()) as f32)
            .collect()
    }

    fn max_step(signal: &[f32]) -> f32 {
        signal
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0, f32::max)
    }

    #[test]
    fn unity_pitch_is_exact_and_latency_free() {
        let mut buffer = AudioBuffer::for_pitch();
        let input = sine(440.0, 0.8, 10_000);

        for &x in &input {
            assert_eq!(buffer.pitch(x, 0.0), x);
        }
        assert_eq!(buffer.splice_count(), 0);
    }

    #[test]
    fn pitch_up_splices_without_clicks() {
        let mut buffer = AudioBuffer::for_pitch();
        let input = sine(220.0, 0.5, 48_000);
        let output: Vec<f32> = input.iter().map(|&x| buffer.pitch(x, 7.0)).collect();

        let settled = &output[2 * PITCH_BUFFER_SIZE..];
        let step = max_step(settled);
        assert!(step <= 0.1, "largest step {step}");
        assert!(buffer.splice_count() > 10);
    }

    #[test]
    fn pitch_down_splices_without_clicks() {
        let mut buffer = AudioBuffer::for_pitch();
        let input = sine(220.0, 0.5, 48_000);
        let output: Vec<f32> = input.iter().map(|&x| buffer.pitch(x, -5.0)).collect();

        let settled = &output[2 * PITCH_BUFFER_SIZE..];
        let step = max_step(settled);
        assert!(step <= 0.1, "largest step {step}");
        assert!(buffer.splice_count() > 5);
    }

    #[test]
    fn pitch_reader_stays_in_written_history() {
        let mut buffer = AudioBuffer::for_pitch();
        let cap = buffer.capacity() as f32;
        let mut frame = 0.0f32;

        // A rising ramp makes every read position visible in the output
        for semitones in [12.0, -12.0, 3.0, -7.0, 0.0, 7.0].iter().cycle().take(24) {
            for _ in 0..2_000 {
                frame += 1.0;
                let y = buffer.pitch(frame, *semitones);
                assert!(y <= frame, "read ahead of writer: {y} > {frame}");
                if frame > cap {
                    assert!(y > frame - cap, "read overwritten frame: {y} at {frame}");
                }
            }
        }
    }

    #[test]
    fn pitch_up_raises_frequency() {
        let mut buffer = AudioBuffer::for_pitch();
        let input = sine(200.0, 0.5, 48_000);
        let output: Vec<f32> = input.iter().map(|&x| buffer.pitch(x, 12.0)).collect();

        let crossings = output[24_000..]
            .windows(2)
            .filter(|w| w[0] < 0.0 && w[1] >= 0.0)
            .count();
        // 400 Hz over half a second
        assert!((180..=220).contains(&crossings), "crossings {crossings}");
    }

    #[test]
    fn delay_outputs_past_input_exactly() {
        let mut buffer = AudioBuffer::for_delay(SAMPLE_RATE);
        let delay = delay_frames(10.0, SAMPLE_RATE);
        let input: Vec<f32> = (0..20_000).map(|i| i as f32).collect();

        for (n, &x) in input.iter().enumerate() {
            let y = buffer.delay(x, delay);
            assert_eq!(y.fract(), 0.0);
            assert!(y <= n as f32);
        }
    }

    #[test]
    fn delay_lag_tracks_target() {
        let mut buffer = AudioBuffer::for_delay(SAMPLE_RATE);
        let input = sine(330.0, 0.5, 30_000);
        let target = delay_frames(100.0, SAMPLE_RATE);

        for (n, &x) in input.iter().enumerate() {
            buffer.delay(x, target);
            if n > 2 * target as usize {
                let lag = buffer.delay_lag() as f64;
                assert!(
                    (lag - target).abs() <= FADER_SIZE as f64,
                    "lag {lag} at frame {n}"
                );
            }
        }
    }

    #[test]
    fn steady_delay_stops_splicing() {
        let mut buffer = AudioBuffer::for_delay(SAMPLE_RATE);
        let input = sine(500.0, 0.5, 20_000);
        for &x in &input {
            buffer.delay(x, 960.0);
        }
        let settled = buffer.splice_count();
        let lag = buffer.delay_lag();

        for &x in &input {
            buffer.delay(x, 960.0);
        }
        assert_eq!(buffer.delay_lag(), lag);
        assert_eq!(buffer.splice_count(), settled);
    }

    #[test]
    fn zero_delay_is_passthrough() {
        let mut buffer = AudioBuffer::for_delay(SAMPLE_RATE);
        for i in 0..5_000 {
            let x = (i as f32 * 0.37).sin();
            assert_eq!(buffer.delay(x, 0.0), x);
        }
    }

    #[test]
    fn reset_clears_history_and_pointers() {
        let mut buffer = AudioBuffer::for_pitch();
        for i in 0..3000 {
            buffer.pitch(i as f32, 5.0);
        }
        assert!(buffer.splice_count() > 0);

        buffer.reset();
        assert_eq!(buffer.splice_count(), 0);
        assert_eq!(buffer.pitch_lag(), 0.0);
        assert_eq!(buffer.pitch(0.25, 0.0), 0.25);
    }

    #[test]
    fn small_buffers_are_raised_to_guard_bands() {
        let buffer = AudioBuffer::new(16);
        assert_eq!(buffer.capacity(), 4 * FADER_SIZE);
    }
}
