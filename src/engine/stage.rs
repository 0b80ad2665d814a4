//! One shaper stage: a shape, a method and the DSP state the method needs.

use crate::{
    dsp::{
        splice::delay_frames,
        stereo::{self, Frame},
        AudioBuffer, ButterworthFilter, FilterKind,
    },
    engine::{
        config::{InputSource, Method, MethodLimits, OutputRoute},
        monitor::Monitor,
    },
    shape::Shape,
};

/// Filter cutoffs stay below this fraction of the sample rate.
const MAX_CUTOFF_RATIO: f64 = 0.45;
const MIN_CUTOFF_HZ: f64 = 20.0;
const MAX_CUTOFF_HZ: f64 = 20_000.0;

pub struct Stage {
    pub(crate) shape: Shape,
    pub(crate) input: InputSource,
    pub(crate) input_amp: f32,
    pub(crate) method: Method,
    pub(crate) dry_wet: f32,
    pub(crate) output: OutputRoute,
    pub(crate) output_amp: f32,
    filters: [ButterworthFilter; 2],
    pitch: [AudioBuffer; 2],
    delay: [AudioBuffer; 2],
    monitor: Monitor,
}

impl Stage {
    pub fn new(method: Method, limits: MethodLimits, sample_rate: f64) -> Self {
        let kind = method.filter_kind().unwrap_or(FilterKind::LowPass);
        Self {
            shape: Shape::new(limits.default_end),
            input: InputSource::Off,
            input_amp: 1.0,
            method,
            dry_wet: 1.0,
            output: OutputRoute::Internal,
            output_amp: 1.0,
            filters: [ButterworthFilter::new(kind), ButterworthFilter::new(kind)],
            pitch: [AudioBuffer::for_pitch(), AudioBuffer::for_pitch()],
            delay: [
                AudioBuffer::for_delay(sample_rate),
                AudioBuffer::for_delay(sample_rate),
            ],
            monitor: Monitor::new(),
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn input(&self) -> InputSource {
        self.input
    }

    pub fn output(&self) -> OutputRoute {
        self.output
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    /// Splices performed by the pitch or delay buffers, both channels.
    pub fn splice_count(&self) -> u64 {
        self.pitch
            .iter()
            .chain(self.delay.iter())
            .map(AudioBuffer::splice_count)
            .sum()
    }

    /// Switch method. DSP state restarts from silence; an untouched shape is
    /// redrawn at the new method's default value.
    pub fn set_method(&mut self, method: Method, limits: MethodLimits) {
        let was_default = self.shape.is_default();
        self.method = method;
        self.shape.set_default_end(limits.default_end);
        if was_default {
            self.shape.set_default_shape();
        }

        if let Some(kind) = method.filter_kind() {
            for filter in &mut self.filters {
                filter.set_kind(kind);
            }
        }
        self.reset_dsp();
    }

    /// Clear filter history and splice buffers.
    pub fn reset_dsp(&mut self) {
        self.clear_filters();
        for buffer in self.pitch.iter_mut().chain(self.delay.iter_mut()) {
            buffer.reset();
        }
    }

    pub fn clear_filters(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    /// Envelope value at `position`, clamped to the method range.
    #[inline]
    pub fn envelope(&self, position: f64, limits: &MethodLimits) -> f64 {
        limits.clamp(self.shape.get_map_value(position))
    }

    /// Run one frame through the method and the dry/wet mix. Returns the
    /// stage result before the output amplitude.
    #[inline]
    pub fn process_frame(
        &mut self,
        input: Frame,
        position: f64,
        limits: &MethodLimits,
        sample_rate: f64,
    ) -> Frame {
        let value = self.envelope(position, limits);

        let wet = match self.method {
            Method::Level => stereo::level(input, value),
            Method::Gain => stereo::gain(input, value),
            Method::Balance => stereo::balance(input, value),
            Method::Width => stereo::width(input, value),
            Method::LowPass | Method::HighPass | Method::LowPassLog | Method::HighPassLog => {
                let hz = if self.method.is_log() {
                    10f64.powf(value)
                } else {
                    value
                };
                let cutoff = hz
                    .clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ)
                    .min(MAX_CUTOFF_RATIO * sample_rate);
                let [left, right] = &mut self.filters;
                Frame::new(
                    left.next_sample(input.left, cutoff, sample_rate),
                    right.next_sample(input.right, cutoff, sample_rate),
                )
            }
            Method::Pitch => {
                let [left, right] = &mut self.pitch;
                Frame::new(left.pitch(input.left, value), right.pitch(input.right, value))
            }
            Method::Delay => {
                let frames = delay_frames(value, sample_rate);
                let [left, right] = &mut self.delay;
                Frame::new(left.delay(input.left, frames), right.delay(input.right, frames))
            }
        };

        let out = stereo::blend_dry_wet(input, wet, self.dry_wet);
        self.monitor.record(position, input, out * self.output_amp);
        out
    }
}
