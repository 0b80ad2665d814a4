//! Per-stage signal extrema over the cycle, for drawing level overlays.

use crate::{dsp::Frame, MONITOR_BUCKETS};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorBucket {
    pub input_min: f32,
    pub input_max: f32,
    pub output_min: f32,
    pub output_max: f32,
    /// Set once the bucket has seen at least one sample since its last reset.
    pub touched: bool,
}

impl MonitorBucket {
    const EMPTY: MonitorBucket = MonitorBucket {
        input_min: 0.0,
        input_max: 0.0,
        output_min: 0.0,
        output_max: 0.0,
        touched: false,
    };

    fn record(&mut self, input: Frame, output: Frame) {
        if self.touched {
            self.input_min = self.input_min.min(input.min_sample());
            self.input_max = self.input_max.max(input.max_sample());
            self.output_min = self.output_min.min(output.min_sample());
            self.output_max = self.output_max.max(output.max_sample());
        } else {
            self.input_min = input.min_sample();
            self.input_max = input.max_sample();
            self.output_min = output.min_sample();
            self.output_max = output.max_sample();
            self.touched = true;
        }
    }
}

/// `MONITOR_BUCKETS` buckets indexed by `floor(position * MONITOR_BUCKETS)`.
/// A bucket is cleared when the position enters it, so each one shows the
/// most recent pass of the cycle.
#[derive(Debug, Clone)]
pub struct Monitor {
    buckets: [MonitorBucket; MONITOR_BUCKETS],
    current: Option<usize>,
}

impl Monitor {
    pub fn new() -> Self {
        Self {
            buckets: [MonitorBucket::EMPTY; MONITOR_BUCKETS],
            current: None,
        }
    }

    pub fn record(&mut self, position: f64, input: Frame, output: Frame) {
        let index = ((position * MONITOR_BUCKETS as f64) as usize).min(MONITOR_BUCKETS - 1);
        if self.current != Some(index) {
            self.buckets[index] = MonitorBucket::EMPTY;
            self.current = Some(index);
        }
        self.buckets[index].record(input, output);
    }

    pub fn buckets(&self) -> &[MonitorBucket; MONITOR_BUCKETS] {
        &self.buckets
    }

    pub fn bucket(&self, index: usize) -> Option<&MonitorBucket> {
        self.buckets.get(index)
    }

    pub fn reset(&mut self) {
        self.buckets = [MonitorBucket::EMPTY; MONITOR_BUCKETS];
        self.current = None;
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}
