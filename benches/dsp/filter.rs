//! Benchmarks for the Butterworth cascade.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use shaper_dsp::dsp::ButterworthFilter;

use crate::{test_signal, BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        let signal = test_signal(size);
        let mut buffer = signal.clone();

        let mut lowpass = ButterworthFilter::lowpass();
        group.bench_with_input(BenchmarkId::new("lowpass_fixed", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&signal);
                lowpass.render(black_box(&mut buffer), 1_000.0, SAMPLE_RATE)
            })
        });

        // Coefficients recomputed every sample, as under a moving envelope
        let mut highpass = ButterworthFilter::highpass();
        group.bench_with_input(BenchmarkId::new("highpass_swept", size), &size, |b, &size| {
            b.iter(|| {
                let mut last = 0.0;
                for (i, &x) in signal.iter().enumerate() {
                    let cutoff = 100.0 + 4_000.0 * i as f64 / size as f64;
                    last = highpass.next_sample(black_box(x), cutoff, SAMPLE_RATE);
                }
                last
            })
        });
    }

    group.finish();
}
