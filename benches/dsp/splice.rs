//! Benchmarks for the splice-seeking ring buffer.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use shaper_dsp::dsp::{splice::delay_frames, AudioBuffer};

use crate::{test_signal, BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_splice(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/splice");

    for &size in BLOCK_SIZES {
        let signal = test_signal(size);

        for semitones in [-12.0, 7.0] {
            let mut buffer = AudioBuffer::for_pitch();
            let id = BenchmarkId::new(format!("pitch_{semitones}"), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| {
                    let mut last = 0.0;
                    for &x in &signal {
                        last = buffer.pitch(black_box(x), semitones);
                    }
                    last
                })
            });
        }

        let mut steady = AudioBuffer::for_delay(SAMPLE_RATE);
        let frames = delay_frames(250.0, SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("delay_steady", size), &size, |b, _| {
            b.iter(|| {
                let mut last = 0.0;
                for &x in &signal {
                    last = steady.delay(black_box(x), frames);
                }
                last
            })
        });

        // Every sample asks for a different delay, forcing splice searches
        let mut moving = AudioBuffer::for_delay(SAMPLE_RATE);
        let mut ms = 100.0;
        group.bench_with_input(BenchmarkId::new("delay_moving", size), &size, |b, _| {
            b.iter(|| {
                let mut last = 0.0;
                for &x in &signal {
                    ms = if ms >= 900.0 { 100.0 } else { ms + 0.5 };
                    last = moving.delay(black_box(x), delay_frames(ms, SAMPLE_RATE));
                }
                last
            })
        });
    }

    group.finish();
}
