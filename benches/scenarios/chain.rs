//! Benchmarks for engine blocks with growing stage chains.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use shaper_dsp::{
    engine::{Controller, InputSource, Method, OutputRoute, StageParam},
    shape::{Node, NodeType},
    EngineConfig, ShaperEngine, MAX_SHAPES,
};

use crate::{test_signal, BLOCK_SIZES, SAMPLE_RATE};

/// Stage 0 plus `extra` stages, each reading the previous one.
fn chain(extra: usize) -> ShaperEngine {
    let mut engine = ShaperEngine::new(EngineConfig::with_sample_rate(SAMPLE_RATE));
    let methods = [Method::Level, Method::LowPassLog, Method::Pitch, Method::Delay];

    for (stage, &method) in methods.iter().enumerate().take(extra + 1) {
        engine
            .set_method(stage, method)
            .unwrap_or_else(|err| panic!("bench setup: {err}"));
        if stage > 0 {
            engine
                .set_input_source(stage, InputSource::Stage(stage - 1))
                .unwrap_or_else(|err| panic!("bench setup: {err}"));
        }
        let limits = engine.config().method_limits(method);
        let mid = 0.5 * (limits.min + limits.max);
        engine.load_shape(
            stage,
            &[
                Node::end(0.0, limits.max),
                Node::at(NodeType::AutoSmooth, 0.5, mid),
                Node::end(1.0, limits.max),
            ],
        );
    }

    // Only the last stage feeds the bus
    for stage in 0..MAX_SHAPES {
        let route = if stage == extra {
            OutputRoute::Bus
        } else {
            OutputRoute::Internal
        };
        let _ = engine.set_controller(
            Controller::stage(stage, StageParam::Output),
            route.code() as f32,
        );
    }
    engine
}

pub fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/chain");

    for &size in BLOCK_SIZES {
        let signal = test_signal(size);
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        for extra in 0..MAX_SHAPES {
            let mut engine = chain(extra);
            let id = BenchmarkId::new(format!("stages_{}", extra + 1), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| {
                    engine.process(
                        [black_box(&signal[..]), black_box(&signal[..])],
                        [&mut left[..], &mut right[..]],
                    )
                })
            });
        }
    }

    group.finish();
}
