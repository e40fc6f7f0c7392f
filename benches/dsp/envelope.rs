//! Benchmarks for ADSR evaluation.
//!
//! The envelope is evaluated once per voice per block, so this is measured
//! per call across all stages rather than per sample.

use std::hint::black_box;

use criterion::Criterion;
use swarm_synth::synth::{adsr_scale, Adsr};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let adsr = Adsr::default();

    group.bench_function("attack", |b| {
        b.iter(|| adsr_scale(black_box(1_020), Some(1_000), None, black_box(&adsr)))
    });
    group.bench_function("sustain", |b| {
        b.iter(|| adsr_scale(black_box(9_000), Some(1_000), None, black_box(&adsr)))
    });
    group.bench_function("release", |b| {
        b.iter(|| adsr_scale(black_box(1_010), None, Some(1_000), black_box(&adsr)))
    });

    // a full swarm's worth of voices, as the mixer does each block
    let clocks: Vec<i64> = (0..10).map(|v| v * 37).collect();
    group.bench_function("ten_voices", |b| {
        b.iter(|| {
            clocks
                .iter()
                .map(|&on| adsr_scale(black_box(300), Some(on), None, &adsr))
                .sum::<f32>()
        })
    });

    group.finish();
}
