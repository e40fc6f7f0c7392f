//! Benchmarks for the post-mix low-pass.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use swarm_synth::dsp::SvfLowpass;

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // sawtooth-like ramp at half scale
        let input: Vec<i16> = (0..size)
            .map(|i| (((i as f32 / size as f32) * 2.0 - 1.0) * 16_000.0) as i16)
            .collect();

        let mut filter = SvfLowpass::new(44_100.0);
        filter.tune(1_000.0, 0.7);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.process(black_box(&mut buffer));
            })
        });

        // retune every block, as happens when an envelope drives the cutoff
        let mut filter = SvfLowpass::new(44_100.0);
        let mut buffer = input.clone();
        let mut cutoff = 200.0f32;
        group.bench_with_input(BenchmarkId::new("retuned", size), &size, |b, _| {
            b.iter(|| {
                cutoff = if cutoff > 8_000.0 { 200.0 } else { cutoff * 1.1 };
                filter.tune(black_box(cutoff), 2.0);
                buffer.copy_from_slice(&input);
                filter.process(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
