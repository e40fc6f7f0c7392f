//! Benchmarks for the built-in renderers.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use swarm_synth::dsp::{FmRenderer, KarplusRenderer, Oscillator, Shape, VoiceParams, WaveRenderer};
use swarm_synth::synth::VoiceState;
use swarm_synth::Wave;

use crate::BLOCK_SIZES;

fn params(wave: Wave) -> VoiceParams {
    let voice = VoiceState {
        wave,
        freq: 220.0,
        velocity: 1.0,
        ..VoiceState::default()
    };
    VoiceParams::base(0, &voice)
}

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for shape in Shape::ALL {
            let mut osc = Oscillator::new(shape, 44_100.0, 1);
            let voice = params(shape.wave());
            let name = format!("{shape:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| osc.render(black_box(&mut buffer), black_box(&voice)))
            });
        }

        let voice = params(Wave::Karplus);
        let mut string = KarplusRenderer::new(44_100.0, 1);
        string.note_on(&voice);
        group.bench_with_input(BenchmarkId::new("karplus", size), &size, |b, _| {
            b.iter(|| string.render(black_box(&mut buffer), black_box(&voice)))
        });

        let voice = params(Wave::Fm);
        let mut fm = FmRenderer::new(44_100.0, 1);
        fm.note_on(&voice);
        group.bench_with_input(BenchmarkId::new("fm", size), &size, |b, _| {
            b.iter(|| fm.render(black_box(&mut buffer), black_box(&voice)))
        });
    }

    group.finish();
}
