//! Full-engine block rendering with every voice busy.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use swarm_synth::config::AudioSection;
use swarm_synth::engine::{NoInbox, NullSink};
use swarm_synth::{Engine, Event, ManualClock, ModTargets, Scheduled, Wave};

use crate::BLOCK_SIZES;

fn busy_engine(block_size: usize, filtered: bool) -> Engine<ManualClock, NoInbox> {
    let audio = AudioSection {
        block_size,
        ..AudioSection::default()
    };
    let mut engine = Engine::new(&audio, ManualClock::new(0), NoInbox);
    let waves = [
        Wave::Sine,
        Wave::Pulse,
        Wave::Saw,
        Wave::Triangle,
        Wave::Noise,
        Wave::Fm,
        Wave::Karplus,
    ];
    for voice in 0..audio.voices as u8 {
        let event = Event {
            wave: Some(waves[voice as usize % waves.len()]),
            midi_note: Some(48 + voice * 3),
            velocity: Some(1.0),
            amp: Some(0.1),
            mod_target: Some(ModTargets::AMP),
            filter_freq: filtered.then_some(2_000.0),
            ..Event::for_voice(voice)
        };
        let _ = engine.schedule(Scheduled::new(0, event));
    }
    engine.render_block(&mut NullSink);
    engine
}

pub fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/render");

    for &size in BLOCK_SIZES {
        let mut engine = busy_engine(size, false);
        group.bench_with_input(BenchmarkId::new("ten_voices", size), &size, |b, _| {
            b.iter(|| engine.render_block(black_box(&mut NullSink)))
        });

        let mut engine = busy_engine(size, true);
        group.bench_with_input(BenchmarkId::new("ten_voices_filtered", size), &size, |b, _| {
            b.iter(|| engine.render_block(black_box(&mut NullSink)))
        });
    }

    group.finish();
}
