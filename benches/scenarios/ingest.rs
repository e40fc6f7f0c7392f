//! Benchmarks for the per-datagram path: decode, translate, route, hand off.

use std::hint::black_box;

use criterion::Criterion;
use rtrb::RingBuffer;
use swarm_synth::{decode, Ingest, NodeConfig, Scheduled};

const NOTE: &[u8] = b"v2w1n60l1t1000";
const FULL: &[u8] = b"t123456v3w2d0.3b0.99f220.5n57p4c300l0.8a0.9V0.7R2F1200A10,200,0.4,300T9";

pub fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/ingest");

    group.bench_function("decode_note", |b| b.iter(|| decode(black_box(NOTE))));
    group.bench_function("decode_full", |b| b.iter(|| decode(black_box(FULL))));

    let (tx, mut rx) = RingBuffer::<Scheduled>::new(1_024);
    let mut ingest = Ingest::new(&NodeConfig::default(), tx);
    group.bench_function("handle_note", |b| {
        b.iter(|| {
            let outcome = ingest.handle(black_box(NOTE), black_box(500));
            // keep the ring from filling up
            let _ = rx.pop();
            outcome
        })
    });

    group.finish();
}
