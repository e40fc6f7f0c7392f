//! Node runner: ingest on its own thread, rendering on this one.

use std::thread;
use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, Result, WrapErr};
use rtrb::RingBuffer;
use tracing::info;

use swarm_synth::engine::{NullSink, OutputSink};
use swarm_synth::io::CpalSink;
use swarm_synth::net::MulticastTransport;
use swarm_synth::{Engine, Ingest, MonotonicClock, NodeConfig, RunFlag, Scheduled};

/// Wraps a sink that never blocks so the render loop still runs at the
/// block rate.
struct Paced<S> {
    inner: S,
    period: Duration,
    next: Instant,
}

impl<S> Paced<S> {
    fn new(inner: S, period: Duration) -> Self {
        Self {
            inner,
            period,
            next: Instant::now(),
        }
    }
}

impl<S: OutputSink> OutputSink for Paced<S> {
    fn write(&mut self, samples: &[i16]) -> usize {
        let n = self.inner.write(samples);
        self.next += self.period;
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
        } else {
            self.next = now;
        }
        n
    }

    fn starved_frames(&self) -> u64 {
        self.inner.starved_frames()
    }
}

fn open_sink(config: &NodeConfig, audio: bool) -> Result<Box<dyn OutputSink>> {
    if audio {
        let sink = CpalSink::open(&config.audio).wrap_err("failed to open audio output")?;
        return Ok(Box::new(sink));
    }
    let period = Duration::from_secs_f64(
        config.audio.block_size as f64 / f64::from(config.audio.sample_rate),
    );
    info!("rendering without audio output");
    Ok(Box::new(Paced::new(NullSink, period)))
}

pub fn run(config: &NodeConfig, audio: bool) -> Result<()> {
    let running = RunFlag::new();
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("stopping");
        r.stop();
    })
    .wrap_err("failed to install Ctrl+C handler")?;

    let clock = MonotonicClock::new();
    let (tx, rx) = RingBuffer::<Scheduled>::new(config.audio.queue_len);

    let transport = MulticastTransport::join(&config.network).wrap_err("failed to join swarm")?;
    let mut ingest = Ingest::new(config, tx);
    let max_datagram = config.network.max_datagram;
    let ingest_flag = running.clone();
    let ingest_thread = thread::Builder::new()
        .name("ingest".into())
        .spawn(move || ingest.run(&transport, &clock, &ingest_flag, max_datagram))
        .wrap_err("failed to start ingest thread")?;

    let mut sink = open_sink(config, audio)?;
    let mut engine = Engine::new(&config.audio, clock, rx);
    info!(
        address = config.node.address,
        voices = config.audio.voices,
        sample_rate = config.audio.sample_rate,
        block = config.audio.block_size,
        "node running, press Ctrl+C to stop"
    );

    if config.node.chimes {
        engine.cue_chime(true);
    }
    while running.is_running() {
        engine.render_block(sink.as_mut());
    }
    if config.node.chimes {
        engine.cue_chime(false);
        engine.render_for(1.0, sink.as_mut());
    }

    ingest_thread
        .join()
        .map_err(|_| eyre!("ingest thread panicked"))?;
    info!(
        blocks = engine.blocks_rendered(),
        underruns = engine.underruns(),
        dropped = engine.queue().dropped(),
        starved = sink.starved_frames(),
        "node stopped"
    );
    Ok(())
}
