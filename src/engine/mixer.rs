use tracing::{debug, warn};

use crate::config::AudioSection;
use crate::dsp::{quantize, RendererBank, SvfLowpass, VoiceParams};
use crate::engine::inbox::EventReceiver;
use crate::engine::queue::{EventQueue, QueueFull, Scheduled};
use crate::engine::sink::OutputSink;
use crate::protocol::{Event, ModTargets, Wave};
use crate::synth::{modulate, GlobalMod, Sequencer};
use crate::time::TimeSource;

/// What happened during one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockReport {
    /// Local time the block was rendered at.
    pub now: i64,
    /// Events taken from the inbox this block.
    pub received: usize,
    /// Inbox events dropped because every slot was still waiting.
    pub shed: usize,
    /// Events applied to voice state.
    pub fired: usize,
    pub written: usize,
    pub underrun: bool,
}

/// The audio-render unit.
///
/// Owns the slot pool, voice table, renderers and post-mix kernels. Nothing
/// in here is shared with the network thread except the inbox it drains.
pub struct Engine<C: TimeSource, R: EventReceiver> {
    clock: C,
    inbox: R,
    queue: EventQueue,
    sequencer: Sequencer,
    renderers: RendererBank,
    filter: SvfLowpass,
    mix: Vec<f32>,
    block: Vec<i16>,
    sample_rate: u32,
    blocks: u64,
    underruns: u64,
}

impl<C: TimeSource, R: EventReceiver> Engine<C, R> {
    pub fn new(audio: &AudioSection, clock: C, inbox: R) -> Self {
        let renderers = RendererBank::standard(audio.sample_rate, audio.voices);
        Self::with_renderers(audio, clock, inbox, renderers)
    }

    pub fn with_renderers(audio: &AudioSection, clock: C, inbox: R, renderers: RendererBank) -> Self {
        Self {
            clock,
            inbox,
            queue: EventQueue::with_capacity(audio.queue_len),
            sequencer: Sequencer::new(audio.voices),
            renderers,
            filter: SvfLowpass::new(audio.sample_rate as f32),
            mix: vec![0.0; audio.block_size],
            block: vec![0; audio.block_size],
            sample_rate: audio.sample_rate,
            blocks: 0,
            underruns: 0,
        }
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }

    pub fn blocks_rendered(&self) -> u64 {
        self.blocks
    }

    pub fn underruns(&self) -> u64 {
        self.underruns
    }

    /// Queue an event directly, bypassing the inbox.
    pub fn schedule(&mut self, scheduled: Scheduled) -> Result<(), QueueFull> {
        self.queue.push(scheduled)
    }

    fn pull_inbox(&mut self, report: &mut BlockReport) {
        while let Some(scheduled) = self.inbox.pop() {
            report.received += 1;
            if self.queue.push(scheduled).is_err() {
                report.shed += 1;
            }
        }
    }

    /// Apply every due event. Note gates for FM and plucked voices go to
    /// their renderer straight away.
    fn fire_due(&mut self, now: i64) -> usize {
        let sequencer = &mut self.sequencer;
        let renderers = &mut self.renderers;
        self.queue.drain_due(now, |event| {
            if let Some(trigger) = sequencer.apply(event, now) {
                let index = usize::from(event.voice);
                if let Some(voice) = sequencer.voice(index) {
                    renderers.trigger(trigger, &VoiceParams::base(index, voice));
                }
            }
            if event.volume.is_some() {
                sequencer.log_state();
            }
        })
    }

    /// Render one block into `sink`.
    pub fn render_block<S: OutputSink + ?Sized>(&mut self, sink: &mut S) -> BlockReport {
        let now = self.clock.now_ms();
        let mut report = BlockReport {
            now,
            ..BlockReport::default()
        };

        self.pull_inbox(&mut report);
        report.fired = self.fire_due(now);

        self.mix.fill(0.0);
        let mut global = GlobalMod::snapshot(self.sequencer.global());
        for (index, voice) in self.sequencer.voices().iter().enumerate() {
            let m = modulate(voice, now, &mut global);
            if voice.is_sounding() {
                let params = VoiceParams::modulated(index, voice, &m);
                self.renderers.render(&mut self.mix, &params);
            }
        }

        quantize(&self.mix, self.sequencer.global().volume, &mut self.block);

        if global.filter_enabled() {
            self.filter.tune(global.filter_freq, global.resonance);
            self.filter.process(&mut self.block);
        } else {
            // re-enabling starts from rest, not from a stale tail
            self.filter.reset();
        }

        report.written = sink.write(&self.block);
        if report.written < self.block.len() {
            report.underrun = true;
            self.underruns += 1;
            warn!(
                written = report.written,
                expected = self.block.len(),
                "output underrun"
            );
        }
        self.blocks += 1;
        report
    }

    /// Render enough blocks to cover `seconds`, or a single block when
    /// `seconds` is not positive. Returns the number of underruns.
    pub fn render_for<S: OutputSink + ?Sized>(&mut self, seconds: f32, sink: &mut S) -> usize {
        let blocks = blocks_for(seconds, self.sample_rate, self.block.len());
        (0..blocks)
            .filter(|_| self.render_block(sink).underrun)
            .count()
    }

    /// Schedule a short two-note chime on the last voice, rising or falling.
    pub fn cue_chime(&mut self, rising: bool) {
        let Some(voice) = self.sequencer.voices().len().checked_sub(1) else {
            return;
        };
        let Ok(voice) = u8::try_from(voice) else {
            return;
        };
        let start = self.clock.now_ms();
        let (first, second) = if rising { (220.0, 440.0) } else { (440.0, 220.0) };

        let mut setup = Event {
            wave: Some(Wave::Sine),
            amp: Some(0.6),
            mod_target: Some(ModTargets::AMP),
            ..Event::for_voice(voice)
        };
        setup.adsr.attack = Some(10);
        setup.adsr.decay = Some(120);
        setup.adsr.sustain = Some(0.4);
        setup.adsr.release = Some(150);

        let cues = [
            Scheduled::new(
                start,
                Event {
                    freq: Some(first),
                    velocity: Some(1.0),
                    ..setup
                },
            ),
            Scheduled::new(
                start + 150,
                Event {
                    freq: Some(second),
                    velocity: Some(1.0),
                    ..Event::for_voice(voice)
                },
            ),
            Scheduled::new(
                start + 450,
                Event {
                    velocity: Some(0.0),
                    ..Event::for_voice(voice)
                },
            ),
        ];
        for cue in cues {
            if let Err(err) = self.schedule(cue) {
                warn!(%err, "chime cue dropped");
            }
        }
        debug!(rising, voice, "chime scheduled");
    }
}

/// Block count for [`Engine::render_for`].
pub fn blocks_for(seconds: f32, sample_rate: u32, block_size: usize) -> usize {
    if seconds > 0.0 {
        (seconds * sample_rate as f32 / block_size as f32) as usize + 1
    } else {
        1
    }
}
