//! Sample-level kernels and the renderer plugin seam.
//!
//! The mixer never knows how a waveform is made. It looks up the
//! [`WaveRenderer`] registered for a voice's [`Wave`] tag and lets it add one
//! block into the shared accumulation buffer. Renderers keep whatever
//! per-voice state they need (phase, delay lines) indexed by voice number,
//! allocated once up front so rendering never allocates.

/// Two-operator FM voice.
pub mod fm;
/// Post-mix state-variable low-pass over the quantized block.
pub mod filter;
/// Plucked string (Karplus-Strong).
pub mod karplus;
/// Sine, pulse, saw, triangle and noise.
pub mod oscillator;
/// Float accumulation buffer to 16-bit output.
pub mod quantize;

use crate::protocol::{Wave, WAVE_COUNT};
use crate::synth::{ModulationState, Trigger, VoiceState};

pub use filter::SvfLowpass;
pub use fm::FmRenderer;
pub use karplus::KarplusRenderer;
pub use oscillator::{Oscillator, Shape};
pub use quantize::quantize;

/// Everything a renderer may read about one voice for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceParams {
    pub index: usize,
    pub wave: Wave,
    pub patch: u16,
    pub freq: f32,
    pub amp: f32,
    pub duty: f32,
    pub feedback: f32,
    pub velocity: f32,
}

impl VoiceParams {
    /// Base (unmodulated) parameters, as seen by note hooks.
    pub fn base(index: usize, voice: &VoiceState) -> Self {
        Self {
            index,
            wave: voice.wave,
            patch: voice.patch,
            freq: voice.freq,
            amp: voice.amp,
            duty: voice.duty,
            feedback: voice.feedback,
            velocity: voice.velocity,
        }
    }

    /// Parameters after this block's envelope.
    pub fn modulated(index: usize, voice: &VoiceState, m: &ModulationState) -> Self {
        Self {
            freq: m.freq,
            amp: m.amp,
            duty: m.duty,
            ..Self::base(index, voice)
        }
    }
}

/// A waveform plugin.
///
/// `render` must only add into `out`; other voices have already written
/// there.
pub trait WaveRenderer: Send {
    fn render(&mut self, out: &mut [f32], voice: &VoiceParams);

    fn note_on(&mut self, _voice: &VoiceParams) {}

    fn note_off(&mut self, _voice: &VoiceParams) {}
}

/// Renderers keyed by wave tag. Tags with nothing registered are silent.
pub struct RendererBank {
    slots: [Option<Box<dyn WaveRenderer>>; WAVE_COUNT],
}

impl RendererBank {
    pub fn empty() -> Self {
        Self {
            slots: Default::default(),
        }
    }

    /// Built-in oscillators, plucked string and FM.
    pub fn standard(sample_rate: u32, voices: usize) -> Self {
        let rate = sample_rate as f32;
        let mut bank = Self::empty();
        for shape in Shape::ALL {
            bank.register(shape.wave(), Oscillator::new(shape, rate, voices));
        }
        bank.register(Wave::Karplus, KarplusRenderer::new(rate, voices));
        bank.register(Wave::Fm, FmRenderer::new(rate, voices));
        bank
    }

    /// Install `renderer` for `wave`, replacing any previous one.
    pub fn register<R: WaveRenderer + 'static>(&mut self, wave: Wave, renderer: R) {
        self.slots[wave.tag() as usize] = Some(Box::new(renderer));
    }

    pub fn has(&self, wave: Wave) -> bool {
        self.slots[wave.tag() as usize].is_some()
    }

    pub fn render(&mut self, out: &mut [f32], voice: &VoiceParams) {
        if let Some(r) = self.slots[voice.wave.tag() as usize].as_mut() {
            r.render(out, voice);
        }
    }

    /// Route a note gate to the renderer named in the trigger.
    pub fn trigger(&mut self, trigger: Trigger, voice: &VoiceParams) {
        let (wave, on) = match trigger {
            Trigger::NoteOn { wave, .. } => (wave, true),
            Trigger::NoteOff { wave, .. } => (wave, false),
        };
        if let Some(r) = self.slots[wave.tag() as usize].as_mut() {
            if on {
                r.note_on(voice);
            } else {
                r.note_off(voice);
            }
        }
    }
}

impl Default for RendererBank {
    fn default() -> Self {
        Self::empty()
    }
}
