use std::f32::consts::TAU;

use crate::dsp::{VoiceParams, WaveRenderer};
use crate::protocol::Wave;

/*
Oscillator Shapes
=================

Each voice keeps its own phase in [0, 1). Every sample the phase advances
by freq / sample_rate and wraps; the shape maps phase to a sample:

  sine       sin(2π·phase)                        fundamental only
  pulse      +1 while phase < duty, else -1       duty 0.5 = square
  saw        2·phase - 1                          all harmonics, 1/n
  triangle   1 - 4·|phase - 0.5|                  odd harmonics, 1/n²
  noise      white, from a per-voice xorshift     no pitch, phase unused

Shapes are naive (not bandlimited). Amplitude is applied last and the
result is added to the block, never assigned.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Sine,
    Pulse,
    Saw,
    Triangle,
    Noise,
}

impl Shape {
    pub const ALL: [Shape; 5] = [
        Shape::Sine,
        Shape::Pulse,
        Shape::Saw,
        Shape::Triangle,
        Shape::Noise,
    ];

    pub fn wave(self) -> Wave {
        match self {
            Shape::Sine => Wave::Sine,
            Shape::Pulse => Wave::Pulse,
            Shape::Saw => Wave::Saw,
            Shape::Triangle => Wave::Triangle,
            Shape::Noise => Wave::Noise,
        }
    }
}

/// Minimal xorshift32; good enough for audio noise and never zero.
#[derive(Debug, Clone, Copy)]
pub(crate) struct XorShift(u32);

impl XorShift {
    pub(crate) fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    /// Uniform in [-1, 1].
    pub(crate) fn next_bipolar(&mut self) -> f32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

pub struct Oscillator {
    shape: Shape,
    sample_rate: f32,
    phases: Vec<f32>,
    noise: Vec<XorShift>,
}

impl Oscillator {
    pub fn new(shape: Shape, sample_rate: f32, voices: usize) -> Self {
        Self {
            shape,
            sample_rate,
            phases: vec![0.0; voices],
            noise: (0..voices)
                .map(|v| XorShift::new(0x9E37_79B9 ^ (v as u32 + 1)))
                .collect(),
        }
    }

    #[inline]
    fn sample(shape: Shape, phase: f32, duty: f32, rng: &mut XorShift) -> f32 {
        match shape {
            Shape::Sine => (TAU * phase).sin(),
            Shape::Pulse => {
                if phase < duty {
                    1.0
                } else {
                    -1.0
                }
            }
            Shape::Saw => 2.0 * phase - 1.0,
            Shape::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Shape::Noise => rng.next_bipolar(),
        }
    }
}

impl WaveRenderer for Oscillator {
    fn render(&mut self, out: &mut [f32], voice: &VoiceParams) {
        let (Some(phase), Some(rng)) = (
            self.phases.get_mut(voice.index),
            self.noise.get_mut(voice.index),
        ) else {
            return;
        };

        let step = voice.freq.max(0.0) / self.sample_rate;
        let duty = voice.duty.clamp(0.0, 1.0);
        for s in out.iter_mut() {
            *s += Self::sample(self.shape, *phase, duty, rng) * voice.amp;
            *phase = (*phase + step).fract();
        }
    }
}
