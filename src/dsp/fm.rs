use std::f32::consts::TAU;

use crate::dsp::{VoiceParams, WaveRenderer};

/// Modulator:carrier frequency ratio and peak index, selected by patch
/// number (wrapping).
const PATCHES: [(f32, f32); 6] = [
    (1.0, 2.0),
    (2.0, 3.0),
    (3.5, 2.5),
    (0.5, 1.5),
    (1.414, 4.0),
    (7.0, 1.0),
];

/// Brightness falls back toward this fraction of the peak index while held.
const INDEX_FLOOR: f32 = 0.3;
/// Time constants in seconds.
const INDEX_DECAY_S: f32 = 0.4;
const RELEASE_S: f32 = 0.15;

#[derive(Debug, Clone, Copy, Default)]
struct Operator {
    carrier: f32,
    modulator: f32,
    level: f32,
    index: f32,
    held: bool,
}

/// Two sine operators, modulator into carrier.
pub struct FmRenderer {
    sample_rate: f32,
    index_coeff: f32,
    release_coeff: f32,
    ops: Vec<Operator>,
}

fn one_pole_coeff(seconds: f32, sample_rate: f32) -> f32 {
    (-1.0 / (seconds * sample_rate)).exp()
}

pub fn patch(number: u16) -> (f32, f32) {
    PATCHES[number as usize % PATCHES.len()]
}

impl FmRenderer {
    pub fn new(sample_rate: f32, voices: usize) -> Self {
        Self {
            sample_rate,
            index_coeff: one_pole_coeff(INDEX_DECAY_S, sample_rate),
            release_coeff: one_pole_coeff(RELEASE_S, sample_rate),
            ops: vec![Operator::default(); voices],
        }
    }
}

impl WaveRenderer for FmRenderer {
    fn render(&mut self, out: &mut [f32], voice: &VoiceParams) {
        let Some(op) = self.ops.get_mut(voice.index) else {
            return;
        };
        if op.level <= f32::EPSILON {
            return;
        }

        let (ratio, peak) = patch(voice.patch);
        let floor = peak * INDEX_FLOOR;
        let carrier_step = voice.freq.max(0.0) / self.sample_rate;
        let mod_step = carrier_step * ratio;

        for s in out.iter_mut() {
            let m = (TAU * op.modulator).sin() * op.index;
            *s += (TAU * op.carrier + m).sin() * op.level * voice.amp;

            op.carrier = (op.carrier + carrier_step).fract();
            op.modulator = (op.modulator + mod_step).fract();
            op.index = floor + (op.index - floor) * self.index_coeff;
            if !op.held {
                op.level *= self.release_coeff;
            }
        }
    }

    fn note_on(&mut self, voice: &VoiceParams) {
        if let Some(op) = self.ops.get_mut(voice.index) {
            let (_, peak) = patch(voice.patch);
            *op = Operator {
                level: voice.velocity.clamp(0.0, 1.0),
                index: peak,
                held: true,
                ..Operator::default()
            };
        }
    }

    fn note_off(&mut self, voice: &VoiceParams) {
        if let Some(op) = self.ops.get_mut(voice.index) {
            op.held = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Wave;
    use crate::synth::VoiceState;

    fn fm_voice(velocity: f32) -> VoiceParams {
        let state = VoiceState {
            wave: Wave::Fm,
            freq: 220.0,
            velocity,
            amp: 1.0,
            ..VoiceState::default()
        };
        VoiceParams::base(0, &state)
    }

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn silent_before_note_on() {
        let mut fm = FmRenderer::new(44_100.0, 1);
        let mut out = vec![0.0f32; 128];
        fm.render(&mut out, &fm_voice(1.0));
        assert_eq!(peak(&out), 0.0);
    }

    #[test]
    fn sustains_while_held_and_fades_after_release() {
        let mut fm = FmRenderer::new(44_100.0, 1);
        let v = fm_voice(0.8);
        fm.note_on(&v);

        let mut held = vec![0.0f32; 4_096];
        fm.render(&mut held, &v);
        assert!(peak(&held) > 0.5);
        assert!(peak(&held) <= 0.8 + 1e-4);

        fm.note_off(&v);
        let mut tail = vec![0.0f32; 44_100];
        fm.render(&mut tail, &v);
        assert!(peak(&tail[40_000..]) < 0.01);
    }

    #[test]
    fn patches_wrap() {
        assert_eq!(patch(0), patch(PATCHES.len() as u16));
    }
}
