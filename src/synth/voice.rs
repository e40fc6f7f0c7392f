use crate::protocol::{ModTargets, Wave};
use crate::synth::envelope::{adsr_scale, Adsr};

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn freq_for_midi_note(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Persistent configuration of one voice.
///
/// Only the audio thread touches this; events reach it through the queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceState {
    pub wave: Wave,
    pub patch: u16,
    pub midi_note: u8,
    pub freq: f32,
    pub duty: f32,
    pub feedback: f32,
    pub amp: f32,
    /// Zero while no note is held.
    pub velocity: f32,
    pub adsr: Adsr,
    pub mod_target: ModTargets,
    pub on_clock: Option<i64>,
    pub off_clock: Option<i64>,
}

impl Default for VoiceState {
    fn default() -> Self {
        Self {
            wave: Wave::Off,
            patch: 0,
            midi_note: 0,
            freq: 0.0,
            duty: 0.5,
            feedback: 0.996,
            amp: 1.0,
            velocity: 0.0,
            adsr: Adsr::default(),
            mod_target: ModTargets::NONE,
            on_clock: None,
            off_clock: None,
        }
    }
}

impl VoiceState {
    /// Envelope output for this voice; 1.0 when no target is selected.
    pub fn envelope_scale(&self, now: i64) -> f32 {
        if self.mod_target.is_empty() {
            return 1.0;
        }
        adsr_scale(now, self.on_clock, self.off_clock, &self.adsr)
    }

    pub fn is_sounding(&self) -> bool {
        self.wave != Wave::Off
    }
}

/// Note gate changes for waves that are driven by their renderer's hooks
/// rather than by the envelope clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    NoteOn { voice: usize, wave: Wave },
    NoteOff { voice: usize, wave: Wave },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_note_frequencies() {
        assert!((freq_for_midi_note(69) - 440.0).abs() < 1e-3);
        assert!((freq_for_midi_note(60) - 261.6256).abs() < 1e-2);
        assert!((freq_for_midi_note(81) - 880.0).abs() < 1e-2);
    }

    #[test]
    fn envelope_needs_a_target() {
        let mut voice = VoiceState {
            on_clock: Some(0),
            ..VoiceState::default()
        };
        assert_eq!(voice.envelope_scale(0), 1.0);
        voice.mod_target = ModTargets::AMP;
        assert_eq!(voice.envelope_scale(0), 0.0);
    }
}
