use tracing::{debug, warn};

use crate::protocol::Event;
use crate::synth::modulation::GlobalState;
use crate::synth::voice::{freq_for_midi_note, Trigger, VoiceState};

/// Persistent voice table plus the global knobs, mutated only by applying
/// events.
pub struct Sequencer {
    voices: Vec<VoiceState>,
    global: GlobalState,
}

impl Sequencer {
    pub fn new(voices: usize) -> Self {
        Self {
            voices: vec![VoiceState::default(); voices],
            global: GlobalState::default(),
        }
    }

    pub fn voices(&self) -> &[VoiceState] {
        &self.voices
    }

    pub fn voice(&self, index: usize) -> Option<&VoiceState> {
        self.voices.get(index)
    }

    pub fn global(&self) -> &GlobalState {
        &self.global
    }

    /// Merge the set fields of `event` into state at local time `now`.
    ///
    /// Returns a [`Trigger`] when the event gates an FM or plucked-string
    /// voice; oscillator voices get their envelope clocks stamped instead.
    pub fn apply(&mut self, event: &Event, now: i64) -> Option<Trigger> {
        // globals bypass the voice table
        if let Some(volume) = event.volume {
            self.global.volume = volume;
        }
        if let Some(cutoff) = event.filter_freq {
            self.global.filter_freq = cutoff;
        }
        if let Some(resonance) = event.resonance {
            self.global.resonance = resonance;
        }

        let index = usize::from(event.voice);
        let Some(voice) = self.voices.get_mut(index) else {
            warn!(voice = index, voices = self.voices.len(), "event for unknown voice");
            return None;
        };

        if let Some(note) = event.midi_note {
            voice.midi_note = note;
            voice.freq = freq_for_midi_note(note);
        }
        if let Some(wave) = event.wave {
            voice.wave = wave;
        }
        if let Some(patch) = event.patch {
            voice.patch = patch;
        }
        if let Some(duty) = event.duty {
            voice.duty = duty;
        }
        if let Some(feedback) = event.feedback {
            voice.feedback = feedback;
        }
        if let Some(freq) = event.freq {
            voice.freq = freq;
        }
        if let Some(amp) = event.amp {
            voice.amp = amp;
        }
        if let Some(target) = event.mod_target {
            voice.mod_target = target;
        }

        let adsr = &event.adsr;
        if let Some(a) = adsr.attack {
            voice.adsr.attack_ms = a;
        }
        if let Some(d) = adsr.decay {
            voice.adsr.decay_ms = d;
        }
        if let Some(s) = adsr.sustain {
            voice.adsr.sustain = s;
        }
        if let Some(r) = adsr.release {
            voice.adsr.release_ms = r;
        }

        match event.velocity {
            Some(velocity) if velocity > 0.0 => {
                voice.velocity = velocity;
                debug!(voice = index, velocity, wave = ?voice.wave, "note on");
                if voice.wave.is_triggered() {
                    return Some(Trigger::NoteOn {
                        voice: index,
                        wave: voice.wave,
                    });
                }
                voice.on_clock = Some(now);
                voice.off_clock = None;
            }
            Some(_) if voice.velocity > 0.0 => {
                voice.velocity = 0.0;
                debug!(voice = index, wave = ?voice.wave, "note off");
                if voice.wave.is_triggered() {
                    return Some(Trigger::NoteOff {
                        voice: index,
                        wave: voice.wave,
                    });
                }
                voice.on_clock = None;
                voice.off_clock = Some(now);
            }
            _ => {}
        }
        None
    }

    /// Dump every voice at debug level.
    pub fn log_state(&self) {
        debug!(
            volume = self.global.volume,
            filter = self.global.filter_freq,
            resonance = self.global.resonance,
            "global state"
        );
        for (i, v) in self.voices.iter().enumerate() {
            debug!(
                voice = i,
                wave = ?v.wave,
                amp = v.amp,
                freq = v.freq,
                duty = v.duty,
                target = v.mod_target.bits(),
                velocity = v.velocity,
                attack = v.adsr.attack_ms,
                decay = v.adsr.decay_ms,
                sustain = v.adsr.sustain,
                release = v.adsr.release_ms,
                "voice state"
            );
        }
    }
}
