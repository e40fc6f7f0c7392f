// Purpose: persistent voice state, envelopes and per-block modulation.
// Events are deltas; this layer turns them into the authoritative state the
// renderers read every block.

pub mod envelope;
pub mod modulation;
pub mod sequencer;
pub mod voice;

pub use envelope::{adsr_scale, Adsr, EnvelopeStage};
pub use modulation::{modulate, GlobalMod, GlobalState, ModulationState};
pub use sequencer::Sequencer;
pub use voice::{freq_for_midi_note, Trigger, VoiceState};
