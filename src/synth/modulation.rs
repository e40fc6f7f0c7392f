use crate::protocol::ModTargets;
use crate::synth::voice::VoiceState;

/// Process-wide knobs set by `V`, `F` and `R` fields.
///
/// A cutoff of 0 disables the post-mix filter. Resonance is a filter Q.
/// The run/stop flag that also belongs to the process lives in
/// [`RunFlag`](crate::RunFlag) because both threads read it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalState {
    pub volume: f32,
    pub filter_freq: f32,
    pub resonance: f32,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            volume: 0.5,
            filter_freq: 0.0,
            resonance: 0.7,
        }
    }
}

/// Block-local copy of the global filter settings, after envelopes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalMod {
    pub filter_freq: f32,
    pub resonance: f32,
}

impl GlobalMod {
    pub fn snapshot(global: &GlobalState) -> Self {
        Self {
            filter_freq: global.filter_freq,
            resonance: global.resonance,
        }
    }

    pub fn filter_enabled(&self) -> bool {
        self.filter_freq > 0.0
    }
}

/// Per-voice parameters for one block, after envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModulationState {
    pub amp: f32,
    pub duty: f32,
    pub freq: f32,
}

/// Apply a voice's envelope to its own parameters and, when it targets
/// them, to the shared filter settings.
///
/// Every voice that targets the filter multiplies into the same `global`,
/// so two such voices compound. That matches how existing swarms sound and
/// is kept on purpose.
pub fn modulate(voice: &VoiceState, now: i64, global: &mut GlobalMod) -> ModulationState {
    let mut m = ModulationState {
        amp: voice.amp,
        duty: voice.duty,
        freq: voice.freq,
    };

    let scale = voice.envelope_scale(now);
    if scale >= 1.0 {
        return m;
    }

    let targets = voice.mod_target;
    if targets.contains(ModTargets::AMP) {
        m.amp *= scale;
    }
    if targets.contains(ModTargets::DUTY) {
        m.duty *= scale;
    }
    if targets.contains(ModTargets::FREQ) {
        m.freq *= scale;
    }
    if targets.contains(ModTargets::FILTER_FREQ) {
        global.filter_freq *= scale;
    }
    if targets.contains(ModTargets::RESONANCE) {
        global.resonance *= scale;
    }
    m
}
