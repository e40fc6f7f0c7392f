/// Synthesis mode of a voice, by its wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wave {
    Sine = 0,
    Pulse = 1,
    Saw = 2,
    Triangle = 3,
    Noise = 4,
    /// Frequency modulation; only sounds after a note-on.
    Fm = 5,
    /// Karplus-Strong plucked string; only sounds after a note-on.
    Karplus = 6,
    Off = 7,
}

pub const WAVE_COUNT: usize = 8;

/// Voice index that wire values too large for a `u8` decode to. Nodes never
/// configure this many voices, so such events are rejected.
pub const UNKNOWN_VOICE: u8 = u8::MAX;

impl Wave {
    pub const ALL: [Wave; WAVE_COUNT] = [
        Wave::Sine,
        Wave::Pulse,
        Wave::Saw,
        Wave::Triangle,
        Wave::Noise,
        Wave::Fm,
        Wave::Karplus,
        Wave::Off,
    ];

    pub fn from_tag(tag: i64) -> Option<Self> {
        usize::try_from(tag).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// FM and Karplus-Strong are driven by note-on hooks instead of the
    /// envelope clocks.
    pub fn is_triggered(self) -> bool {
        matches!(self, Wave::Fm | Wave::Karplus)
    }
}

/// Which parameters a voice's envelope scales.
///
/// Wire clients add the flags together (`T9` = amplitude + filter cutoff).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModTargets(u8);

impl ModTargets {
    pub const NONE: Self = Self(0);
    pub const AMP: Self = Self(1);
    pub const DUTY: Self = Self(2);
    pub const FREQ: Self = Self(4);
    pub const FILTER_FREQ: Self = Self(8);
    pub const RESONANCE: Self = Self(16);

    const MASK: u8 = 0b1_1111;

    pub fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for ModTargets {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Partial ADSR update carried by the `A` field. Times are milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdsrDelta {
    pub attack: Option<u32>,
    pub decay: Option<u32>,
    pub sustain: Option<f32>,
    pub release: Option<u32>,
}

impl AdsrDelta {
    pub fn is_empty(&self) -> bool {
        self.attack.is_none()
            && self.decay.is_none()
            && self.sustain.is_none()
            && self.release.is_none()
    }
}

/// A sparse change to one voice or to the global knobs.
///
/// `None` means "leave as is". Only fields that were present on the wire
/// (or set by an internal cue) are applied.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Event {
    pub voice: u8,
    pub wave: Option<Wave>,
    pub patch: Option<u16>,
    pub freq: Option<f32>,
    pub midi_note: Option<u8>,
    pub duty: Option<f32>,
    pub feedback: Option<f32>,
    pub amp: Option<f32>,
    pub velocity: Option<f32>,
    pub volume: Option<f32>,
    pub filter_freq: Option<f32>,
    pub resonance: Option<f32>,
    pub adsr: AdsrDelta,
    pub mod_target: Option<ModTargets>,
}

impl Event {
    pub fn for_voice(voice: u8) -> Self {
        Self {
            voice,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_tags_round_trip() {
        for wave in Wave::ALL {
            assert_eq!(Wave::from_tag(wave.tag() as i64), Some(wave), "{wave:?}");
        }
        assert_eq!(Wave::from_tag(8), None);
        assert_eq!(Wave::from_tag(-1), None);
    }

    #[test]
    fn combined_targets_contain_each_flag() {
        let targets = ModTargets::from_bits_truncate(9);
        assert!(targets.contains(ModTargets::AMP));
        assert!(targets.contains(ModTargets::FILTER_FREQ));
        assert!(!targets.contains(ModTargets::DUTY));
        assert!(!targets.contains(ModTargets::NONE));
        assert_eq!(ModTargets::AMP | ModTargets::FILTER_FREQ, targets);
    }
}
