/*
Clock-Driven ADSR Envelope
==========================

The envelope scales one or more voice parameters between 0.0 and 1.0. It
is recomputed once per audio block from two timestamps stored on the
voice, so there is no per-sample state to keep in sync.

Vocabulary
----------

  on clock    Local ms when the last note-on arrived. Set = gate high.
  off clock   Local ms when the last note-off arrived. Set = releasing.
  elapsed     now - clock, clamped at zero.
  scale       The envelope output, multiplied into the target parameter.


The Shape
---------

  Scale
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release
         (A)   (D)      (S)      (R)

Segments are linear, durations are milliseconds:

  attack   elapsed < A          scale = elapsed / A
  decay    elapsed < A + D      scale = 1 - (elapsed - A) / D * (1 - S)
  sustain  otherwise            scale = S
  release  off clock set        scale = S * (1 - elapsed / R), then 0


Stage Inference
---------------

    ┌───────────────────────────────────────────────────────┐
    │   neither clock   on clock set             off clock  │
    │   ┌──────┐      ┌────────┐  ┌─────┐  ┌─────┐  ┌───────┐│
    │   │ Idle │ ───→ │ Attack │→ │Decay│→ │ Sus │  │Release││
    │   └──────┘      └────────┘  └─────┘  └─────┘  └───────┘│
    └───────────────────────────────────────────────────────┘

No stage is stored. Which segment applies is derived from the clocks and
`now` on every call, which makes evaluation a pure function: it can be
asked about any instant, earlier or later, and always gives the same
answer.

Release always starts from the sustain level. A release that has run its
course keeps returning 0.0 until the next note-on replaces the clocks.
With neither clock set the envelope is inactive and returns 1.0, leaving
the target parameter untouched.
*/

/// ADSR durations (ms) and sustain level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack_ms: u32,
    pub decay_ms: u32,
    pub sustain: f32,
    pub release_ms: u32,
}

impl Default for Adsr {
    fn default() -> Self {
        Self {
            attack_ms: 50,
            decay_ms: 200,
            sustain: 0.5,
            release_ms: 25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
    /// Release has finished; output stays at zero.
    Done,
}

fn elapsed(now: i64, clock: i64) -> f32 {
    (now - clock).max(0) as f32
}

/// Which segment the envelope is in at `now`.
pub fn stage(now: i64, on_clock: Option<i64>, off_clock: Option<i64>, adsr: &Adsr) -> EnvelopeStage {
    if let Some(on) = on_clock {
        let t = elapsed(now, on);
        let attack = adsr.attack_ms as f32;
        let decay = adsr.decay_ms as f32;
        if t < attack {
            EnvelopeStage::Attack
        } else if t < attack + decay {
            EnvelopeStage::Decay
        } else {
            EnvelopeStage::Sustain
        }
    } else if let Some(off) = off_clock {
        if elapsed(now, off) < adsr.release_ms as f32 {
            EnvelopeStage::Release
        } else {
            EnvelopeStage::Done
        }
    } else {
        EnvelopeStage::Idle
    }
}

/// Envelope output at `now`, always within `0.0..=1.0`.
pub fn adsr_scale(now: i64, on_clock: Option<i64>, off_clock: Option<i64>, adsr: &Adsr) -> f32 {
    let sustain = adsr.sustain.clamp(0.0, 1.0);
    let attack = adsr.attack_ms as f32;
    let decay = adsr.decay_ms as f32;
    let release = adsr.release_ms as f32;

    let scale = match stage(now, on_clock, off_clock, adsr) {
        EnvelopeStage::Idle => 1.0,
        EnvelopeStage::Attack => {
            let t = on_clock.map_or(0.0, |on| elapsed(now, on));
            t / attack
        }
        EnvelopeStage::Decay => {
            let t = on_clock.map_or(0.0, |on| elapsed(now, on)) - attack;
            1.0 - (t / decay) * (1.0 - sustain)
        }
        EnvelopeStage::Sustain => sustain,
        EnvelopeStage::Release => {
            let t = off_clock.map_or(0.0, |off| elapsed(now, off));
            sustain * (1.0 - t / release)
        }
        EnvelopeStage::Done => 0.0,
    };

    scale.clamp(0.0, 1.0)
}
