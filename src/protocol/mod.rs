//! The swarm control protocol.
//!
//! Messages are runs of a single tag letter followed by its value, with no
//! separators: `v2w1n60l100t1000` sets voice 2 to a pulse wave, MIDI note
//! 60, velocity 100, at sender time 1000 ms.
//!
//! | tag | field                      | tag | field                       |
//! |-----|----------------------------|-----|-----------------------------|
//! | `t` | sender time (ms)           | `n` | MIDI note                   |
//! | `a` | amplitude                  | `p` | patch                       |
//! | `b` | feedback                   | `r` | sender address (sync)       |
//! | `c` | destination node / group   | `R` | resonance                   |
//! | `d` | duty                       | `s` | sync token                  |
//! | `f` | frequency                  | `T` | modulation target bits      |
//! | `F` | filter cutoff              | `v` | voice                       |
//! | `i` | sync slot                  | `V` | master volume               |
//! | `l` | velocity                   | `w` | wave                        |
//! | `A` | `attack,decay,sustain,release` |  |                             |
//!
//! A leading `_` marks a sync response from another node.

pub mod codec;
pub mod event;
pub mod scan;

pub use codec::{decode, encode, ping, sync_reply, sync_request, Message, Packet, SyncResponse};
pub use event::{AdsrDelta, Event, ModTargets, Wave, UNKNOWN_VOICE, WAVE_COUNT};
