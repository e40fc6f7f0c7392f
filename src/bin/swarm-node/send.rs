//! Controller side: encode one message and broadcast it.

use std::time::{SystemTime, UNIX_EPOCH};

use clap::Args;
use color_eyre::eyre::{bail, Result, WrapErr};
use tracing::info;

use swarm_synth::net::MulticastTransport;
use swarm_synth::protocol::sync_request;
use swarm_synth::{encode, Event, ModTargets, NodeConfig, Wave};

#[derive(Args)]
pub struct SendArgs {
    /// Voice index
    #[arg(short, long, default_value_t = 0)]
    voice: u8,

    /// Wave tag: 0 sine, 1 pulse, 2 saw, 3 triangle, 4 noise, 5 fm, 6 string, 7 off
    #[arg(short, long)]
    wave: Option<i64>,

    /// MIDI note
    #[arg(short = 'n', long)]
    note: Option<u8>,

    /// Frequency in Hz (overrides note)
    #[arg(short, long)]
    freq: Option<f32>,

    /// Velocity; above zero is note-on, zero is note-off
    #[arg(short = 'l', long)]
    velocity: Option<f32>,

    #[arg(short, long)]
    amp: Option<f32>,

    #[arg(long)]
    duty: Option<f32>,

    #[arg(long)]
    feedback: Option<f32>,

    #[arg(long)]
    patch: Option<u16>,

    /// Master volume
    #[arg(short = 'V', long)]
    volume: Option<f32>,

    /// Global filter cutoff in Hz (0 disables)
    #[arg(short = 'F', long)]
    filter: Option<f32>,

    /// Global filter resonance (Q)
    #[arg(short = 'R', long)]
    resonance: Option<f32>,

    /// Envelope target bits: 1 amp, 2 duty, 4 freq, 8 filter, 16 resonance
    #[arg(short = 'T', long)]
    target: Option<u8>,

    #[arg(long)]
    attack: Option<u32>,

    #[arg(long)]
    decay: Option<u32>,

    #[arg(long)]
    sustain: Option<f32>,

    #[arg(long)]
    release: Option<u32>,

    /// Destination node id, or 255 + group size
    #[arg(short = 'c', long)]
    to: Option<u32>,

    /// Stamp the message with this host's clock
    #[arg(short = 't', long)]
    stamp: bool,

    /// Send a clock sync request instead of an event
    #[arg(long, conflicts_with = "stamp")]
    sync: bool,

    /// Slot index for --sync
    #[arg(long, default_value_t = 0, requires = "sync")]
    slot: u32,
}

fn wall_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl SendArgs {
    fn event(&self) -> Result<Event> {
        let wave = match self.wave {
            Some(tag) => match Wave::from_tag(tag) {
                Some(wave) => Some(wave),
                None => bail!("unknown wave tag {tag}"),
            },
            None => None,
        };
        let mut event = Event {
            wave,
            midi_note: self.note,
            freq: self.freq,
            velocity: self.velocity,
            amp: self.amp,
            duty: self.duty,
            feedback: self.feedback,
            patch: self.patch,
            volume: self.volume,
            filter_freq: self.filter,
            resonance: self.resonance,
            mod_target: self.target.map(ModTargets::from_bits_truncate),
            ..Event::for_voice(self.voice)
        };
        event.adsr.attack = self.attack;
        event.adsr.decay = self.decay;
        event.adsr.sustain = self.sustain;
        event.adsr.release = self.release;
        Ok(event)
    }
}

pub fn run(config: &NodeConfig, args: SendArgs) -> Result<()> {
    let message = if args.sync {
        sync_request(wall_ms(), args.slot)
    } else {
        let stamp = args.stamp.then(wall_ms);
        encode(&args.event()?, stamp, args.to)
    };

    let transport = MulticastTransport::sender(&config.network).wrap_err("failed to open socket")?;
    let sent = transport.broadcast(message.as_bytes());
    if sent != message.len() {
        bail!("sent {sent} of {} bytes", message.len());
    }
    info!(%message, group = %transport.group(), "sent");
    Ok(())
}
