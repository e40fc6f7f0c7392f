use std::fmt::Write as _;

use super::event::{AdsrDelta, Event, ModTargets, Wave, UNKNOWN_VOICE};
use super::scan::{comma_list, fields, float_prefix, int_prefix, truncate_at_nul};

/// A decoded datagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Event(Packet),
    /// Host asks every node to answer with its clock (`s` token + `i` slot).
    SyncRequest { token: i64, slot: u32 },
    /// Another node's answer to a sync request, or its liveness ping.
    SyncResponse(SyncResponse),
    /// Nothing usable in the datagram.
    Malformed,
}

/// An event plus the routing/timing fields that travel with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packet {
    pub event: Event,
    /// Sender's clock in ms; `None` means "play as soon as possible".
    pub network_time: Option<i64>,
    /// `c` field: individual node id (0..=255) or group (> 255).
    pub destination: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncResponse {
    pub client: i64,
    pub address: u8,
    pub token: i64,
    /// `-1` for periodic pings.
    pub slot: i64,
}

/// Fields that are only meaningful for routing, collected alongside the
/// event while scanning.
#[derive(Default)]
struct Routing {
    sync_token: Option<i64>,
    sync_slot: Option<i64>,
    client: Option<i64>,
    address: Option<i64>,
}

/// Non-negative values only; the protocol uses negatives as "unset".
fn non_negative(v: f32) -> Option<f32> {
    (v >= 0.0).then_some(v)
}

fn parse_adsr(value: &[u8]) -> AdsrDelta {
    let mut adsr = AdsrDelta::default();
    for (idx, part) in comma_list(value).enumerate() {
        if part.is_empty() {
            continue;
        }
        match idx {
            0 => adsr.attack = u32::try_from(int_prefix(part)).ok(),
            1 => adsr.decay = u32::try_from(int_prefix(part)).ok(),
            2 => adsr.sustain = non_negative(float_prefix(part)),
            3 => adsr.release = u32::try_from(int_prefix(part)).ok(),
            _ => break,
        }
    }
    adsr
}

/// Decode one datagram.
///
/// Never fails: unknown tags are skipped, bad numbers read as zero (and
/// negative values as absent), and a NUL ends the message early.
pub fn decode(bytes: &[u8]) -> Message {
    let bytes = truncate_at_nul(bytes);
    let is_sync_response = bytes.first() == Some(&b'_');

    let mut event = Event::default();
    let mut network_time = None;
    let mut routing = Routing::default();
    let mut recognized = false;

    for field in fields(bytes) {
        let v = field.value;
        match field.tag {
            b't' => network_time = Some(int_prefix(v)).filter(|&t| t > 0),
            b'a' => event.amp = non_negative(float_prefix(v)),
            b'b' => event.feedback = non_negative(float_prefix(v)),
            b'c' => routing.client = Some(int_prefix(v)),
            b'd' => event.duty = non_negative(float_prefix(v)),
            b'f' => event.freq = non_negative(float_prefix(v)),
            b'F' => event.filter_freq = non_negative(float_prefix(v)),
            b'i' => routing.sync_slot = Some(int_prefix(v)),
            b'l' => event.velocity = non_negative(float_prefix(v)),
            b'n' => event.midi_note = u8::try_from(int_prefix(v)).ok(),
            b'p' => event.patch = u16::try_from(int_prefix(v)).ok(),
            b'r' => routing.address = Some(int_prefix(v)),
            b'R' => event.resonance = non_negative(float_prefix(v)),
            b's' => routing.sync_token = Some(int_prefix(v)),
            b'T' => {
                event.mod_target = u8::try_from(int_prefix(v))
                    .ok()
                    .map(ModTargets::from_bits_truncate)
            }
            // Out-of-range voices are kept out of range so the sequencer
            // rejects them instead of touching voice 0.
            b'v' => event.voice = u8::try_from(int_prefix(v)).unwrap_or(UNKNOWN_VOICE),
            b'V' => event.volume = non_negative(float_prefix(v)),
            b'w' => event.wave = Wave::from_tag(int_prefix(v)),
            b'A' => event.adsr = parse_adsr(v),
            _ => continue,
        }
        recognized = true;
    }

    if !recognized {
        return Message::Malformed;
    }

    if is_sync_response {
        return match routing.address.and_then(|a| u8::try_from(a).ok()) {
            Some(address) => Message::SyncResponse(SyncResponse {
                client: routing.client.unwrap_or(-1),
                address,
                token: routing.sync_token.unwrap_or(-1),
                slot: routing.sync_slot.unwrap_or(-1),
            }),
            None => Message::Malformed,
        };
    }

    if let (Some(token), Some(slot)) = (routing.sync_token, routing.sync_slot) {
        if token >= 0 {
            if let Ok(slot) = u32::try_from(slot) {
                return Message::SyncRequest { token, slot };
            }
        }
    }

    Message::Event(Packet {
        event,
        network_time,
        destination: routing
            .client
            .and_then(|c| u32::try_from(c).ok()),
    })
}

fn push_float(out: &mut String, tag: char, value: Option<f32>) {
    if let Some(v) = value.filter(|v| v.is_finite()) {
        let _ = write!(out, "{tag}{v}");
    }
}

fn push_int(out: &mut String, tag: char, value: Option<impl std::fmt::Display>) {
    if let Some(v) = value {
        let _ = write!(out, "{tag}{v}");
    }
}

/// Encode an event in the wire format. Only set fields are written, so
/// decoding the result gives back the same event.
pub fn encode(event: &Event, network_time: Option<i64>, destination: Option<u32>) -> String {
    let mut out = String::with_capacity(64);
    push_int(&mut out, 't', network_time);
    push_int(&mut out, 'v', Some(event.voice));
    push_int(&mut out, 'w', event.wave.map(Wave::tag));
    push_float(&mut out, 'd', event.duty);
    push_float(&mut out, 'b', event.feedback);
    push_float(&mut out, 'f', event.freq);
    push_int(&mut out, 'n', event.midi_note);
    push_int(&mut out, 'p', event.patch);
    push_int(&mut out, 'c', destination);
    push_float(&mut out, 'l', event.velocity);
    push_float(&mut out, 'a', event.amp);
    push_float(&mut out, 'V', event.volume);
    push_float(&mut out, 'R', event.resonance);
    push_float(&mut out, 'F', event.filter_freq);

    let adsr = &event.adsr;
    if !adsr.is_empty() {
        let show = |v: Option<String>| v.unwrap_or_default();
        let _ = write!(
            out,
            "A{},{},{},{}",
            show(adsr.attack.map(|v| v.to_string())),
            show(adsr.decay.map(|v| v.to_string())),
            show(adsr.sustain.filter(|v| v.is_finite()).map(|v| v.to_string())),
            show(adsr.release.map(|v| v.to_string())),
        );
    }
    push_int(&mut out, 'T', event.mod_target.map(ModTargets::bits));
    out
}

/// Host-side sync request, as sent by a controller.
pub fn sync_request(token: i64, slot: u32) -> String {
    format!("s{token}i{slot}")
}

/// This node's answer to a sync request. The trailing battery field is
/// always zero.
pub fn sync_reply(local_now: i64, slot: u32, node_id: u8, address: u8) -> String {
    format!("_s{local_now}i{slot}c{node_id}r{address}y0")
}

/// Periodic liveness announcement; shaped like a sync reply with slot -1.
pub fn ping(local_now: i64, node_id: u8, address: u8) -> String {
    format!("_s{local_now}i-1c{node_id}r{address}y0")
}
