use crate::dsp::oscillator::XorShift;
use crate::dsp::{VoiceParams, WaveRenderer};

/// Lowest pitch a string can hold; sizes the delay lines.
const MIN_FREQ_HZ: f32 = 20.0;

/// One delay line per voice, filled with noise on note-on and fed back
/// through a two-tap average scaled by the voice's feedback.
struct StringLine {
    buffer: Vec<f32>,
    period: usize,
    read_pos: usize,
    plucked: bool,
}

impl StringLine {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity],
            period: capacity,
            read_pos: 0,
            plucked: false,
        }
    }

    fn pluck(&mut self, period: usize, rng: &mut XorShift) {
        self.period = period.clamp(2, self.buffer.len());
        self.read_pos = 0;
        for s in &mut self.buffer[..self.period] {
            *s = rng.next_bipolar();
        }
        self.plucked = true;
    }

    #[inline]
    fn next_sample(&mut self, feedback: f32) -> f32 {
        let here = self.read_pos;
        let next = (here + 1) % self.period;
        let out = self.buffer[here];
        self.buffer[here] = 0.5 * (out + self.buffer[next]) * feedback;
        self.read_pos = next;
        out
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.read_pos = 0;
        self.plucked = false;
    }
}

pub struct KarplusRenderer {
    sample_rate: f32,
    lines: Vec<StringLine>,
    rng: XorShift,
}

impl KarplusRenderer {
    pub fn new(sample_rate: f32, voices: usize) -> Self {
        let capacity = (sample_rate / MIN_FREQ_HZ).ceil() as usize + 1;
        Self {
            sample_rate,
            lines: (0..voices).map(|_| StringLine::new(capacity)).collect(),
            rng: XorShift::new(0x5EED_1234),
        }
    }
}

impl WaveRenderer for KarplusRenderer {
    fn render(&mut self, out: &mut [f32], voice: &VoiceParams) {
        let Some(line) = self.lines.get_mut(voice.index) else {
            return;
        };
        if !line.plucked {
            return;
        }
        let feedback = voice.feedback.clamp(0.0, 1.0);
        for s in out.iter_mut() {
            *s += line.next_sample(feedback) * voice.amp;
        }
    }

    fn note_on(&mut self, voice: &VoiceParams) {
        if voice.freq <= 0.0 {
            return;
        }
        let period = (self.sample_rate / voice.freq).round() as usize;
        if let Some(line) = self.lines.get_mut(voice.index) {
            line.pluck(period, &mut self.rng);
        }
    }

    fn note_off(&mut self, voice: &VoiceParams) {
        if let Some(line) = self.lines.get_mut(voice.index) {
            line.reset();
        }
    }
}
