use std::f32::consts::TAU;

/*
Post-mix filter
===============

A single trapezoidal state-variable filter run over the final 16-bit block,
low-pass output only. It is enabled by a global cutoff above zero and is
re-tuned once per block because envelopes may be scaling the cutoff and
resonance.

  cutoff      Hz, clamped below Nyquist
  resonance   Q; damping k = 1/Q, so gain at cutoff ≈ Q
              (0.707 is flat, larger rings)

Integrator state carries across blocks, so retuning between blocks does not
click.
*/

/// Lowest Q accepted; keeps the damping term finite.
const MIN_Q: f32 = 0.05;

#[derive(Debug, Clone)]
pub struct SvfLowpass {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory
    sample_rate: f32,
    g: f32,
    k: f32,
}

impl SvfLowpass {
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            sample_rate,
            g: 0.0,
            k: 1.0,
        };
        filter.tune(1_000.0, 0.707);
        filter
    }

    /// Recompute coefficients for a cutoff (Hz) and Q.
    pub fn tune(&mut self, cutoff_hz: f32, q: f32) {
        let nyquist = self.sample_rate * 0.5;
        let cutoff = cutoff_hz.clamp(1.0, nyquist * 0.98);
        let wd = TAU * cutoff;
        let wa = (2.0 * self.sample_rate) * (wd / (2.0 * self.sample_rate)).tan();
        self.g = wa / (2.0 * self.sample_rate);
        self.k = 1.0 / q.max(MIN_Q);
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> f32 {
        let g = self.g;
        let h = 1.0 / (1.0 + g * (g + self.k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;
        v2
    }

    /// Filter a block of output samples in place, saturating to i16.
    pub fn process(&mut self, block: &mut [i16]) {
        for s in block.iter_mut() {
            let y = self.next_sample(f32::from(*s));
            *s = y.round().clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f32 = 44_100.0;

    fn sine_block(freq: f32, amplitude: f32, len: usize) -> Vec<i16> {
        (0..len)
            .map(|n| ((TAU * freq * n as f32 / RATE).sin() * amplitude) as i16)
            .collect()
    }

    fn peak_after_transient(buffer: &[i16]) -> i16 {
        let skip = buffer.len().min(256);
        buffer[skip..]
            .iter()
            .map(|s| s.saturating_abs())
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn dc_passes() {
        let mut filter = SvfLowpass::new(RATE);
        filter.tune(500.0, 0.707);
        let mut block = vec![10_000i16; 1_024];
        filter.process(&mut block);
        assert!((block[1_023] - 10_000).abs() <= 2, "got {}", block[1_023]);
    }

    #[test]
    fn attenuates_above_cutoff() {
        let mut filter = SvfLowpass::new(RATE);
        filter.tune(300.0, 0.707);
        let mut block = sine_block(5_000.0, 10_000.0, 1_024);
        filter.process(&mut block);
        assert!(peak_after_transient(&block) < 1_000);
    }

    #[test]
    fn resonance_boosts_cutoff() {
        let mut filter = SvfLowpass::new(RATE);
        filter.tune(1_000.0, 0.5);
        let mut flat = sine_block(1_000.0, 5_000.0, 2_048);
        filter.process(&mut flat);

        filter.reset();
        filter.tune(1_000.0, 3.0);
        let mut peaked = sine_block(1_000.0, 5_000.0, 2_048);
        filter.process(&mut peaked);

        let (low, high) = (peak_after_transient(&flat), peak_after_transient(&peaked));
        assert!(high > low * 3, "high Q {high} vs low Q {low}");
    }

    #[test]
    fn extreme_settings_stay_finite() {
        let mut filter = SvfLowpass::new(RATE);
        filter.tune(1e9, 0.0);
        let mut block = sine_block(440.0, 30_000.0, 512);
        filter.process(&mut block);
        filter.tune(-5.0, f32::MAX);
        filter.process(&mut block);
        assert!(filter.next_sample(0.0).is_finite());
    }
}
