/// Scale the float mix by master volume into 16-bit samples.
///
/// Anything outside full scale is clipped, never wrapped. `out` and `mix`
/// are paired sample for sample; the shorter one sets the length.
pub fn quantize(mix: &[f32], volume: f32, out: &mut [i16]) {
    let gain = volume * f32::from(i16::MAX);
    for (o, &x) in out.iter_mut().zip(mix) {
        let y = x * gain;
        *o = if y.is_nan() {
            0
        } else {
            y.round().clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
        };
    }
}
