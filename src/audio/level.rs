/// Level reported for a silent chunk, in decibels.
pub const SILENCE_FLOOR_DB: f32 = -60.0;

/// Root-mean-square amplitude of a sample chunk.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// RMS level in decibels. A zero (or degenerate) RMS clamps to the
/// silence floor instead of producing -inf.
pub fn rms_db(samples: &[f32]) -> f32 {
    let rms = rms(samples);
    if rms > 0.0 {
        20.0 * rms.log10()
    } else {
        SILENCE_FLOOR_DB
    }
}
