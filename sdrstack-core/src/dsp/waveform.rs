//! Amplitude/phase waveform extraction (§4.1).

/// Given parallel I/Q arrays, produces parallel (amplitude, phase) arrays
/// of the same length: `amplitude = sqrt(i^2 + q^2)`, `phase = atan2(q, i)`.
pub fn extract_amplitude_phase(i: &[f32], q: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let n = i.len().min(q.len());
    let mut amplitude = Vec::with_capacity(n);
    let mut phase = Vec::with_capacity(n);
    for k in 0..n {
        amplitude.push((i[k] * i[k] + q[k] * q[k]).sqrt());
        phase.push(q[k].atan2(i[k]));
    }
    (amplitude, phase)
}
