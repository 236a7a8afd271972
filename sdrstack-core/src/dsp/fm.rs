//! FM discriminator (§4.1): one real output per sample equal to the
//! unwrapped phase difference between consecutive samples, normalized to
//! `[-1, 1]` by dividing by pi. Initial previous-phase is zero.

use std::f32::consts::PI;

pub fn fm_discriminate(i: &[f32], q: &[f32]) -> Vec<f32> {
    let n = i.len().min(q.len());
    let mut output = Vec::with_capacity(n);
    let mut prev_phase = 0.0f32;
    for k in 0..n {
        let phase = q[k].atan2(i[k]);
        let mut diff = phase - prev_phase;
        // Unwrap into (-pi, pi].
        while diff > PI {
            diff -= 2.0 * PI;
        }
        while diff < -PI {
            diff += 2.0 * PI;
        }
        output.push(diff / PI);
        prev_phase = phase;
    }
    output
}
