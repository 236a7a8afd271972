//! Frequency shift / complex mixer (§4.1): multiplies the I/Q stream by
//! `exp(-j*2*pi*f*n/fs)`. Phase is accumulated modulo 2*pi to bound
//! numerical drift across long streams, rather than recomputed from an
//! ever-growing sample index.

use std::f64::consts::TAU;

#[derive(Debug, Clone)]
pub struct Mixer {
    freq_hz: f64,
    sample_rate: f64,
    phase: f64,
}

impl Mixer {
    pub fn new(freq_hz: f64, sample_rate: f64) -> Self {
        Self {
            freq_hz,
            sample_rate,
            phase: 0.0,
        }
    }

    fn phase_increment(&self) -> f64 {
        -TAU * self.freq_hz / self.sample_rate
    }

    /// Shifts `i`/`q` in place, advancing the mixer's internal phase
    /// accumulator across the call so consecutive blocks stay continuous.
    pub fn shift_in_place(&mut self, i: &mut [f32], q: &mut [f32]) {
        let n = i.len().min(q.len());
        let increment = self.phase_increment();
        for k in 0..n {
            let (sin, cos) = self.phase.sin_cos();
            let orig_i = i[k] as f64;
            let orig_q = q[k] as f64;
            i[k] = (orig_i * cos - orig_q * sin) as f32;
            q[k] = (orig_i * sin + orig_q * cos) as f32;

            self.phase += increment;
            if self.phase > std::f64::consts::PI {
                self.phase -= TAU;
            } else if self.phase < -std::f64::consts::PI {
                self.phase += TAU;
            }
        }
    }

    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }
}

/// Convenience one-shot shift starting from zero phase.
pub fn frequency_shift(i: &mut [f32], q: &mut [f32], freq_hz: f64, sample_rate: f64) {
    Mixer::new(freq_hz, sample_rate).shift_in_place(i, q);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_frequency_shift_is_identity() {
        let mut i = vec![1.0, 0.5, -0.3];
        let mut q = vec![0.0, 0.2, 0.7];
        let orig_i = i.clone();
        let orig_q = q.clone();
        frequency_shift(&mut i, &mut q, 0.0, 48_000.0);
        for k in 0..i.len() {
            assert!((i[k] - orig_i[k]).abs() < 1e-6);
            assert!((q[k] - orig_q[k]).abs() < 1e-6);
        }
    }

    #[test]
    fn shift_preserves_magnitude() {
        let mut i = vec![1.0f32; 100];
        let mut q = vec![0.0f32; 100];
        frequency_shift(&mut i, &mut q, 1000.0, 48_000.0);
        for k in 0..100 {
            let mag = (i[k] * i[k] + q[k] * q[k]).sqrt();
            assert!((mag - 1.0).abs() < 1e-4, "mag[{k}]={mag}");
        }
    }

    #[test]
    fn phase_stays_bounded_across_many_samples() {
        let mut mixer = Mixer::new(123.456, 48_000.0);
        let mut i = vec![1.0f32; 1_000_000];
        let mut q = vec![0.0f32; 1_000_000];
        mixer.shift_in_place(&mut i, &mut q);
        assert!(mixer.phase.abs() <= std::f64::consts::PI);
    }
}
