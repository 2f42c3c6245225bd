//! Single-bin DFT used by tests to check the frequency content of
//! rendered tones.

use std::f32::consts::TAU;

use num_complex::Complex;

pub struct GoertzelDetector {
    w_n: f32,
    w_n_z1: f32,
    w_n_z2: f32,
    k_fb: f32,
    k_ff: Complex<f32>,
    n: usize,
}

impl GoertzelDetector {
    pub fn from_hz(frequency_hz: f32, sample_rate: u32, n: usize) -> Self {
        let omega = TAU * frequency_hz / sample_rate as f32;
        Self {
            w_n: 0.0,
            w_n_z1: 0.0,
            w_n_z2: 0.0,
            k_fb: omega.cos() * 2.0,
            k_ff: -(Complex::new(0.0, -omega).exp()),
            n,
        }
    }

    pub fn iterate(&mut self, x_n: f32) {
        self.w_n_z2 = self.w_n_z1;
        self.w_n_z1 = self.w_n;
        self.w_n = x_n + self.w_n_z1 * self.k_fb - self.w_n_z2;
    }

    /// Level relative to a full-scale sine, in dB.
    pub fn poll(&mut self) -> f32 {
        let y_n = self.w_n + self.w_n_z1 * self.k_ff;
        let magnitude = y_n.norm() * 2.0 / self.n as f32;

        self.w_n = 0.0;
        self.w_n_z1 = 0.0;
        self.w_n_z2 = 0.0;

        (magnitude.max(1e-9)).log10() * 20.0
    }
}

/// Level of `frequency_hz` in `samples`, in dB relative to full scale.
pub fn level(samples: &[i16], frequency_hz: f32, sample_rate: u32) -> f32 {
    let mut detector = GoertzelDetector::from_hz(frequency_hz, sample_rate, samples.len());
    for &sample in samples {
        detector.iterate(sample as f32 / 32767.0);
    }
    detector.poll()
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;

    use super::*;

    #[test]
    fn full_scale_sine_reads_zero_db() {
        let samples: Vec<i16> = (0..800)
            .map(|n| ((TAU * 1000.0 * n as f32 / 8000.0).sin() * 32767.0) as i16)
            .collect();
        assert!(level(&samples, 1000.0, 8000).abs() < 0.5);
        assert!(level(&samples, 1500.0, 8000) < -40.0);
    }
}
