//! Fixed-point sine resonator.
//!
//! The recurrence `y[n] = 2cos(w)·y[n-1] - y[n-2]` is carried in scaled
//! integers, so the output is bit-exact across platforms given the same
//! frequency, rate and volume.

use std::f64::consts::PI;

const AMPLITUDE: i64 = 32767;
const OFFSET: i64 = 8192;

/// Accumulator scale: full-scale amplitude with 13 fractional bits.
const FULL_SCALE: i64 = AMPLITUDE * OFFSET;

pub const VOLUME_MAX: u32 = 100;

#[derive(Clone, Debug)]
pub struct Oscillator {
    coefficient: i64,
    prior: i64,
    current: i64,
    /// `None` when muted.
    divisor: Option<i64>,
}

impl Oscillator {
    /// `volume` is a percentage of full scale and is clamped to 0..=100.
    pub fn new(frequency_hz: u32, sample_rate: u32, volume: u32) -> Self {
        let w = 2.0 * PI * (frequency_hz as f64 / sample_rate as f64);
        let volume = volume.min(VOLUME_MAX);

        Self {
            coefficient: (2.0 * w.cos() * FULL_SCALE as f64) as i64,
            prior: (-w.sin() * FULL_SCALE as f64) as i64,
            current: 0,
            divisor: if volume > 0 {
                Some((OFFSET * VOLUME_MAX as i64) / volume as i64)
            } else {
                None
            },
        }
    }

    pub fn is_muted(&self) -> bool {
        self.divisor.is_none()
    }

    pub fn advance(&mut self) -> i32 {
        // The coefficient/accumulator product needs more than 64 bits near full scale.
        let product = i128::from(self.coefficient) * i128::from(self.current);
        let next = (product / i128::from(FULL_SCALE)) as i64 - self.prior;

        self.prior = self.current;
        self.current = next;

        match self.divisor {
            Some(divisor) => (self.prior / divisor) as i32,
            None => 0,
        }
    }
}
