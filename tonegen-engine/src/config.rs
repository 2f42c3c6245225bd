use std::time::Duration;

use crate::error::{Error, Result};
use crate::TICKS_PER_SECOND;

/// Output stream parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    pub sample_rate: u32,
    /// Samples per output buffer.
    pub buffer_samples: usize,
}

impl StreamConfig {
    pub fn new(sample_rate: u32, buffer_duration: Duration) -> Self {
        let buffer_samples = (buffer_duration.as_micros() * sample_rate as u128 / TICKS_PER_SECOND as u128) as usize;

        Self {
            sample_rate,
            buffer_samples,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 || u64::from(self.sample_rate) > TICKS_PER_SECOND {
            return Err(Error::InvalidSampleRate(self.sample_rate));
        }
        if self.buffer_samples == 0 {
            return Err(Error::InvalidBufferLength);
        }
        Ok(())
    }

    /// Nominal duration of one buffer, in ticks.
    pub fn buffer_ticks(&self) -> u64 {
        self.buffer_samples as u64 * TICKS_PER_SECOND / u64::from(self.sample_rate)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        // Narrowband telephony, 20 millisecond buffers.
        Self::new(8000, Duration::from_millis(20))
    }
}

/// Converts a duration to whole ticks, saturating at the request field width.
pub fn ticks(duration: Duration) -> u32 {
    duration.as_micros().min(u32::MAX as u128) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_narrowband() {
        let config = StreamConfig::default();
        assert_eq!(config.sample_rate, 8000);
        assert_eq!(config.buffer_samples, 160);
        assert_eq!(config.buffer_ticks(), 20_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_rates() {
        let mut config = StreamConfig::default();
        config.sample_rate = 0;
        assert_eq!(config.validate(), Err(Error::InvalidSampleRate(0)));

        config.sample_rate = 2_000_000;
        assert_eq!(config.validate(), Err(Error::InvalidSampleRate(2_000_000)));

        let config = StreamConfig { sample_rate: 8000, buffer_samples: 0 };
        assert_eq!(config.validate(), Err(Error::InvalidBufferLength));
    }

    #[test]
    fn duration_to_ticks() {
        assert_eq!(ticks(Duration::from_millis(100)), 100_000);
        assert_eq!(ticks(Duration::from_secs(1_000_000)), u32::MAX);
    }
}
