//! DTMF digits as pairs of chainable tones.

use std::time::Duration;

use log::debug;

use crate::config::ticks;
use crate::error::{Error, Result};
use crate::pool::{ChainPolicy, ToneId};
use crate::stream::Stream;
use crate::tone::{ToneKind, ToneRequest};

static FREQUENCIES_LOW:  [u32; 4] = [ 697,  770,  852,  941];
static FREQUENCIES_HIGH: [u32; 4] = [1209, 1336, 1477, 1633];

static KEY_MAP: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Row and column frequencies of `digit`.
pub fn frequencies(digit: char) -> Option<(u32, u32)> {
    let digit = digit.to_ascii_uppercase();
    KEY_MAP.iter().enumerate().find_map(|(row, keys)| {
        keys.iter()
            .position(|&key| key == digit)
            .map(|column| (FREQUENCIES_LOW[row], FREQUENCIES_HIGH[column]))
    })
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DialerConfig {
    pub volume: u32,
    pub tone_duration: Duration,
    /// Silence after each queued digit.
    pub gap: Duration,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            volume: 50,
            tone_duration: Duration::from_millis(100),
            gap: Duration::from_millis(50),
        }
    }
}

/// Both halves of a sounding digit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DtmfTones {
    pub low: ToneId,
    pub high: ToneId,
}

#[derive(Clone, Debug, Default)]
pub struct Dialer {
    config: DialerConfig,
}

impl Dialer {
    pub fn new(config: DialerConfig) -> Self {
        Self {
            config,
        }
    }

    pub fn config(&self) -> &DialerConfig {
        &self.config
    }

    fn pair(&self, stream: &mut Stream, low: u32, high: u32, duration: u32) -> Result<DtmfTones> {
        let period = if duration > 0 { duration } else { u32::MAX };
        let request = ToneRequest {
            kind: ToneKind::DtmfLow,
            frequency: low,
            volume: self.config.volume,
            period,
            play: period,
            start: 0,
            duration,
        };

        let low = stream.create(&request)?;
        let high = match stream.create(&ToneRequest { kind: ToneKind::DtmfHigh, frequency: high, ..request }) {
            Ok(high) => high,
            Err(e) => {
                // A freshly inserted root is the head; a chained half plays out.
                if stream.anchor() == Some(low) {
                    stream.destroy(low, ChainPolicy::Kill)?;
                }
                return Err(e);
            }
        };

        Ok(DtmfTones { low, high })
    }

    /// Sounds `digit` until [`Dialer::stop`].
    pub fn start(&self, stream: &mut Stream, digit: char) -> Result<DtmfTones> {
        let (low, high) = frequencies(digit).ok_or(Error::InvalidDigit(digit))?;
        debug!("dtmf: start {digit}");
        self.pair(stream, low, high, 0)
    }

    pub fn stop(&self, stream: &mut Stream, tones: DtmfTones) -> Result<()> {
        let low = stream.destroy(tones.low, ChainPolicy::Kill);
        let high = stream.destroy(tones.high, ChainPolicy::Kill);
        low.and(high)
    }

    /// Queues `digits` back to back behind anything already queued, each
    /// followed by the configured gap. Nothing is queued if any digit is
    /// invalid.
    pub fn queue(&self, stream: &mut Stream, digits: &str) -> Result<Vec<DtmfTones>> {
        let pairs = digits
            .chars()
            .map(|digit| frequencies(digit).ok_or(Error::InvalidDigit(digit)))
            .collect::<Result<Vec<_>>>()?;

        let duration = ticks(self.config.tone_duration).max(1);
        let gap = ticks(self.config.gap);

        debug!("dtmf: queue {digits:?}");

        let mut queued = Vec::with_capacity(pairs.len());
        for (low, high) in pairs {
            queued.push(self.pair(stream, low, high, duration)?);
            if gap > 0 {
                self.pair(stream, 0, 0, gap)?;
            }
        }
        Ok(queued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamConfig;
    use crate::goertzel::level;

    fn stream() -> Stream {
        Stream::new(StreamConfig::default()).unwrap()
    }

    fn render(stream: &mut Stream, samples: usize) -> Vec<i16> {
        let mut buffer = vec![0; samples];
        let tick = stream.time();
        stream.write_samples(tick, &mut buffer);
        buffer
    }

    #[test]
    fn keypad_frequencies() {
        assert_eq!(frequencies('1'), Some((697, 1209)));
        assert_eq!(frequencies('5'), Some((770, 1336)));
        assert_eq!(frequencies('0'), Some((941, 1336)));
        assert_eq!(frequencies('#'), Some((941, 1477)));
        assert_eq!(frequencies('d'), Some((941, 1633)));
        assert_eq!(frequencies('x'), None);
    }

    #[test]
    fn digit_carries_row_and_column() {
        let mut dut = stream();
        let dialer = Dialer::default();
        let tones = dialer.start(&mut dut, '5').unwrap();

        let output = render(&mut dut, 800);
        let signal = &output[8..];
        for frequency in [770.0, 1336.0] {
            assert!(level(signal, frequency, 8000) > -10.0, "{frequency} Hz missing");
        }
        for frequency in [697.0, 852.0, 941.0, 1209.0, 1477.0, 1633.0] {
            assert!(level(signal, frequency, 8000) < -25.0, "{frequency} Hz present");
        }

        dialer.stop(&mut dut, tones).unwrap();
        assert!(dut.pool().is_empty());
    }

    #[test]
    fn queued_digits_chain() {
        let mut dut = stream();
        let dialer = Dialer::default();
        let queued = dialer.queue(&mut dut, "12").unwrap();
        assert_eq!(queued.len(), 2);

        // One root per kind; digit, gap, digit, gap behind each.
        assert_eq!(dut.pool().roots().count(), 2);
        assert_eq!(dut.pool().len(), 8);
        assert_eq!(dut.pool().chain(queued[0].low).len(), 3);

        let second = dut.pool().get(queued[1].low).unwrap();
        assert_eq!(second.start(), 150_000 * crate::SCALE);

        // Both digits and gaps play out in 300 milliseconds.
        render(&mut dut, 2400);
        assert_eq!(dut.pool().len(), 2);
        render(&mut dut, 16);
        assert!(dut.pool().is_empty());
    }

    #[test]
    fn queue_while_held_sounds_alongside() {
        let mut dut = stream();
        // Quiet enough that two digits mix without clipping.
        let dialer = Dialer::new(DialerConfig { volume: 25, ..DialerConfig::default() });
        let held = dialer.start(&mut dut, '5').unwrap();
        let queued = dialer.queue(&mut dut, "1").unwrap();

        // The held digit never ends, so the queued one gets its own roots
        // and its gap chains behind those.
        assert_eq!(dut.pool().roots().count(), 4);
        assert_eq!(dut.pool().len(), 6);
        assert!(dut.pool().chain(held.low).is_empty());
        assert_eq!(dut.pool().chain(queued[0].low).len(), 1);

        let output = render(&mut dut, 800);
        for frequency in [697.0, 770.0, 1209.0, 1336.0] {
            assert!(level(&output[8..], frequency, 8000) > -16.0, "{frequency} Hz missing");
        }
    }

    #[test]
    fn gaps_are_silent() {
        let mut dut = stream();
        Dialer::default().queue(&mut dut, "9").unwrap();

        let output = render(&mut dut, 1200);
        assert!(output[8..800].iter().any(|&s| s != 0));
        assert!(output[802..].iter().all(|&s| s == 0));
    }

    #[test]
    fn invalid_digit_queues_nothing() {
        let mut dut = stream();
        assert_eq!(Dialer::default().queue(&mut dut, "12x"), Err(Error::InvalidDigit('x')));
        assert!(dut.pool().is_empty());
    }
}
