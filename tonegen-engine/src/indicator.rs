//! Call-progress indicators.
//!
//! Each indicator is a fixed set of catch-all tones whose cadences and
//! start offsets together reproduce the regional pattern.

use log::debug;

use crate::error::Result;
use crate::pool::{ChainPolicy, ToneId};
use crate::stream::Stream;
use crate::tone::{ToneKind, ToneRequest};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Standard {
    Cept,
    Ansi,
    Japan,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Indicator {
    Dial,
    Busy,
    Congestion,
    Ringback,
    CallWaiting,
    RadioAck,
    SpecialInformation,
}

/// One component tone. Times in milliseconds; a zero period is continuous.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ToneSpec {
    pub frequency: u32,
    pub period: u32,
    pub play: u32,
    pub start: u32,
    pub duration: u32,
}

const fn continuous(frequency: u32) -> ToneSpec {
    ToneSpec { frequency, period: 0, play: 0, start: 0, duration: 0 }
}

const fn cadence(frequency: u32, period: u32, play: u32) -> ToneSpec {
    ToneSpec { frequency, period, play, start: 0, duration: 0 }
}

const fn burst(frequency: u32, period: u32, play: u32, start: u32) -> ToneSpec {
    ToneSpec { frequency, period, play, start, duration: 0 }
}

const fn once(frequency: u32, play: u32) -> ToneSpec {
    ToneSpec { frequency, period: play, play, start: 0, duration: play }
}

static CEPT_DIAL: [ToneSpec; 1] = [continuous(425)];
static CEPT_BUSY: [ToneSpec; 1] = [cadence(425, 1000, 500)];
static CEPT_CONGESTION: [ToneSpec; 1] = [cadence(425, 500, 250)];
static CEPT_RINGBACK: [ToneSpec; 1] = [cadence(425, 5000, 1000)];
static CEPT_CALL_WAITING: [ToneSpec; 2] = [burst(425, 4000, 200, 0), burst(425, 4000, 200, 400)];
static CEPT_RADIO_ACK: [ToneSpec; 1] = [once(425, 200)];
static CEPT_SPECIAL_INFORMATION: [ToneSpec; 3] = [
    burst( 950, 2000, 330,   0),
    burst(1400, 2000, 330, 330),
    burst(1800, 2000, 330, 660),
];

static ANSI_DIAL: [ToneSpec; 2] = [continuous(350), continuous(440)];
static ANSI_BUSY: [ToneSpec; 2] = [cadence(480, 1000, 500), cadence(620, 1000, 500)];
static ANSI_CONGESTION: [ToneSpec; 2] = [cadence(480, 500, 250), cadence(620, 500, 250)];
static ANSI_RINGBACK: [ToneSpec; 2] = [cadence(440, 6000, 2000), cadence(480, 6000, 2000)];
static ANSI_CALL_WAITING: [ToneSpec; 1] = [cadence(440, 10000, 300)];
static ANSI_RADIO_ACK: [ToneSpec; 1] = [once(440, 200)];
static ANSI_SPECIAL_INFORMATION: [ToneSpec; 3] = [
    burst( 914, 2000, 274,   0),
    burst(1371, 2000, 274, 274),
    burst(1777, 2000, 274, 548),
];

static JAPAN_DIAL: [ToneSpec; 1] = [continuous(400)];
static JAPAN_BUSY: [ToneSpec; 1] = [cadence(400, 1000, 500)];
static JAPAN_CONGESTION: [ToneSpec; 1] = [cadence(400, 500, 250)];
static JAPAN_RINGBACK: [ToneSpec; 1] = [cadence(400, 3000, 1000)];
static JAPAN_CALL_WAITING: [ToneSpec; 2] = [burst(400, 4000, 100, 0), burst(400, 4000, 100, 200)];
static JAPAN_RADIO_ACK: [ToneSpec; 1] = [once(400, 200)];

pub fn tones(standard: Standard, indicator: Indicator) -> &'static [ToneSpec] {
    use Indicator::*;
    use Standard::*;

    match (standard, indicator) {
        (Cept, Dial)                => &CEPT_DIAL,
        (Cept, Busy)                => &CEPT_BUSY,
        (Cept, Congestion)          => &CEPT_CONGESTION,
        (Cept, Ringback)            => &CEPT_RINGBACK,
        (Cept, CallWaiting)         => &CEPT_CALL_WAITING,
        (Cept, RadioAck)            => &CEPT_RADIO_ACK,
        (Cept, SpecialInformation)  => &CEPT_SPECIAL_INFORMATION,
        (Ansi, Dial)                => &ANSI_DIAL,
        (Ansi, Busy)                => &ANSI_BUSY,
        (Ansi, Congestion)          => &ANSI_CONGESTION,
        (Ansi, Ringback)            => &ANSI_RINGBACK,
        (Ansi, CallWaiting)         => &ANSI_CALL_WAITING,
        (Ansi, RadioAck)            => &ANSI_RADIO_ACK,
        (Ansi, SpecialInformation)  => &ANSI_SPECIAL_INFORMATION,
        (Japan, Dial)               => &JAPAN_DIAL,
        (Japan, Busy)               => &JAPAN_BUSY,
        (Japan, Congestion)         => &JAPAN_CONGESTION,
        (Japan, Ringback)           => &JAPAN_RINGBACK,
        (Japan, CallWaiting)        => &JAPAN_CALL_WAITING,
        (Japan, RadioAck)           => &JAPAN_RADIO_ACK,
        (Japan, SpecialInformation) => &CEPT_SPECIAL_INFORMATION,
    }
}

impl ToneSpec {
    fn request(&self, volume: u32) -> ToneRequest {
        let request = ToneRequest::continuous(ToneKind::Generic, self.frequency, volume)
            .with_start(self.start * 1000)
            .with_duration(self.duration * 1000);

        if self.period > 0 {
            request.with_cadence(self.period * 1000, self.play * 1000)
        } else {
            request
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveIndicator {
    pub standard: Standard,
    pub indicator: Indicator,
    tones: Vec<ToneId>,
}

impl ActiveIndicator {
    pub fn tones(&self) -> &[ToneId] {
        &self.tones
    }

    /// Removes whatever is still scheduled of this indicator.
    pub fn stop(self, stream: &mut Stream) -> Result<()> {
        debug!("indicator: stop {:?}/{:?}", self.standard, self.indicator);
        for id in self.tones {
            if stream.pool().contains(id) {
                stream.destroy(id, ChainPolicy::Kill)?;
            }
        }
        Ok(())
    }
}

pub fn start(stream: &mut Stream, standard: Standard, indicator: Indicator, volume: u32) -> Result<ActiveIndicator> {
    debug!("indicator: start {standard:?}/{indicator:?}");

    let mut active = ActiveIndicator {
        standard,
        indicator,
        tones: Vec::new(),
    };

    for spec in tones(standard, indicator) {
        match stream.create(&spec.request(volume)) {
            Ok(id) => active.tones.push(id),
            Err(e) => {
                active.stop(stream)?;
                return Err(e);
            }
        }
    }

    Ok(active)
}
