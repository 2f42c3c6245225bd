use crate::error::{Error, Result};
use crate::oscillator::Oscillator;
use crate::pool::ToneId;
use crate::SCALE;

/// Waveform kind. Chainability is a property of the kind.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ToneKind {
    DtmfLow,
    DtmfHigh,
    Note,
    Generic,
}

impl ToneKind {
    pub fn is_chainable(&self) -> bool {
        match self {
            ToneKind::DtmfLow | ToneKind::DtmfHigh | ToneKind::Note => true,
            ToneKind::Generic => false,
        }
    }
}

/// A create request as received from the control side. All times are
/// in ticks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ToneRequest {
    pub kind: ToneKind,
    /// Zero requests a silent placeholder.
    pub frequency: u32,
    pub volume: u32,
    pub period: u32,
    pub play: u32,
    /// Offset from the stream's current time. Ignored when chained.
    pub start: u32,
    /// Zero means unbounded.
    pub duration: u32,
}

impl ToneRequest {
    /// A continuously sounding tone: `period == play`, unbounded.
    pub fn continuous(kind: ToneKind, frequency: u32, volume: u32) -> Self {
        Self {
            kind,
            frequency,
            volume,
            period: u32::MAX,
            play: u32::MAX,
            start: 0,
            duration: 0,
        }
    }

    pub fn with_cadence(self, period: u32, play: u32) -> Self {
        Self { period, play, ..self }
    }

    pub fn with_start(self, start: u32) -> Self {
        Self { start, ..self }
    }

    pub fn with_duration(self, duration: u32) -> Self {
        Self { duration, ..self }
    }

    pub fn validate(&self) -> Result<()> {
        if self.volume == 0 {
            return Err(Error::InvalidRequest { reason: "zero volume" });
        }
        if self.period == 0 {
            return Err(Error::InvalidRequest { reason: "zero period" });
        }
        if self.play == 0 {
            return Err(Error::InvalidRequest { reason: "zero play" });
        }
        Ok(())
    }

    pub(crate) fn chains(&self) -> bool {
        self.kind.is_chainable() && self.duration > 0
    }
}

#[derive(Clone, Debug)]
pub enum Backend {
    Oscillator(Oscillator),
    Silent,
}

#[derive(Clone, Debug)]
pub struct Tone {
    pub(crate) kind: ToneKind,
    pub(crate) backend: Backend,
    /// Next root in the pool list.
    pub(crate) next: Option<ToneId>,
    /// Successor that starts when this tone ends. Owned by this tone.
    pub(crate) chain: Option<ToneId>,
    pub(crate) period: u32,
    pub(crate) play: u32,
    /// Scaled ticks.
    pub(crate) start: u64,
    /// Scaled ticks, zero when unbounded.
    pub(crate) end: u64,
}

impl Tone {
    /// `start` is in scaled ticks. `play` is clamped to `period`.
    pub(crate) fn new(request: &ToneRequest, start: u64, sample_rate: u32) -> Self {
        let end = if request.duration > 0 {
            start.saturating_add(u64::from(request.duration) * SCALE)
        } else {
            0
        };

        let backend = if request.frequency == 0 {
            Backend::Silent
        } else {
            Backend::Oscillator(Oscillator::new(request.frequency, sample_rate, request.volume))
        };

        Self {
            kind: request.kind,
            backend,
            next: None,
            chain: None,
            period: request.period,
            play: request.play.min(request.period),
            start,
            end,
        }
    }

    pub fn kind(&self) -> ToneKind {
        self.kind
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> Option<u64> {
        if self.end != 0 {
            Some(self.end)
        } else {
            None
        }
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    pub fn play(&self) -> u32 {
        self.play
    }

    pub fn is_silent(&self) -> bool {
        matches!(self.backend, Backend::Silent)
    }

    pub fn chain_successor(&self) -> Option<ToneId> {
        self.chain
    }

    pub(crate) fn has_expired(&self, t: u64) -> bool {
        self.end != 0 && self.end < t
    }

    /// Advances the tone by one sample at scaled time `t`. Returns its
    /// contribution, or `None` while pending or in the off part of its
    /// duty cycle.
    pub(crate) fn advance(&mut self, t: u64) -> Option<i32> {
        if t <= self.start {
            return None;
        }

        let relative = ((t - self.start) / SCALE) % u64::from(self.period);
        if relative >= u64::from(self.play) {
            return None;
        }

        match &mut self.backend {
            Backend::Oscillator(oscillator) => Some(oscillator.advance()),
            Backend::Silent => Some(0),
        }
    }
}
