//! Musical notes on the chainable note kind.

use std::time::Duration;

use crate::config::ticks;
use crate::error::{Error, Result};
use crate::pool::ToneId;
use crate::stream::Stream;
use crate::tone::{ToneKind, ToneRequest};

pub const A4: u8 = 69;

/// Equal-tempered frequency of MIDI note `note`, to the nearest hertz.
pub fn frequency(note: u8) -> Result<u32> {
    if note > 127 {
        return Err(Error::InvalidNote(note));
    }
    let semitones = f64::from(note) - f64::from(A4);
    Ok((440.0 * (semitones / 12.0).exp2()).round() as u32)
}

fn request(frequency: u32, volume: u32, duration: Duration) -> ToneRequest {
    let duration = ticks(duration).max(1);
    ToneRequest::continuous(ToneKind::Note, frequency, volume)
        .with_cadence(duration, duration)
        .with_duration(duration)
}

/// Queues `note` behind any notes already queued on `stream`.
pub fn queue(stream: &mut Stream, note: u8, volume: u32, duration: Duration) -> Result<ToneId> {
    stream.create(&request(frequency(note)?, volume, duration))
}

/// Queues a silence of `duration`.
pub fn rest(stream: &mut Stream, duration: Duration) -> Result<ToneId> {
    stream.create(&request(0, 1, duration))
}
