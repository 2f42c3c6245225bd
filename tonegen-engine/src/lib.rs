//! Telephony tone synthesis and scheduling.
//!
//! A [`Stream`] owns a [`Pool`] of timed tones. The output side calls
//! [`Stream::write_samples`] once per buffer; the control side creates
//! and destroys tones between (or, through [`SharedStream`], during)
//! those calls.

pub mod config;
pub mod dtmf;
pub mod error;
pub mod indicator;
pub mod note;
pub mod oscillator;
pub mod pool;
pub mod shared;
pub mod stream;
pub mod tone;

#[cfg(test)]
mod goertzel;

pub use config::StreamConfig;
pub use error::{Error, Result};
pub use pool::{ChainPolicy, Pool, ToneId};
pub use shared::SharedStream;
pub use stream::Stream;
pub use tone::{ToneKind, ToneRequest};

/// Sub-tick resolution of all internal time arithmetic.
pub const SCALE: u64 = 1024;

/// External ticks per second. One tick is a microsecond.
pub const TICKS_PER_SECOND: u64 = 1_000_000;

/// Latest representable tick. Later ticks are clamped to it.
pub const MAX_TICK: u64 = u64::MAX / SCALE;

/// Largest magnitude a mixed output sample may take.
pub const SAMPLE_LIMIT: i32 = 32767;

pub type Sample = i16;
