use thiserror::Error;

use crate::pool::ToneId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid tone request: {reason}")]
    InvalidRequest { reason: &'static str },
    #[error("tone pool allocation failed")]
    Allocation,
    #[error("tone {0:?} is not reachable from the stream's pool")]
    NotInPool(ToneId),
    #[error("detach anchor does not match the pool head")]
    AnchorMismatch,
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(u32),
    #[error("invalid buffer length")]
    InvalidBufferLength,
    #[error("not a DTMF digit: {0:?}")]
    InvalidDigit(char),
    #[error("note {0} out of range")]
    InvalidNote(u8),
}

pub type Result<T> = core::result::Result<T, Error>;
