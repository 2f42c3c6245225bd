//! Offline rendering: drives a stream buffer by buffer as fast as the
//! sink accepts samples.

use tonegen_engine::Stream;

use crate::sink::{Sink, SinkError};

/// Renders `ticks` worth of output. Returns the stream time afterwards.
pub fn render_for(stream: &mut Stream, sink: &mut Sink, ticks: u64) -> Result<u64, SinkError> {
    let mut buffer = vec![0; stream.config().buffer_samples];
    let end = stream.time() + ticks;
    let mut tick = stream.time();

    while tick < end {
        tick = stream.write_samples(tick, &mut buffer);
        sink.write(&buffer)?;
    }

    Ok(tick)
}

/// Renders until every tone has retired, or `limit` ticks have passed.
/// Unbounded tones therefore stop at the limit.
pub fn render_until_idle(stream: &mut Stream, sink: &mut Sink, limit: u64) -> Result<u64, SinkError> {
    let mut buffer = vec![0; stream.config().buffer_samples];
    let end = stream.time() + limit;
    let mut tick = stream.time();

    while !stream.pool().is_empty() && tick < end {
        tick = stream.write_samples(tick, &mut buffer);
        sink.write(&buffer)?;
    }

    Ok(tick)
}
