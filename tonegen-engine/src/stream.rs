//! Per-stream scheduling and mixing.

use log::{debug, error, trace};

use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::pool::{ChainPolicy, Pool, ToneId};
use crate::tone::{Tone, ToneRequest};
use crate::{Sample, MAX_TICK, SAMPLE_LIMIT, SCALE, TICKS_PER_SECOND};

/// One output stream: its pool of tones and its virtual clock.
#[derive(Debug)]
pub struct Stream {
    config: StreamConfig,
    /// Scaled ticks.
    clock: u64,
    pool: Pool,
}

impl Stream {
    pub fn new(config: StreamConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            clock: 0,
            pool: Pool::new(),
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Current time in ticks.
    pub fn time(&self) -> u64 {
        self.clock / SCALE
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Head of the pool, handed to the output side for [`Stream::detach`].
    pub fn anchor(&self) -> Option<ToneId> {
        self.pool.anchor()
    }

    /// Scaled ticks per output sample.
    fn sample_ticks(&self) -> u64 {
        (TICKS_PER_SECOND * SCALE) / u64::from(self.config.sample_rate)
    }

    /// Schedules a tone. A bounded tone of a chainable kind is queued
    /// behind the existing chain of that kind, if there is one; otherwise
    /// the tone becomes a new root starting `request.start` ticks from now.
    ///
    /// The one exception is a chain whose tail is unbounded: that tail
    /// never hands over, so instead of queueing behind it the request
    /// becomes a new root and sounds alongside it. A digit queued on a
    /// [`Dialer`](crate::dtmf::Dialer) while another is held with `start`
    /// therefore plays at once, mixed with the held one.
    pub fn create(&mut self, request: &ToneRequest) -> Result<ToneId> {
        request.validate()?;

        if request.chains() {
            if let Some(tail) = self.pool.chain_tail(request.kind) {
                // An unbounded tail never hands over, so it is not chained onto.
                if let Some(end) = self.pool.get(tail).and_then(Tone::end) {
                    debug!("create: {:?} chained after {tail:?} at {}", request.kind, end / SCALE);
                    let tone = Tone::new(request, end, self.config.sample_rate);
                    return self.pool.append_chain(tail, tone);
                }
            }
        }

        let start = (self.time() + u64::from(request.start)).min(MAX_TICK) * SCALE;
        debug!("create: {:?} as root at {}", request.kind, start / SCALE);
        let tone = Tone::new(request, start, self.config.sample_rate);
        self.pool.insert_root(tone)
    }

    pub fn destroy(&mut self, id: ToneId, policy: ChainPolicy) -> Result<()> {
        self.pool.destroy(id, policy)
    }

    pub fn destroy_all(&mut self) {
        self.pool.destroy_all();
    }

    /// Fills `buffer` starting at `tick` and returns the tick following
    /// the last sample.
    ///
    /// The sub-tick clock carries over between calls as long as the caller
    /// hands back the tick it was given; any other value resynchronises
    /// the clock. Ticks past [`MAX_TICK`] are clamped, and the clock stops
    /// there.
    pub fn write_samples(&mut self, tick: u64, buffer: &mut [Sample]) -> u64 {
        let tick = tick.min(MAX_TICK);
        if tick != self.time() {
            trace!("write_samples: clock resync {} -> {tick}", self.time());
            self.clock = tick * SCALE;
        }

        let dt = self.sample_ticks();

        if self.pool.is_empty() {
            buffer.fill(0);
            self.clock = self.clock.saturating_add(dt.saturating_mul(buffer.len() as u64));
            return self.time();
        }

        for output in buffer.iter_mut() {
            *output = self.mix(self.clock);
            self.clock = self.clock.saturating_add(dt);
        }

        self.time()
    }

    /// Computes one sample at scaled time `t`, retiring expired tones.
    fn mix(&mut self, t: u64) -> Sample {
        let mut sample: i64 = 0;
        let mut prev = None;
        let mut cursor = self.pool.anchor();

        while let Some(id) = cursor {
            let (next, expired) = match self.pool.get(id) {
                Some(tone) => (tone.next, tone.has_expired(t)),
                None => break,
            };

            if expired {
                trace!("retire {id:?} at {}", t / SCALE);
                // A promoted successor sits in the retired tone's slot and
                // is evaluated on this same sample.
                cursor = self.pool.unlink(prev, id, ChainPolicy::Preserve).or(next);
                continue;
            }

            if let Some(value) = self.pool.get_mut(id).and_then(|tone| tone.advance(t)) {
                sample += i64::from(value);
            }

            prev = Some(id);
            cursor = next;
        }

        let limit = i64::from(SAMPLE_LIMIT);
        sample.clamp(-limit, limit) as Sample
    }

    /// Called when the output side drops its association with this pool.
    /// `anchor` must be the pool head it was given.
    pub fn detach(&mut self, anchor: Option<ToneId>) -> Result<()> {
        let anchor = match anchor {
            Some(anchor) => anchor,
            None => return Ok(()),
        };

        if self.pool.anchor() != Some(anchor) {
            error!("detach: anchor {anchor:?} does not match pool head {:?}", self.pool.anchor());
            return Err(Error::AnchorMismatch);
        }

        self.pool.destroy_all();
        Ok(())
    }
}
