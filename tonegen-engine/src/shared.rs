use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::StreamConfig;
use crate::error::Result;
use crate::pool::{ChainPolicy, ToneId};
use crate::stream::Stream;
use crate::tone::ToneRequest;
use crate::Sample;

/// A [`Stream`] shared between a control thread and an output thread.
///
/// Every operation holds the one lock for its whole duration, so a
/// buffer is never mixed against a half-linked pool.
#[derive(Clone)]
pub struct SharedStream {
    stream: Arc<Mutex<Stream>>,
}

impl SharedStream {
    pub fn new(config: StreamConfig) -> Result<Self> {
        Ok(Self::from(Stream::new(config)?))
    }

    pub fn create(&self, request: &ToneRequest) -> Result<ToneId> {
        self.stream.lock().create(request)
    }

    pub fn destroy(&self, id: ToneId, policy: ChainPolicy) -> Result<()> {
        self.stream.lock().destroy(id, policy)
    }

    pub fn destroy_all(&self) {
        self.stream.lock().destroy_all()
    }

    pub fn write_samples(&self, tick: u64, buffer: &mut [Sample]) -> u64 {
        self.stream.lock().write_samples(tick, buffer)
    }

    pub fn detach(&self, anchor: Option<ToneId>) -> Result<()> {
        self.stream.lock().detach(anchor)
    }

    pub fn anchor(&self) -> Option<ToneId> {
        self.stream.lock().anchor()
    }

    pub fn time(&self) -> u64 {
        self.stream.lock().time()
    }

    /// Runs `f` with the lock held, for multi-step requests.
    pub fn with<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Stream) -> T,
    {
        f(&mut self.stream.lock())
    }
}

impl From<Stream> for SharedStream {
    fn from(stream: Stream) -> Self {
        Self {
            stream: Arc::new(Mutex::new(stream)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::tone::ToneKind;

    #[test]
    fn control_and_output_threads() {
        let shared = SharedStream::new(StreamConfig::default()).unwrap();

        let control = thread::spawn({
            let shared = shared.clone();
            move || {
                let request = ToneRequest::continuous(ToneKind::DtmfLow, 697, 50).with_duration(5_000);
                let mut ids = Vec::new();
                for _ in 0..200 {
                    ids.push(shared.create(&request).unwrap());
                }
                ids
            }
        });

        let mut tick = 0;
        let mut buffer = vec![0; 160];
        for _ in 0..50 {
            tick = shared.write_samples(tick, &mut buffer);
        }

        let ids = control.join().unwrap();
        assert_eq!(tick, 1_000_000);

        // Whatever was not yet retired is still one intact chain.
        shared.with(|stream| {
            let pool = stream.pool();
            let live = ids.iter().filter(|&&id| pool.contains(id)).count();
            assert_eq!(pool.len(), live);
            assert!(pool.roots().count() <= 1);
        });
    }

    #[test]
    fn with_holds_lock_across_steps() {
        let shared = SharedStream::new(StreamConfig::default()).unwrap();
        let (a, b) = shared.with(|stream| {
            let request = ToneRequest::continuous(ToneKind::Note, 440, 50).with_duration(1000);
            (stream.create(&request).unwrap(), stream.create(&request).unwrap())
        });
        assert_eq!(shared.anchor(), Some(a));

        shared.destroy(a, ChainPolicy::Preserve).unwrap();
        assert_eq!(shared.anchor(), Some(b));

        shared.destroy_all();
        assert_eq!(shared.anchor(), None);
        assert_eq!(shared.time(), 0);
    }
}
