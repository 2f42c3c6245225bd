//! Real-time output: a pump thread mixes one buffer per buffer period into
//! a ring, and a sink thread drains the ring into the output.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, Sender, TryRecvError};
use log::warn;
use ringbuf::{Consumer, Producer};
use thiserror::Error;
use tonegen_engine::{Sample, SharedStream};

use crate::sink::{Sink, SinkError};

#[derive(Error, Debug)]
pub enum PumpError {
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("event receiver went away")]
    Disconnected,
}

#[derive(Copy, Clone, Debug)]
pub enum PumpMessage {
    Stop,
}

#[derive(Clone, Debug)]
pub enum MonitorEvent {
    Buffer { time: u64, peak: Sample, tones: usize },
    Overrun { dropped: usize },
    Step(String),
    Stopped { time: u64 },
}

/// Mixes buffers at real-time pace until told to stop. Dropping `done` on
/// return tells the sink thread that no more samples will arrive.
pub fn pump(
    stream: SharedStream,
    buffer_duration: Duration,
    buffer_samples: usize,
    mut ring: Producer<Sample>,
    control: Receiver<PumpMessage>,
    events: Sender<MonitorEvent>,
    done: Sender<()>,
) -> Result<(), PumpError> {
    let mut buffer = vec![0; buffer_samples];
    let mut tick = stream.time();
    let mut deadline = Instant::now();

    loop {
        match control.try_recv() {
            Ok(PumpMessage::Stop) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {},
        }

        tick = stream.write_samples(tick, &mut buffer);
        let tones = stream.with(|stream| stream.pool().len());

        let pushed = ring.push_slice(&buffer);
        if pushed < buffer.len() {
            events.send(MonitorEvent::Overrun { dropped: buffer.len() - pushed })
                .map_err(|_| PumpError::Disconnected)?;
        }

        let peak = buffer.iter().map(|s| s.saturating_abs()).max().unwrap_or(0);
        events.send(MonitorEvent::Buffer { time: tick, peak, tones })
            .map_err(|_| PumpError::Disconnected)?;

        deadline += buffer_duration;
        if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        } else {
            warn!("pump: behind schedule at tick {tick}");
            deadline = Instant::now();
        }
    }

    stream.destroy_all();
    events.send(MonitorEvent::Stopped { time: tick }).map_err(|_| PumpError::Disconnected)?;
    drop(done);
    Ok(())
}

/// Moves samples from the ring to `sink` until the pump is done and the
/// ring is empty.
pub fn drain(mut ring: Consumer<Sample>, mut sink: Sink, done: Receiver<()>, poll: Duration) -> Result<(), SinkError> {
    let mut buffer = vec![0; 1024];

    loop {
        let count = ring.pop_slice(&mut buffer);
        if count > 0 {
            sink.write(&buffer[..count])?;
            continue;
        }

        if let Err(TryRecvError::Disconnected) = done.try_recv() {
            if ring.is_empty() {
                break;
            }
        } else {
            thread::sleep(poll);
        }
    }

    sink.finish()
}

#[cfg(test)]
mod tests {
    use crossbeam::channel::unbounded;
    use ringbuf::RingBuffer;
    use tonegen_engine::{StreamConfig, ToneKind, ToneRequest};

    use super::*;
    use crate::sink::tests::SharedBuffer;
    use crate::sink::Format;

    #[test]
    fn pump_feeds_sink_until_stopped() {
        let config = StreamConfig::new(8000, Duration::from_millis(5));
        let stream = SharedStream::new(config).unwrap();
        stream.create(&ToneRequest::continuous(ToneKind::Generic, 2000, 100)).unwrap();

        let (producer, consumer) = RingBuffer::<Sample>::new(4096).split();
        let (control_sender, control_receiver) = unbounded();
        let (event_sender, event_receiver) = unbounded();
        let (done_sender, done_receiver) = unbounded();

        let output = SharedBuffer::default();
        let sink = Sink::from_writer(Box::new(output.clone()), Format::Raw).unwrap();
        let drainer = thread::spawn(move || drain(consumer, sink, done_receiver, Duration::from_millis(1)));

        let pumper = thread::spawn({
            let stream = stream.clone();
            move || pump(stream, Duration::from_millis(5), config.buffer_samples, producer, control_receiver, event_sender, done_sender)
        });

        // Wait for a few buffers, then stop.
        let mut buffers = 0;
        while buffers < 4 {
            if let MonitorEvent::Buffer { peak, .. } = event_receiver.recv().unwrap() {
                assert_eq!(peak, 32767);
                buffers += 1;
            }
        }
        control_sender.send(PumpMessage::Stop).unwrap();

        pumper.join().unwrap().unwrap();
        drainer.join().unwrap().unwrap();

        let stopped = event_receiver.iter().any(|event| matches!(event, MonitorEvent::Stopped { .. }));
        assert!(stopped);
        assert!(stream.anchor().is_none());

        let bytes = output.0.lock().unwrap().len();
        assert!(bytes >= 4 * 40 * 2);
        assert_eq!(bytes % (40 * 2), 0);
    }
}
