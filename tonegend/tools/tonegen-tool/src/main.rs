use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand, Args, ArgEnum};
use console::{style, Color};
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::info;
use ringbuf::RingBuffer;
use thiserror::Error;

use tonegen_engine::dtmf::{Dialer, DialerConfig};
use tonegen_engine::indicator::{self, Indicator, Standard};
use tonegen_engine::{note, Sample, SharedStream, Stream, StreamConfig, TICKS_PER_SECOND};

use crate::pump::{MonitorEvent, PumpError, PumpMessage};
use crate::sink::{Format, Sink, SinkError};

mod codec;
mod pump;
mod render;
mod sink;

#[derive(Error, Debug)]
pub(crate) enum ToolError {
    #[error(transparent)]
    Engine(#[from] tonegen_engine::Error),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Pump(#[from] PumpError),
    #[error("not a note: {0:?}")]
    Note(String),
    #[error("{0} thread panicked")]
    Thread(&'static str),
}

type Result<T> = std::result::Result<T, ToolError>;

#[derive(Parser)]
#[clap(author, version, about, long_about=None)]
pub(crate) struct Cli {
    #[clap(flatten)]
    pub output: OutputArgs,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub(crate) struct OutputArgs {
    /// Output file, "-" for stdout.
    #[clap(long, short, default_value = "-")]
    pub output: PathBuf,

    #[clap(long, arg_enum, default_value = "raw")]
    pub format: Format,

    /// Sample rate in Hz.
    #[clap(long, default_value_t = 8000)]
    pub rate: u32,

    /// Output buffer length in milliseconds.
    #[clap(long, default_value_t = 20)]
    pub buffer_ms: u64,
}

impl OutputArgs {
    fn stream_config(&self) -> StreamConfig {
        StreamConfig::new(self.rate, Duration::from_millis(self.buffer_ms))
    }

    fn open(&self) -> Result<Sink> {
        Ok(Sink::open(&self.output, self.format, self.rate)?)
    }
}

#[derive(ArgEnum, Copy, Clone)]
pub(crate) enum StandardArg {
    Cept,
    Ansi,
    Japan,
}

impl From<StandardArg> for Standard {
    fn from(standard: StandardArg) -> Self {
        match standard {
            StandardArg::Cept  => Standard::Cept,
            StandardArg::Ansi  => Standard::Ansi,
            StandardArg::Japan => Standard::Japan,
        }
    }
}

#[derive(ArgEnum, Copy, Clone)]
pub(crate) enum IndicatorArg {
    Dial,
    Busy,
    Congestion,
    Ringback,
    CallWaiting,
    RadioAck,
    SpecialInformation,
}

impl From<IndicatorArg> for Indicator {
    fn from(indicator: IndicatorArg) -> Self {
        match indicator {
            IndicatorArg::Dial               => Indicator::Dial,
            IndicatorArg::Busy               => Indicator::Busy,
            IndicatorArg::Congestion         => Indicator::Congestion,
            IndicatorArg::Ringback           => Indicator::Ringback,
            IndicatorArg::CallWaiting        => Indicator::CallWaiting,
            IndicatorArg::RadioAck           => Indicator::RadioAck,
            IndicatorArg::SpecialInformation => Indicator::SpecialInformation,
        }
    }
}

#[derive(Args)]
pub(crate) struct DtmfArgs {
    /// Digits from 0-9, *, #, A-D.
    pub digits: String,

    #[clap(long, default_value_t = 100)]
    pub duration_ms: u64,

    #[clap(long, default_value_t = 50)]
    pub gap_ms: u64,

    #[clap(long, default_value_t = 50)]
    pub volume: u32,
}

#[derive(Args)]
pub(crate) struct IndicatorArgs {
    #[clap(arg_enum)]
    pub standard: StandardArg,

    #[clap(arg_enum)]
    pub indicator: IndicatorArg,

    #[clap(long, default_value_t = 5000)]
    pub length_ms: u64,

    #[clap(long, default_value_t = 40)]
    pub volume: u32,
}

#[derive(Args)]
pub(crate) struct MelodyArgs {
    /// MIDI note numbers, or "r" for a rest.
    #[clap(required = true)]
    pub notes: Vec<String>,

    #[clap(long, default_value_t = 250)]
    pub note_ms: u64,

    #[clap(long, default_value_t = 50)]
    pub volume: u32,
}

#[derive(Args)]
pub(crate) struct MonitorArgs {
    #[clap(long, arg_enum, default_value = "cept")]
    pub standard: StandardArg,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    #[clap(name="dtmf")]
    Dtmf(DtmfArgs),

    #[clap(name="indicator")]
    Indicator(IndicatorArgs),

    #[clap(name="melody")]
    Melody(MelodyArgs),

    #[clap(name="monitor")]
    Monitor(MonitorArgs),
}

/// Rendering of an unbounded chain stops here.
const RENDER_LIMIT: u64 = 3600 * TICKS_PER_SECOND;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    let config = args.output.stream_config();

    match args.command {
        Commands::Dtmf(a) => {
            let mut stream = Stream::new(config)?;
            let dialer = Dialer::new(DialerConfig {
                volume: a.volume,
                tone_duration: Duration::from_millis(a.duration_ms),
                gap: Duration::from_millis(a.gap_ms),
            });
            dialer.queue(&mut stream, &a.digits)?;

            let mut sink = args.output.open()?;
            let tick = render::render_until_idle(&mut stream, &mut sink, RENDER_LIMIT)?;
            sink.finish()?;
            info!("dtmf: {} digits in {} ms", a.digits.len(), tick / 1000);
        },
        Commands::Indicator(a) => {
            let mut stream = Stream::new(config)?;
            let active = indicator::start(&mut stream, a.standard.into(), a.indicator.into(), a.volume)?;

            let mut sink = args.output.open()?;
            render::render_for(&mut stream, &mut sink, a.length_ms * 1000)?;
            active.stop(&mut stream)?;
            sink.finish()?;
        },
        Commands::Melody(a) => {
            let mut stream = Stream::new(config)?;
            let step = Duration::from_millis(a.note_ms);
            for n in &a.notes {
                if n == "r" {
                    note::rest(&mut stream, step)?;
                } else {
                    let number = n.parse::<u8>().map_err(|_| ToolError::Note(n.clone()))?;
                    note::queue(&mut stream, number, a.volume, step)?;
                }
            }

            let mut sink = args.output.open()?;
            render::render_until_idle(&mut stream, &mut sink, RENDER_LIMIT)?;
            sink.finish()?;
        },
        Commands::Monitor(a) => {
            let stream = SharedStream::new(config)?;
            let sink = args.output.open()?;
            monitor(stream, config, sink, a.standard.into())?;
        },
    }

    Ok(())
}

///////////////////////////////////////////////////////////////////////

fn monitor(stream: SharedStream, config: StreamConfig, sink: Sink, standard: Standard) -> Result<()> {
    let buffer_duration = Duration::from_micros(config.buffer_ticks());

    // Half a second of slack between the pump and the sink.
    let (producer, consumer) = RingBuffer::<Sample>::new(config.sample_rate as usize / 2).split();
    let (control_sender, control_receiver) = unbounded();
    let (event_sender, event_receiver) = unbounded();
    let (done_sender, done_receiver) = unbounded();

    let sink_thread = thread::Builder::new()
        .name("tg_sink".into())
        .spawn(move || pump::drain(consumer, sink, done_receiver, buffer_duration / 4))
        .map_err(|_| ToolError::Thread("tg_sink"))?;

    let pump_thread = thread::Builder::new()
        .name("tg_pump".into())
        .spawn({
            let stream = stream.clone();
            let event_sender = event_sender.clone();
            move || pump::pump(stream, buffer_duration, config.buffer_samples, producer, control_receiver, event_sender, done_sender)
        })
        .map_err(|_| ToolError::Thread("tg_pump"))?;

    let control_thread = thread::Builder::new()
        .name("tg_ctl".into())
        .spawn(move || stop_after(control_sender, || script(stream, standard, event_sender)))
        .map_err(|_| ToolError::Thread("tg_ctl"))?;

    report(event_receiver);

    control_thread.join().map_err(|_| ToolError::Thread("tg_ctl"))??;
    pump_thread.join().map_err(|_| ToolError::Thread("tg_pump"))??;
    sink_thread.join().map_err(|_| ToolError::Thread("tg_sink"))??;
    Ok(())
}

/// Runs `body`, then stops the pump whether or not `body` succeeded.
fn stop_after<F>(pump: Sender<PumpMessage>, body: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let result = body();
    let _ = pump.send(PumpMessage::Stop);
    result
}

/// A short call: dial tone, dialing, ringback, busy.
fn script(stream: SharedStream, standard: Standard, events: Sender<MonitorEvent>) -> Result<()> {
    let step = |name: &str| {
        let _ = events.send(MonitorEvent::Step(name.to_string()));
    };

    step("idle");
    thread::sleep(Duration::from_millis(500));

    step("dial tone");
    let dial = stream.with(|s| indicator::start(s, standard, Indicator::Dial, 40))?;
    thread::sleep(Duration::from_millis(1000));
    stream.with(|s| dial.stop(s))?;

    step("dialing 5551234");
    let dialer = Dialer::default();
    stream.with(|s| dialer.queue(s, "5551234"))?;
    thread::sleep(Duration::from_millis(1200));

    step("ringback");
    let ringback = stream.with(|s| indicator::start(s, standard, Indicator::Ringback, 40))?;
    thread::sleep(Duration::from_millis(3000));
    stream.with(|s| ringback.stop(s))?;

    step("busy");
    let busy = stream.with(|s| indicator::start(s, standard, Indicator::Busy, 40))?;
    thread::sleep(Duration::from_millis(2000));
    stream.with(|s| busy.stop(s))?;

    let anchor = stream.anchor();
    stream.detach(anchor)?;
    Ok(())
}

/// Prints a line per step and per second of output.
fn report(receiver: Receiver<MonitorEvent>) {
    let mut peak = 0;
    let mut next_report = TICKS_PER_SECOND;

    while let Ok(event) = receiver.recv() {
        match event {
            MonitorEvent::Buffer { time, peak: buffer_peak, tones } => {
                peak = peak.max(buffer_peak);
                if time >= next_report {
                    eprintln!("{} tones={tones:3} peak={peak:5}", style(format!("{:8.3}s", time as f64 / 1e6)).fg(Color::Cyan));
                    peak = 0;
                    next_report += TICKS_PER_SECOND;
                }
            },
            MonitorEvent::Overrun { dropped } => {
                eprintln!("{}", style(format!("overrun: {dropped} samples dropped")).fg(Color::Red));
            },
            MonitorEvent::Step(name) => {
                eprintln!("{}", style(name).fg(Color::Green).bold());
            },
            MonitorEvent::Stopped { time } => {
                eprintln!("{}", style(format!("stopped at {:.3}s", time as f64 / 1e6)).fg(Color::Yellow));
            },
        }
    }
}
