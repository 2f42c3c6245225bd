use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use clap::ArgEnum;
use thiserror::Error;
use tonegen_engine::Sample;

use crate::codec::ulaw;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Wav(#[from] hound::Error),
    #[error("WAV output needs a seekable file")]
    WavNotSeekable,
}

#[derive(ArgEnum, Copy, Clone, PartialEq, Eq, Debug)]
pub enum Format {
    /// Native-endian signed 16-bit mono.
    Raw,
    /// G.711 µ-law, one byte per sample.
    Ulaw,
    Wav,
}

pub enum Sink {
    Raw(Box<dyn Write + Send>),
    Ulaw(Box<dyn Write + Send>),
    Wav(hound::WavWriter<BufWriter<File>>),
}

impl Sink {
    /// Opens `path`, or stdout for "-".
    pub fn open(path: &Path, format: Format, sample_rate: u32) -> Result<Self, SinkError> {
        let stdout = path.as_os_str() == "-";

        if format == Format::Wav {
            if stdout {
                return Err(SinkError::WavNotSeekable);
            }
            let spec = hound::WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };
            return Ok(Sink::Wav(hound::WavWriter::create(path, spec)?));
        }

        let writer: Box<dyn Write + Send> = if stdout {
            Box::new(BufWriter::new(io::stdout()))
        } else {
            Box::new(BufWriter::new(File::create(path)?))
        };
        Self::from_writer(writer, format)
    }

    pub fn from_writer(writer: Box<dyn Write + Send>, format: Format) -> Result<Self, SinkError> {
        match format {
            Format::Raw => Ok(Sink::Raw(writer)),
            Format::Ulaw => Ok(Sink::Ulaw(writer)),
            Format::Wav => Err(SinkError::WavNotSeekable),
        }
    }

    pub fn write(&mut self, samples: &[Sample]) -> Result<(), SinkError> {
        match self {
            Sink::Raw(writer) => writer.write_all(bytemuck::cast_slice(samples))?,
            Sink::Ulaw(writer) => {
                let codes: Vec<u8> = samples.iter().map(|&s| ulaw::encode(s)).collect();
                writer.write_all(&codes)?;
            },
            Sink::Wav(writer) => {
                for &sample in samples {
                    writer.write_sample(sample)?;
                }
            },
        }
        Ok(())
    }

    pub fn finish(self) -> Result<(), SinkError> {
        match self {
            Sink::Raw(mut writer) | Sink::Ulaw(mut writer) => writer.flush()?,
            Sink::Wav(writer) => writer.finalize()?,
        }
        Ok(())
    }
}
