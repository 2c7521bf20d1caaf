//! Sample sources: WAV and raw file inputs, dispatched once at init as a
//! small tagged enum rather than a trait object (spec §9 "Polymorphism").

mod raw;
mod wav;

pub use raw::RawSource;
pub use wav::WavSource;

use crate::errors::Result;
use num_complex::Complex32;
use std::path::Path;

pub enum SampleSource {
    Wav(WavSource),
    Raw(RawSource),
}

impl SampleSource {
    pub fn open_wav(path: &Path) -> Result<Self> {
        Ok(Self::Wav(WavSource::open(path)?))
    }

    pub fn open_raw(path: &Path, samplerate: u32, bits_per_sample: u16) -> Result<Self> {
        Ok(Self::Raw(RawSource::open(path, samplerate, bits_per_sample)?))
    }

    pub fn samplerate(&self) -> u32 {
        match self {
            SampleSource::Wav(s) => s.samplerate(),
            SampleSource::Raw(s) => s.samplerate(),
        }
    }

    /// Total input units (frames) in the source.
    pub fn size(&self) -> u64 {
        match self {
            SampleSource::Wav(s) => s.size(),
            SampleSource::Raw(s) => s.size(),
        }
    }

    /// Input units consumed so far.
    pub fn done(&self) -> u64 {
        match self {
            SampleSource::Wav(s) => s.done(),
            SampleSource::Raw(s) => s.done(),
        }
    }

    /// Read up to `n` complex samples, appending to `out`. Returns the
    /// number of samples actually read; fewer than `n` (including zero)
    /// signals EOF, treated as a `ShortRead` by the caller (orderly
    /// shutdown, not an error).
    pub fn read(&mut self, n: usize, out: &mut Vec<Complex32>) -> Result<usize> {
        match self {
            SampleSource::Wav(s) => s.read(n, out),
            SampleSource::Raw(s) => s.read(n, out),
        }
    }
}
