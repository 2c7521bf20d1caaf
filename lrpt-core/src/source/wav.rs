//! WAV-formatted sample source: RIFF/WAVE, PCM only, mono or stereo, 8 or
//! 16 bits per sample.

use crate::errors::{DemodError, Result};
use num_complex::Complex32;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub struct WavSource {
    reader: hound::WavReader<BufReader<File>>,
    channels: u16,
    bits_per_sample: u16,
    samplerate: u32,
    total_frames: u64,
    frames_done: u64,
}

impl WavSource {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = hound::WavReader::open(path).map_err(|e| DemodError::InputFormat {
            format: "wav",
            reason: e.to_string(),
        })?;

        let spec = reader.spec();
        if spec.bits_per_sample != 8 && spec.bits_per_sample != 16 {
            return Err(DemodError::Unsupported {
                bits: spec.bits_per_sample,
            });
        }
        if spec.channels != 1 && spec.channels != 2 {
            return Err(DemodError::InputFormat {
                format: "wav",
                reason: format!("unsupported channel count: {}", spec.channels),
            });
        }

        let total_samples = reader.duration() as u64;

        Ok(Self {
            reader,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            samplerate: spec.sample_rate,
            total_frames: total_samples,
            frames_done: 0,
        })
    }

    pub fn samplerate(&self) -> u32 {
        self.samplerate
    }

    pub fn size(&self) -> u64 {
        self.total_frames
    }

    pub fn done(&self) -> u64 {
        self.frames_done
    }

    pub fn read(&mut self, n: usize, out: &mut Vec<Complex32>) -> Result<usize> {
        let mut produced = 0;
        for _ in 0..n {
            let frame = match self.channels {
                1 => self.read_mono_frame()?,
                _ => self.read_stereo_frame()?,
            };
            match frame {
                Some(sample) => {
                    out.push(sample);
                    produced += 1;
                    self.frames_done += 1;
                }
                None => break,
            }
        }
        Ok(produced)
    }

    fn next_raw(&mut self) -> Result<Option<f32>> {
        let value = if self.bits_per_sample == 8 {
            self.reader.samples::<i8>().next()
        } else {
            self.reader.samples::<i16>().next()
        };
        match value {
            None => Ok(None),
            Some(Ok(v)) => Ok(Some(v as f32)),
            Some(Err(e)) => Err(DemodError::InputFormat {
                format: "wav",
                reason: e.to_string(),
            }),
        }
    }

    fn read_mono_frame(&mut self) -> Result<Option<Complex32>> {
        match self.next_raw()? {
            Some(re) => Ok(Some(Complex32::new(re, 0.0))),
            None => Ok(None),
        }
    }

    fn read_stereo_frame(&mut self) -> Result<Option<Complex32>> {
        match self.next_raw()? {
            Some(re) => match self.next_raw()? {
                Some(im) => Ok(Some(Complex32::new(re, im))),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }
}
