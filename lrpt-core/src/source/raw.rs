//! Raw interleaved I/Q sample source: signed PCM with a caller-supplied
//! samplerate and bit depth.

use crate::errors::{DemodError, Result};
use num_complex::Complex32;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub struct RawSource {
    reader: BufReader<File>,
    samplerate: u32,
    bits_per_sample: u16,
    bytes_per_frame: u64,
    total_frames: u64,
    frames_done: u64,
}

impl RawSource {
    pub fn open(path: &Path, samplerate: u32, bits_per_sample: u16) -> Result<Self> {
        if bits_per_sample != 8 && bits_per_sample != 16 {
            return Err(DemodError::Unsupported { bits: bits_per_sample });
        }

        let file = File::open(path).map_err(|e| DemodError::InputOpen {
            path: path.to_path_buf(),
            source: e,
        })?;
        let len = file
            .metadata()
            .map_err(|e| DemodError::InputOpen {
                path: path.to_path_buf(),
                source: e,
            })?
            .len();

        let bytes_per_sample = (bits_per_sample / 8) as u64;
        let bytes_per_frame = bytes_per_sample * 2; // interleaved I, Q
        let total_frames = len / bytes_per_frame.max(1);

        Ok(Self {
            reader: BufReader::new(file),
            samplerate,
            bits_per_sample,
            bytes_per_frame,
            total_frames,
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
        let mut buf = vec![0u8; self.bytes_per_frame as usize];

        for _ in 0..n {
            match self.reader.read_exact(&mut buf) {
                Ok(()) => {
                    let (re, im) = self.decode_frame(&buf);
                    out.push(Complex32::new(re, im));
                    produced += 1;
                    self.frames_done += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => {
                    return Err(DemodError::InputFormat {
                        format: "raw",
                        reason: e.to_string(),
                    })
                }
            }
        }
        Ok(produced)
    }

    fn decode_frame(&self, buf: &[u8]) -> (f32, f32) {
        if self.bits_per_sample == 8 {
            (buf[0] as i8 as f32, buf[1] as i8 as f32)
        } else {
            let re = i16::from_le_bytes([buf[0], buf[1]]);
            let im = i16::from_le_bytes([buf[2], buf[3]]);
            (re as f32, im as f32)
        }
    }
}
