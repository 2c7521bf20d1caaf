//! Early-late symbol timing recovery.

use crate::config::Mode;
use num_complex::Complex32;
use std::collections::VecDeque;

/// Fixed loop scalings for the timing-error feedback. These have no
/// analytic derivation in the reference implementation; they are preserved
/// verbatim rather than replaced with a "cleaner" derived constant (spec §9
/// open question).
const K_ERR: f64 = 10_000.0;
const K_GAIN: f64 = 100.0;

/// Early-late gated symbol timing recovery.
///
/// Reads an oversampled, AGC-normalized stream one sample at a time and
/// emits the on-symbol sample whenever `resync_offset` crosses
/// `resync_period`.
#[derive(Clone, Debug)]
pub struct TimingRecovery {
    mode: Mode,
    resync_period: f64,
    resync_offset: f64,

    late: Complex32,
    current: Complex32,
    early: Complex32,

    // OQPSK-only: a second early/current/late triple sampled a half symbol
    // later than the primary triple, used to compute the Q-branch timing
    // error at the OQPSK half-symbol offset (spec §3, §4.D).
    half_delay: VecDeque<Complex32>,
    late_q: Complex32,
    current_q: Complex32,
    early_q: Complex32,
}

impl TimingRecovery {
    pub fn new(resync_period: f64, mode: Mode) -> Self {
        let half_delay_len = ((resync_period / 2.0).round() as usize).max(1);
        Self {
            mode,
            resync_period,
            resync_offset: 0.0,
            late: Complex32::new(0.0, 0.0),
            current: Complex32::new(0.0, 0.0),
            early: Complex32::new(0.0, 0.0),
            half_delay: VecDeque::from(vec![Complex32::new(0.0, 0.0); half_delay_len]),
            late_q: Complex32::new(0.0, 0.0),
            current_q: Complex32::new(0.0, 0.0),
            early_q: Complex32::new(0.0, 0.0),
        }
    }

    /// Feed one oversampled input sample. Returns `Some(symbol)` whenever
    /// the sliding window lands on a symbol boundary.
    pub fn process(&mut self, sample: Complex32) -> Option<Complex32> {
        self.late = self.current;
        self.current = self.early;
        self.early = sample;

        self.half_delay.push_back(sample);
        let delayed = self.half_delay.pop_front().unwrap_or(sample);
        self.late_q = self.current_q;
        self.current_q = self.early_q;
        self.early_q = delayed;

        self.resync_offset += 1.0;
        if self.resync_offset < self.resync_period {
            return None;
        }
        self.resync_offset -= self.resync_period;

        let error = match self.mode {
            Mode::Qpsk => {
                ((self.late.im - self.early.im) * self.current.im) as f64
            }
            Mode::Oqpsk => {
                let e_i = ((self.late.re - self.early.re) * self.current.re) as f64;
                let e_q = ((self.late_q.im - self.early_q.im) * self.current_q.im) as f64;
                (e_i + e_q) / 2.0
            }
        };

        self.resync_offset += (error / K_ERR) * self.resync_period / K_GAIN;

        Some(self.current)
    }
}
