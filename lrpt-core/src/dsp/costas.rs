//! Costas loop carrier recovery: a second-order PLL that derotates symbols
//! and tracks residual carrier frequency/phase from hard phase-error
//! decisions, with no pilot tone.

use crate::config::Mode;
use num_complex::{Complex32, Complex64};
use std::f64::consts::{PI, TAU};

/// Exponential-average window (in symbols) for the lock detector. An order
/// of magnitude below the spec's ~10,000-symbol acquisition budget so the
/// average settles well inside that budget (spec §9 open question;
/// documented in DESIGN.md).
const LOCK_WINDOW: f64 = 200.0;
/// Below this averaged |phase error| (radians), declare lock.
const LOCK_THRESHOLD_LOW: f64 = 0.05;
/// Above this averaged |phase error| (radians), declare loss of lock.
const LOCK_THRESHOLD_HIGH: f64 = 0.3;
/// Minimum derotated-symbol magnitude below which there is no usable signal
/// to compute a phase error from. Without this gate, silence (or any input
/// that derotates to exactly zero) drives the hard-decision error to exactly
/// zero every symbol, which the windowed average would read as a perfect
/// lock rather than the absence of a signal (spec §8 "Zero-input: ...
/// `locked` stays false").
const MIN_LOCK_AMPLITUDE: f64 = 1e-3;

#[derive(Clone, Debug)]
pub struct CostasLoop {
    phase: f64,
    freq: f64,
    alpha_loop: f64,
    beta_loop: f64,
    lock_avg: f64,
    locked: bool,
}

impl CostasLoop {
    /// `bandwidth_hz` is the nominal QPSK loop bandwidth; OQPSK uses
    /// one-fifth of it at the same `symbol_rate` (spec §4.E).
    pub fn new(bandwidth_hz: f64, symbol_rate: f64, mode: Mode) -> Self {
        let bandwidth_hz = match mode {
            Mode::Qpsk => bandwidth_hz,
            Mode::Oqpsk => bandwidth_hz / 5.0,
        };
        let omega = TAU * bandwidth_hz / symbol_rate;
        let zeta = std::f64::consts::FRAC_1_SQRT_2;
        let denom = 1.0 + 2.0 * zeta * omega + omega * omega;
        let alpha_loop = (4.0 * zeta * omega) / denom;
        let beta_loop = (4.0 * omega * omega) / denom;

        Self {
            phase: 0.0,
            freq: 0.0,
            alpha_loop,
            beta_loop,
            lock_avg: LOCK_THRESHOLD_HIGH,
            locked: false,
        }
    }

    /// Derotate one symbol and update the loop. Returns the derotated
    /// symbol.
    pub fn process(&mut self, s: Complex32) -> Complex32 {
        let (sin_phi, cos_phi) = self.phase.sin_cos();
        let rot = Complex64::new(cos_phi, -sin_phi);
        let s64 = Complex64::new(s.re as f64, s.im as f64);
        let y = s64 * rot;

        let e = y.re.signum() * y.im - y.im.signum() * y.re;

        self.freq = (self.freq + self.beta_loop * e).clamp(-1.0, 1.0);
        self.phase = wrap(self.phase + self.freq + self.alpha_loop * e);

        if y.norm() < MIN_LOCK_AMPLITUDE {
            // No signal energy to derive a phase error from; a silent input
            // derotates to exactly zero, which would otherwise read as a
            // perfect (zero-error) lock rather than no signal at all.
            self.locked = false;
        } else {
            self.lock_avg += (e.abs() - self.lock_avg) / LOCK_WINDOW;
            if self.locked {
                if self.lock_avg > LOCK_THRESHOLD_HIGH {
                    self.locked = false;
                }
            } else if self.lock_avg < LOCK_THRESHOLD_LOW {
                self.locked = true;
            }
        }

        Complex32::new(y.re as f32, y.im as f32)
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Current NCO frequency, in radians/sample.
    pub fn freq_rad_per_sample(&self) -> f64 {
        self.freq
    }

    /// Current NCO frequency, in Hz, given the symbol rate the loop was
    /// initialized against.
    pub fn freq_hz(&self, symbol_rate: f64) -> f64 {
        self.freq * symbol_rate / TAU
    }
}

fn wrap(mut x: f64) -> f64 {
    while x >= PI {
        x -= TAU;
    }
    while x < -PI {
        x += TAU;
    }
    x
}
