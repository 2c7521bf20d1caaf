//! Demodulator configuration: validated parameters plus the derived
//! quantities (sample period, resync period, RRC coefficients) that the
//! DSP stages are built from.

use crate::dsp::RrcKernel;
use crate::errors::{DemodError, Result};

/// Modulation scheme. OQPSK delays the Q branch by one half symbol, which
/// changes the timing-error computation (§4.D) and halves (here: reduces to
/// one fifth of) the nominal Costas bandwidth (§4.E).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Qpsk,
    Oqpsk,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "qpsk" => Some(Mode::Qpsk),
            "oqpsk" => Some(Mode::Oqpsk),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Qpsk => write!(f, "qpsk"),
            Mode::Oqpsk => write!(f, "oqpsk"),
        }
    }
}

/// Validated, immutable demodulator configuration. Built once at
/// `Demodulator::init` and handed to every stage constructor; all stage
/// state created from it is destroyed at `join()` (spec §3 lifecycles).
#[derive(Clone, Debug)]
pub struct DemodConfig {
    pub symbol_rate: f64,
    pub interp_factor: usize,
    pub rrc_order: usize,
    pub rrc_alpha: f64,
    pub costas_bw_hz: f64,
    pub mode: Mode,
    pub agc_target: f32,
    pub agc_window: usize,
}

impl Default for DemodConfig {
    fn default() -> Self {
        Self {
            symbol_rate: 72_000.0,
            interp_factor: 4,
            rrc_order: 64,
            rrc_alpha: 0.6,
            costas_bw_hz: 100.0,
            mode: Mode::Qpsk,
            agc_target: 180.0,
            agc_window: 1024 * 8,
        }
    }
}

impl DemodConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.symbol_rate > 0.0) {
            return Err(DemodError::ConfigInvalid {
                field: "symbol_rate",
                value: self.symbol_rate.to_string(),
            });
        }
        if self.interp_factor < 1 {
            return Err(DemodError::ConfigInvalid {
                field: "interp_factor",
                value: self.interp_factor.to_string(),
            });
        }
        if !(self.rrc_alpha > 0.0 && self.rrc_alpha < 1.0) {
            return Err(DemodError::ConfigInvalid {
                field: "rrc_alpha",
                value: self.rrc_alpha.to_string(),
            });
        }
        if self.rrc_order < 4 {
            return Err(DemodError::ConfigInvalid {
                field: "rrc_order",
                value: self.rrc_order.to_string(),
            });
        }
        if !(self.costas_bw_hz > 0.0) {
            return Err(DemodError::ConfigInvalid {
                field: "costas_bw_hz",
                value: self.costas_bw_hz.to_string(),
            });
        }
        if !(self.costas_bw_hz / self.symbol_rate < 0.5) {
            return Err(DemodError::ConfigInvalid {
                field: "costas_bw_hz/symbol_rate",
                value: (self.costas_bw_hz / self.symbol_rate).to_string(),
            });
        }
        Ok(())
    }

    /// The oversampled (post-interpolation) sample rate.
    pub fn interp_rate(&self, source_samplerate: f64) -> f64 {
        source_samplerate * self.interp_factor as f64
    }

    /// Samples per symbol at the interpolated rate. Need not be integer
    /// (spec §4.D: "invariant to sample-rate scaling").
    pub fn resync_period(&self, source_samplerate: f64) -> f64 {
        self.interp_rate(source_samplerate) / self.symbol_rate
    }

    pub fn rrc_kernel(&self, source_samplerate: f64) -> RrcKernel {
        RrcKernel::design(
            self.rrc_alpha,
            self.rrc_order,
            self.interp_rate(source_samplerate),
            self.symbol_rate,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(DemodConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_symbol_rate() {
        let mut cfg = DemodConfig::default();
        cfg.symbol_rate = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_interp_factor_zero() {
        let mut cfg = DemodConfig::default();
        cfg.interp_factor = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_alpha_out_of_range() {
        let mut cfg = DemodConfig::default();
        cfg.rrc_alpha = 1.0;
        assert!(cfg.validate().is_err());
        cfg.rrc_alpha = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_rrc_order_below_minimum() {
        let mut cfg = DemodConfig::default();
        cfg.rrc_order = 3;
        assert!(cfg.validate().is_err());
        cfg.rrc_order = 4;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_bandwidth_too_wide_relative_to_symbol_rate() {
        let mut cfg = DemodConfig::default();
        cfg.costas_bw_hz = cfg.symbol_rate; // ratio 1.0, not < 0.5
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn resync_period_need_not_be_integer() {
        let cfg = DemodConfig {
            interp_factor: 3,
            symbol_rate: 72_000.0,
            ..DemodConfig::default()
        };
        let period = cfg.resync_period(140_000.0);
        assert!((period - (140_000.0 * 3.0 / 72_000.0)).abs() < 1e-9);
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!(Mode::parse("QPSK"), Some(Mode::Qpsk));
        assert_eq!(Mode::parse("oqpsk"), Some(Mode::Oqpsk));
        assert_eq!(Mode::parse("bogus"), None);
    }
}
