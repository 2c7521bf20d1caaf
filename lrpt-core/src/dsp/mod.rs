//! DSP stages: RRC interpolation/matched filtering, AGC, symbol timing
//! recovery, and Costas carrier recovery.

pub mod agc;
pub mod costas;
pub mod rrc;
pub mod timing;

pub use agc::Agc;
pub use costas::CostasLoop;
pub use rrc::{InterpolatingFilter, RrcKernel};
pub use timing::TimingRecovery;
