//! Automatic gain control: exponential magnitude tracking toward a target.

use num_complex::Complex32;

/// Tracks a running estimate of input magnitude and rescales samples toward
/// a configured target amplitude.
#[derive(Clone, Debug)]
pub struct Agc {
    target: f32,
    window: f32,
    magnitude_estimate: f32,
    seeded: bool,
}

impl Agc {
    pub fn new(target: f32, window: usize) -> Self {
        Self {
            target,
            window: window.max(1) as f32,
            magnitude_estimate: 0.0,
            seeded: false,
        }
    }

    /// Apply AGC to one sample, updating the internal magnitude estimate
    /// per `mu <- mu + (|x| - mu) / W` and returning `x * target/mu`.
    pub fn apply(&mut self, x: Complex32) -> Complex32 {
        let mag = x.norm();

        if !self.seeded {
            self.magnitude_estimate = mag;
            self.seeded = true;
        } else {
            self.magnitude_estimate += (mag - self.magnitude_estimate) / self.window;
        }

        if self.magnitude_estimate == 0.0 {
            return Complex32::new(0.0, 0.0);
        }

        let gain = self.target / self.magnitude_estimate;
        x * gain
    }

    /// Current linear gain, useful for the driver's `gain()` observer.
    pub fn gain(&self) -> f32 {
        if self.magnitude_estimate == 0.0 {
            0.0
        } else {
            self.target / self.magnitude_estimate
        }
    }
}
