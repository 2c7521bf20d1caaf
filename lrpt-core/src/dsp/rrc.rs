//! Root-raised-cosine matched filter: kernel design and polyphase
//! zero-stuffing interpolation.

use num_complex::Complex32;
use std::collections::VecDeque;
use std::f64::consts::PI;

/// An immutable root-raised-cosine kernel.
///
/// Built once from (alpha, order, sample_rate, symbol_rate) and reused for
/// the lifetime of a run. Coefficients are peak-normalized so that passing
/// a unit-amplitude symbol stream through the matched filter yields
/// unit-amplitude symbol peaks (the invariant in spec §3).
#[derive(Clone, Debug)]
pub struct RrcKernel {
    taps: Vec<f32>,
}

impl RrcKernel {
    /// `sample_rate` here is the *interpolated* rate (source_rate * interp_factor).
    pub fn design(alpha: f64, order: usize, sample_rate: f64, symbol_rate: f64) -> Self {
        debug_assert!(order >= 4, "rrc_order must be >= 4");
        debug_assert!(alpha > 0.0 && alpha < 1.0);

        let len = order + 1;
        let ts = 1.0 / symbol_rate;
        let tsample = 1.0 / sample_rate;
        let center = (len - 1) as f64 / 2.0;

        let mut h = vec![0.0f64; len];
        for (i, slot) in h.iter_mut().enumerate() {
            let t = (i as f64 - center) * tsample;
            let t_norm = t / ts;

            *slot = if t_norm.abs() < 1e-9 {
                // t = 0
                1.0 - alpha + 4.0 * alpha / PI
            } else if (t_norm.abs() - 1.0 / (4.0 * alpha)).abs() < 1e-9 {
                // t = +/- T/(4 alpha): analytic limit
                let sqrt2 = std::f64::consts::SQRT_2;
                (alpha / sqrt2)
                    * ((1.0 + 2.0 / PI) * (PI / (4.0 * alpha)).sin()
                        + (1.0 - 2.0 / PI) * (PI / (4.0 * alpha)).cos())
            } else {
                let pit = PI * t_norm;
                let four_alpha_t = 4.0 * alpha * t_norm;
                let numerator = (pit * (1.0 - alpha)).sin() + four_alpha_t * (pit * (1.0 + alpha)).cos();
                let denominator = pit * (1.0 - four_alpha_t * four_alpha_t);
                numerator / denominator
            };
        }

        // Peak-normalize: unit gain at the matched-filter peak, not unit
        // energy. This is what keeps a unit-amplitude symbol stream at
        // unit amplitude after matched filtering (spec §3 invariant).
        let peak = h.iter().cloned().fold(0.0, f64::max).max(
            h.iter().cloned().fold(0.0, |acc, x| acc.max(-x)),
        );
        let scale = if peak.abs() > 1e-12 { 1.0 / peak } else { 1.0 };

        let taps = h.iter().map(|&x| (x * scale) as f32).collect();
        Self { taps }
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn taps(&self) -> &[f32] {
        &self.taps
    }
}

/// Upsamples by integer `interp_factor` (zero-stuffing) and matched-filters
/// with an [`RrcKernel`] via polyphase sub-filtering: for each output sample
/// at phase `p`, only the `p, p+L, p+2L, ...` taps of the kernel touch a
/// real (non-zero-stuffed) input sample, so the filter is evaluated as a
/// sparse polyphase sub-kernel rather than a dense convolution against
/// mostly-zero input.
pub struct InterpolatingFilter {
    kernel: RrcKernel,
    interp_factor: usize,
    history: VecDeque<Complex32>,
    /// Output samples still to discard as the initial filter transient.
    primed_remaining: usize,
}

impl InterpolatingFilter {
    pub fn new(kernel: RrcKernel, interp_factor: usize) -> Self {
        assert!(interp_factor >= 1);
        let history_len = kernel.len();
        let mut history = VecDeque::with_capacity(history_len);
        for _ in 0..history_len {
            history.push_back(Complex32::new(0.0, 0.0));
        }
        let primed_remaining = kernel.len();
        Self {
            kernel,
            interp_factor,
            history,
            primed_remaining,
        }
    }

    /// Feed one input sample, producing `interp_factor` output samples
    /// (oversampled, matched-filtered). The first `order+1` produced
    /// samples across the whole run are transient and discarded internally
    /// via `primed_remaining` bookkeeping done by the caller using
    /// [`InterpolatingFilter::skip_transient`].
    pub fn process(&mut self, input: Complex32, out: &mut Vec<Complex32>) {
        self.history.pop_front();
        self.history.push_back(input);

        for p in 0..self.interp_factor {
            out.push(self.convolve_phase(p));
        }
    }

    /// Number of remaining primed (transient) output samples to discard.
    pub fn primed_remaining(&self) -> usize {
        self.primed_remaining
    }

    pub fn consume_primed(&mut self, n: usize) -> usize {
        let take = n.min(self.primed_remaining);
        self.primed_remaining -= take;
        take
    }

    fn convolve_phase(&self, phase: usize) -> Complex32 {
        let taps = self.kernel.taps();
        let l = self.interp_factor;
        let history_len = self.history.len();

        let mut acc = Complex32::new(0.0, 0.0);
        let mut k = 0usize;
        loop {
            let tap_idx = phase + k * l;
            if tap_idx >= taps.len() {
                break;
            }
            // history is ordered oldest..newest; the newest sample
            // corresponds to tap index `taps.len()-1` in a causal FIR.
            let hist_idx = history_len as isize - 1 - k as isize;
            if hist_idx >= 0 {
                acc += self.history[hist_idx as usize] * taps[tap_idx];
            }
            k += 1;
        }
        acc
    }

    pub fn output_rate_factor(&self) -> usize {
        self.interp_factor
    }
}
