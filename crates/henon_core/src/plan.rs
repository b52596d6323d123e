//! Time-step planning.
//!
//! Turns a time interval `[t0, t_end]`, a step size `h` and a storage stride
//! into the number of micro-steps to take, the number of samples to keep and
//! the length of the final (possibly partial) step.

use crate::error::{HenonError, Result};
use serde::Serialize;

/// Remainders smaller than this are treated as "the interval is an exact
/// multiple of `h`". This is a numerical tunable, not a physical constant.
pub const DEFAULT_REMAINDER_TOLERANCE: f64 = 1e-10;

/// Largest accepted remainder tolerance. A snapped plan stops `|remainder|`
/// short of (or past) `t_end`, so the tolerance bounds the endpoint error.
pub const MAX_REMAINDER_TOLERANCE: f64 = 1e-10;

/// Iteration plan shared by every integrator.
///
/// * `n` counts micro-steps including the initial sample, so `n - 1` steps are
///   taken: `n - 2` of size `h` followed by one of size `last_step`.
/// * `m` counts stored samples. Sample 0 and sample `n - 1` are always kept;
///   interior micro-step indices are kept when divisible by `stride`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepPlan {
    pub t0: f64,
    pub t_end: f64,
    pub h: f64,
    pub n: usize,
    pub m: usize,
    pub stride: usize,
    pub last_step: f64,
}

impl StepPlan {
    pub fn new(t0: f64, t_end: f64, h: f64, stride: usize) -> Result<Self> {
        Self::with_tolerance(t0, t_end, h, stride, DEFAULT_REMAINDER_TOLERANCE)
    }

    pub fn with_tolerance(
        t0: f64,
        t_end: f64,
        h: f64,
        stride: usize,
        tolerance: f64,
    ) -> Result<Self> {
        if !t0.is_finite() || !t_end.is_finite() || !h.is_finite() {
            return Err(HenonError::InvalidStepPlan(format!(
                "t0, t_end and h must be finite (got t0 = {t0}, t_end = {t_end}, h = {h})."
            )));
        }
        if h <= 0.0 {
            return Err(HenonError::InvalidStepPlan(format!(
                "step size h must be positive (got {h})."
            )));
        }
        if t_end < t0 {
            return Err(HenonError::InvalidStepPlan(format!(
                "t_end ({t_end}) must not precede t0 ({t0})."
            )));
        }
        if stride == 0 {
            return Err(HenonError::InvalidStepPlan(
                "stride must be at least 1.".to_string(),
            ));
        }
        if !(tolerance > 0.0 && tolerance <= MAX_REMAINDER_TOLERANCE) {
            return Err(HenonError::InvalidStepPlan(format!(
                "remainder tolerance must lie in (0, {MAX_REMAINDER_TOLERANCE}] (got {tolerance})."
            )));
        }

        let span = t_end - t0;
        let ratio = span / h;
        if ratio >= (isize::MAX / 2) as f64 {
            return Err(HenonError::InvalidStepPlan(format!(
                "interval of length {span} needs too many steps of size {h}."
            )));
        }

        let remainder = ieee_remainder(span, h);
        let (n, last_step) = if remainder.abs() >= tolerance {
            // The nearest multiple of h may lie past t_end; the partial step
            // is then h shorter than the nearest one.
            let last_step = if remainder < 0.0 { remainder + h } else { remainder };
            let full_steps = ((span - last_step) / h).round() as usize;
            (full_steps + 2, last_step)
        } else {
            // Rounding instead of flooring keeps ratios like 2.9999999999999996 exact.
            let full_steps = ratio.round() as usize;
            (full_steps + 1, h)
        };

        let m = if n == 1 { 1 } else { 2 + (n - 2) / stride };

        Ok(Self {
            t0,
            t_end,
            h,
            n,
            m,
            stride,
            last_step,
        })
    }

    /// Number of integration steps actually taken (`n - 1`).
    pub fn micro_steps(&self) -> usize {
        self.n - 1
    }

    /// Index of the final micro-step sample.
    pub fn last_index(&self) -> usize {
        self.n - 1
    }

    /// Whether the sample produced at micro-step index `i` is kept.
    pub fn is_stored(&self, i: usize) -> bool {
        i == 0 || i == self.last_index() || i % self.stride == 0
    }

    /// Micro-step indices of the stored samples, in increasing order.
    pub fn stored_indices(&self) -> impl Iterator<Item = usize> {
        let last = self.last_index();
        let stride = self.stride;
        std::iter::once(0)
            .chain((stride..last).step_by(stride))
            .chain((last > 0).then_some(last))
    }

    /// Physical time of every stored sample. The final entry is exactly `t_end`.
    pub fn sample_times(&self) -> Vec<f64> {
        let last = self.last_index();
        self.stored_indices()
            .map(|i| {
                if i == last {
                    self.t_end
                } else {
                    self.t0 + i as f64 * self.h
                }
            })
            .collect()
    }
}

/// Convenience wrapper around [`StepPlan::new`].
pub fn plan(t0: f64, t_end: f64, h: f64, stride: usize) -> Result<StepPlan> {
    StepPlan::new(t0, t_end, h, stride)
}

/// Signed remainder of `x / y` relative to the nearest multiple of `y`
/// (ties to even), matching IEEE 754 `remainder`.
fn ieee_remainder(x: f64, y: f64) -> f64 {
    x - (x / y).round_ties_even() * y
}
