//! # Digital Filter Module
//!
//! A streaming IIR/FIR evaluator driven one sample at a time, plus the design
//! step that turns a continuous-time transfer function into its coefficients.
//!
//! The difference equation, with `a[0]` normalized to 1, is
//!
//! ```text
//! y[n] = b[0]*u[n] + b[1]*u[n-1] + ... - a[1]*y[n-1] - a[2]*y[n-2] - ...
//! ```
//!
//! The filter is the one stateful object in the crate. It is not shared:
//! each stream being filtered owns its own instance.

mod design;
mod history;

use rustfft::num_complex::Complex;

pub use design::{FilterParameters, FilterType, TransferFunction, bilinear_transform, filter_series};

use crate::error::{PlotError, Result};
use history::History;

/// Lifecycle of a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    /// Freshly constructed; history is all zeros.
    Uninitialized,
    /// History seeded by [`Filter::initialize`].
    Initialized,
    /// At least one sample has been applied.
    Running,
}

#[derive(Debug, Clone)]
pub struct Filter {
    b: Vec<f64>,
    a: Vec<f64>,
    // u[0] is the current input, so this holds b.len() samples.
    inputs: History,
    // Past outputs only: a.len() - 1 samples.
    outputs: History,
    output: f64,
    state: FilterState,
}

impl Filter {
    /// Builds a filter from discrete coefficients in ascending powers of `z^-1`.
    ///
    /// Both arrays are divided by `a[0]`.
    ///
    /// # Errors
    /// * `InvalidParameter` for an empty coefficient array
    /// * `DegenerateTransferFunction` when `a[0]` is zero or not finite
    pub fn from_coefficients(b: Vec<f64>, a: Vec<f64>) -> Result<Self> {
        if b.is_empty() || a.is_empty() {
            return Err(PlotError::InvalidParameter(
                "filter needs at least one numerator and one denominator coefficient".to_string(),
            ));
        }
        let a0 = a[0];
        let scale = a.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
        if !a0.is_finite() || a0.abs() <= f64::EPSILON * scale {
            return Err(PlotError::DegenerateTransferFunction(format!(
                "leading denominator coefficient is {a0}"
            )));
        }
        let b: Vec<f64> = b.into_iter().map(|c| c / a0).collect();
        let a: Vec<f64> = a.into_iter().map(|c| c / a0).collect();

        Ok(Self {
            inputs: History::new(b.len()),
            outputs: History::new(a.len() - 1),
            b,
            a,
            output: 0.0,
            state: FilterState::Uninitialized,
        })
    }

    /// Discretizes a continuous-time transfer function with the bilinear transform.
    pub fn new(sample_rate: f64, transfer_function: &TransferFunction) -> Result<Self> {
        let (b, a) = bilinear_transform(transfer_function, sample_rate)?;
        log::debug!("Filter {transfer_function} at {sample_rate} Hz: b = {b:?}, a = {a:?}");
        Self::from_coefficients(b, a)
    }

    /// Builds a filter from numerator and denominator polynomials in `s`,
    /// e.g. `"1"` and `"s/(2*3.14159)+1"`.
    pub fn from_strings(sample_rate: f64, numerator: &str, denominator: &str) -> Result<Self> {
        let transfer_function = TransferFunction::parse(numerator, denominator)?;
        Self::new(sample_rate, &transfer_function)
    }

    pub fn from_parameters(sample_rate: f64, parameters: &FilterParameters) -> Result<Self> {
        Self::new(sample_rate, &parameters.transfer_function()?)
    }

    /// Normalized numerator coefficients, ascending powers of `z^-1`.
    pub fn numerator(&self) -> &[f64] {
        &self.b
    }

    /// Normalized denominator coefficients; `denominator()[0] == 1`.
    pub fn denominator(&self) -> &[f64] {
        &self.a
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Output/input ratio for a constant input once transients have decayed.
    ///
    /// Infinite or NaN for filters with a pole at `z = 1` (integrators).
    pub fn steady_state_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Seeds the history as if `value` had been applied forever.
    ///
    /// Without a finite steady-state gain the output history starts at zero.
    pub fn initialize(&mut self, value: f64) {
        let gain = self.steady_state_gain();
        let initial_output = if gain.is_finite() { value * gain } else { 0.0 };
        self.inputs.fill(value);
        self.outputs.fill(initial_output);
        self.output = initial_output;
        self.state = FilterState::Initialized;
    }

    /// Feeds one new input sample and returns the new output.
    pub fn apply(&mut self, sample: f64) -> f64 {
        self.inputs.push(sample);

        let feedforward: f64 = self
            .b
            .iter()
            .enumerate()
            .map(|(k, b)| b * self.inputs.get(k))
            .sum();
        let feedback: f64 = self
            .a
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, a)| a * self.outputs.get(k - 1))
            .sum();
        let y = feedforward - feedback;

        self.outputs.push(y);
        self.output = y;
        self.state = FilterState::Running;
        y
    }

    /// The most recent output.
    pub fn output(&self) -> f64 {
        self.output
    }

    /// `H(e^{jθ})` at a normalized frequency `θ = 2π f / fs` in radians per sample.
    pub fn frequency_response(&self, theta: f64) -> Complex<f64> {
        let evaluate = |coefficients: &[f64]| {
            coefficients
                .iter()
                .enumerate()
                .map(|(k, &c)| Complex::from_polar(c, -(k as f64) * theta))
                .sum::<Complex<f64>>()
        };
        evaluate(&self.b) / evaluate(&self.a)
    }
}
