//! Filter design: classical continuous-time prototypes and their
//! discretization.

use std::f64::consts::PI;
use std::fmt;

use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use super::Filter;
use crate::error::{PlotError, Result};
use crate::expression::ExpressionTree;
use crate::polynomial::Polynomial;
use crate::series::SampleSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    #[default]
    LowPass,
    HighPass,
    BandPass,
    BandStop,
    Notch,
    /// User-supplied numerator and denominator in `s`.
    Custom,
}

/// Filter settings as chosen in the filter dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParameters {
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub order: usize,
    /// Hz; the center frequency for band and notch filters.
    pub cutoff_frequency: f64,
    pub damping_ratio: f64,
    /// Hz; pass/stop band width for band and notch filters.
    pub width: f64,
    /// Run forward then backward to cancel the phase lag.
    pub phaseless: bool,
    pub butterworth: bool,
    pub numerator: String,
    pub denominator: String,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            filter_type: FilterType::LowPass,
            order: 1,
            cutoff_frequency: 1.0,
            damping_ratio: std::f64::consts::FRAC_1_SQRT_2,
            width: 0.0,
            phaseless: false,
            butterworth: false,
            numerator: String::new(),
            denominator: String::new(),
        }
    }
}

/// Rational transfer function `N(s) / D(s)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    pub numerator: Polynomial,
    pub denominator: Polynomial,
}

impl TransferFunction {
    /// Checks that the function is proper and has a non-zero denominator.
    pub fn new(numerator: Polynomial, denominator: Polynomial) -> Result<Self> {
        let Some(denominator_degree) = denominator.degree() else {
            return Err(PlotError::DegenerateTransferFunction(
                "denominator is zero".to_string(),
            ));
        };
        if numerator.degree().unwrap_or(0) > denominator_degree {
            return Err(PlotError::DegenerateTransferFunction(format!(
                "numerator order exceeds denominator order in ({numerator})/({denominator})"
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Parses numerator and denominator expressions in `s`.
    pub fn parse(numerator: &str, denominator: &str) -> Result<Self> {
        let tree = ExpressionTree::new(&[]);
        Self::new(
            tree.solve_polynomial(numerator)?,
            tree.solve_polynomial(denominator)?,
        )
    }

    /// Continuous-time response `H(jω)` at `omega` rad/s.
    pub fn frequency_response(&self, omega: f64) -> Complex<f64> {
        let s = Complex::new(0.0, omega);
        self.numerator.evaluate_complex(s) / self.denominator.evaluate_complex(s)
    }
}

impl fmt::Display for TransferFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})/({})", self.numerator, self.denominator)
    }
}

/// Denominator with unit leading coefficient and constant term `wc^order`.
fn low_pass_denominator(order: usize, omega: f64, damping_ratio: f64, butterworth: bool) -> Polynomial {
    if butterworth {
        let n = order as f64;
        let poles: Vec<Complex<f64>> = (1..=order)
            .map(|k| Complex::from_polar(omega, PI * (2.0 * k as f64 + n - 1.0) / (2.0 * n)))
            .collect();
        return Polynomial::from_roots(&poles);
    }

    let second_order = Polynomial::new(vec![omega * omega, 2.0 * damping_ratio * omega, 1.0]);
    let mut denominator = second_order.pow((order / 2) as u32);
    if order % 2 == 1 {
        denominator = &denominator * &Polynomial::new(vec![omega, 1.0]);
    }
    denominator
}

fn check_frequency(name: &str, frequency: f64) -> Result<f64> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return Err(PlotError::InvalidParameter(format!(
            "{name} must be positive, got {frequency} Hz"
        )));
    }
    Ok(2.0 * PI * frequency)
}

impl FilterParameters {
    fn check_shape(&self) -> Result<()> {
        if self.order == 0 {
            return Err(PlotError::InvalidParameter("filter order must be at least 1".to_string()));
        }
        // Band filters multiply two sections of this order
        if self.order > Polynomial::MAX_DEGREE / 2 {
            return Err(PlotError::InvalidParameter(format!(
                "filter order must be at most {}, got {}",
                Polynomial::MAX_DEGREE / 2,
                self.order
            )));
        }
        if !self.butterworth && !(self.damping_ratio.is_finite() && self.damping_ratio > 0.0) {
            return Err(PlotError::InvalidParameter(format!(
                "damping ratio must be positive, got {}",
                self.damping_ratio
            )));
        }
        Ok(())
    }

    fn low_pass(&self, frequency: f64) -> Result<TransferFunction> {
        let omega = check_frequency("cutoff frequency", frequency)?;
        let denominator = low_pass_denominator(self.order, omega, self.damping_ratio, self.butterworth);
        TransferFunction::new(Polynomial::constant(denominator.coefficient(0)), denominator)
    }

    fn high_pass(&self, frequency: f64) -> Result<TransferFunction> {
        let omega = check_frequency("cutoff frequency", frequency)?;
        let denominator = low_pass_denominator(self.order, omega, self.damping_ratio, self.butterworth);
        TransferFunction::new(Polynomial::monomial(self.order), denominator)
    }

    fn band_edges(&self) -> Result<(f64, f64)> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(PlotError::InvalidParameter(format!(
                "band width must be positive, got {} Hz",
                self.width
            )));
        }
        let low = self.cutoff_frequency - 0.5 * self.width;
        let high = self.cutoff_frequency + 0.5 * self.width;
        check_frequency("lower band edge", low)?;
        Ok((low, high))
    }

    /// Builds the continuous-time transfer function these settings describe.
    ///
    /// # Errors
    /// * `InvalidParameter` for a zero order, non-positive frequencies or widths
    /// * `DegenerateTransferFunction` for a zero or improper custom function
    /// * any expression error from parsing custom numerator/denominator text
    pub fn transfer_function(&self) -> Result<TransferFunction> {
        match self.filter_type {
            FilterType::LowPass => {
                self.check_shape()?;
                self.low_pass(self.cutoff_frequency)
            }
            FilterType::HighPass => {
                self.check_shape()?;
                self.high_pass(self.cutoff_frequency)
            }
            FilterType::BandPass => {
                self.check_shape()?;
                let (low, high) = self.band_edges()?;
                let hp = self.high_pass(low)?;
                let lp = self.low_pass(high)?;
                TransferFunction::new(
                    &hp.numerator * &lp.numerator,
                    &hp.denominator * &lp.denominator,
                )
            }
            FilterType::BandStop => {
                self.check_shape()?;
                let (low, high) = self.band_edges()?;
                let lp = self.low_pass(low)?;
                let hp = self.high_pass(high)?;
                TransferFunction::new(
                    &(&lp.numerator * &hp.denominator) + &(&hp.numerator * &lp.denominator),
                    &lp.denominator * &hp.denominator,
                )
            }
            FilterType::Notch => {
                let omega = check_frequency("notch frequency", self.cutoff_frequency)?;
                let bandwidth = check_frequency("notch width", self.width)?;
                TransferFunction::new(
                    Polynomial::new(vec![omega * omega, 0.0, 1.0]),
                    Polynomial::new(vec![omega * omega, bandwidth, 1.0]),
                )
            }
            FilterType::Custom => TransferFunction::parse(&self.numerator, &self.denominator),
        }
    }
}

/// Discretizes `H(s)` with the bilinear (Tustin) substitution
/// `s = 2 fs (z - 1) / (z + 1)`.
///
/// # Returns
/// * `(b, a)` in ascending powers of `z^-1`, not yet normalized
pub fn bilinear_transform(
    transfer_function: &TransferFunction,
    sample_rate: f64,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(PlotError::InvalidParameter(format!(
            "sample rate must be positive, got {sample_rate}"
        )));
    }
    let Some(order) = transfer_function.denominator.degree() else {
        return Err(PlotError::DegenerateTransferFunction(
            "denominator is zero".to_string(),
        ));
    };
    if transfer_function.numerator.degree().unwrap_or(0) > order {
        return Err(PlotError::DegenerateTransferFunction(format!(
            "{transfer_function} is not proper"
        )));
    }
    let k = 2.0 * sample_rate;
    let z_minus_one = Polynomial::new(vec![-1.0, 1.0]);
    let z_plus_one = Polynomial::new(vec![1.0, 1.0]);

    // Multiplying through by (z + 1)^order clears every fraction.
    let substitute = |p: &Polynomial| -> Vec<f64> {
        let mut in_z = Polynomial::zero();
        for (power, &c) in p.coefficients().iter().enumerate() {
            let term = &z_minus_one.pow(power as u32) * &z_plus_one.pow((order - power) as u32);
            in_z = &in_z + &term.scale(c * k.powi(power as i32));
        }
        // Coefficient of z^-j is the coefficient of z^(order - j).
        (0..=order).map(|j| in_z.coefficient(order - j)).collect()
    };

    Ok((
        substitute(&transfer_function.numerator),
        substitute(&transfer_function.denominator),
    ))
}

/// Filters a whole time history, as the plot does when a filter is applied to a curve.
///
/// The sample rate comes from the average x spacing. The filter starts in
/// steady state at the first sample; with `phaseless` set the result is
/// filtered a second time in reverse.
pub fn filter_series(parameters: &FilterParameters, data: &SampleSeries) -> Result<SampleSeries> {
    let dt = data.average_sample_spacing().ok_or_else(|| {
        PlotError::InsufficientData(format!(
            "filtering needs at least two samples, got {}",
            data.len()
        ))
    })?;
    if !(dt.is_finite() && dt > 0.0) {
        return Err(PlotError::InvalidParameter(format!(
            "sample spacing must be positive, got {dt}"
        )));
    }
    let sample_rate = 1.0 / dt;

    let run = |input: &SampleSeries| -> Result<SampleSeries> {
        let mut filter = Filter::from_parameters(sample_rate, parameters)?;
        filter.initialize(input.y()[0]);
        let mut output = input.clone();
        for y in output.y_mut() {
            *y = filter.apply(*y);
        }
        Ok(output)
    };

    let mut filtered = run(data)?;
    if parameters.phaseless {
        filtered.reverse();
        filtered = run(&filtered)?;
        filtered.reverse();
    }
    Ok(filtered)
}
