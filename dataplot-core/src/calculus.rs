//! # Discrete Calculus Module
//!
//! Time-history transforms that keep the x axis and length of their input:
//! derivative, cumulative integral and running root-mean-square.

use crate::series::SampleSeries;

/// Discrete derivative `dy/dx` of a time history.
///
/// Every sample uses the backward difference to its predecessor; the first
/// sample, which has none, uses the forward difference instead. Inputs with
/// fewer than two samples produce zeros.
///
/// # Arguments
/// * `data` - Time history to differentiate
///
/// # Returns
/// * Series with the same x values as `data`
pub fn derivative(data: &SampleSeries) -> SampleSeries {
    let mut out = data.clone();
    let (x, y) = (data.x(), data.y());
    let n = data.len();
    if n < 2 {
        out.map_y_in_place(|_| 0.0);
        return out;
    }

    let slopes = out.y_mut();
    slopes[0] = (y[1] - y[0]) / (x[1] - x[0]);
    for i in 1..n {
        slopes[i] = (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
    }
    out
}

/// Cumulative trapezoidal integral, zero at the first sample.
pub fn integral(data: &SampleSeries) -> SampleSeries {
    let mut out = data.clone();
    let (x, y) = (data.x(), data.y());
    let area = out.y_mut();

    let mut running_sum = 0.0;
    for i in 0..area.len() {
        if i > 0 {
            running_sum += 0.5 * (y[i] + y[i - 1]) * (x[i] - x[i - 1]);
        }
        area[i] = running_sum;
    }
    out
}

/// Running RMS: sample `i` holds the RMS of samples `0..=i`.
pub fn root_mean_square(data: &SampleSeries) -> SampleSeries {
    let mut out = data.clone();
    let y = data.y();
    let rms = out.y_mut();

    let mut sum_of_squares = 0.0;
    for (i, &value) in y.iter().enumerate() {
        sum_of_squares += value * value;
        rms[i] = (sum_of_squares / (i + 1) as f64).sqrt();
    }
    out
}
