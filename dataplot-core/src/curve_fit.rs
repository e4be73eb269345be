//! # Curve Fit Module
//!
//! Least-squares polynomial fits of plotted curves.
//!
//! The normal equations `(XᵀX) c = Xᵀy` are built from the Vandermonde design
//! matrix of the x data and solved through an SVD pseudo-inverse, which keeps
//! rank-deficient designs (e.g. repeated x values) from blowing up.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};
use crate::series::SampleSeries;

/// The result of a polynomial fit. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialFit {
    pub order: usize,
    /// Coefficients in ascending power order, `order + 1` of them.
    pub coefficients: Vec<f64>,
    pub r_squared: f64,
}

impl PolynomialFit {
    /// Human-readable equation for plot legends, e.g. `y = 1 + 2*x - 0.5*x^2`.
    pub fn equation(&self) -> String {
        let mut text = String::from("y = ");
        for (power, &c) in self.coefficients.iter().enumerate() {
            if power == 0 {
                text.push_str(&format!("{c}"));
            } else {
                let sign = if c < 0.0 { '-' } else { '+' };
                text.push_str(&format!(" {sign} {}*x", c.abs()));
                if power > 1 {
                    text.push_str(&format!("^{power}"));
                }
            }
        }
        text
    }
}

/// Fits a polynomial of the given order to `data` by least squares.
///
/// # Arguments
/// * `data` - Samples to fit
/// * `order` - Highest power of x in the fit
///
/// # Returns
/// * `Ok(fit)` - coefficients ascending by power and the coefficient of determination
///
/// # Errors
/// * `IllPosedFit` when there are fewer samples than unknowns
/// * `SingularMatrix` if the normal equations overflow or contain NaN, or the
///   pseudo-inverse cannot be formed
pub fn do_polynomial_fit(data: &SampleSeries, order: usize) -> Result<PolynomialFit> {
    let n = data.len();
    let terms = order + 1;
    if terms > n {
        return Err(PlotError::IllPosedFit {
            order,
            required: terms,
            available: n,
        });
    }

    let x = data.x();
    let design = DMatrix::from_fn(n, terms, |i, j| x[i].powi(j as i32));
    let y = DVector::from_column_slice(data.y());
    let design_t = design.transpose();
    let normal = &design_t * &design;
    let rhs = &design_t * &y;
    if !(normal.iter().all(|v| v.is_finite()) && rhs.iter().all(|v| v.is_finite())) {
        return Err(PlotError::SingularMatrix(format!(
            "order {order} normal equations are not finite (NaN samples or x values too large)"
        )));
    }

    let svd = normal.svd(true, true);
    let eps = f64::EPSILON * terms as f64 * svd.singular_values.max();
    let rank = svd.rank(eps);
    if rank < terms {
        log::warn!("Order {order} fit over {n} samples is rank deficient (rank {rank})");
    }
    let inverse = svd
        .pseudo_inverse(eps)
        .map_err(|e| PlotError::SingularMatrix(e.to_string()))?;
    let coefficients: Vec<f64> = (inverse * rhs).iter().copied().collect();

    let mut fit = PolynomialFit {
        order,
        coefficients,
        r_squared: 0.0,
    };
    fit.r_squared = r_squared(data, &fit);
    log::debug!("Polynomial fit: {} (r^2 = {})", fit.equation(), fit.r_squared);
    Ok(fit)
}

fn r_squared(data: &SampleSeries, fit: &PolynomialFit) -> f64 {
    let mean = data.mean_y().unwrap_or(0.0);
    let (ss_res, ss_tot) = data.iter().fold((0.0, 0.0), |(res, tot), (x, y)| {
        let residual = y - evaluate_fit(x, fit);
        (res + residual * residual, tot + (y - mean) * (y - mean))
    });
    if ss_tot <= f64::MIN_POSITIVE {
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Evaluates the fitted polynomial at `x` (Horner's method).
pub fn evaluate_fit(x: f64, fit: &PolynomialFit) -> f64 {
    fit.coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// The fit evaluated at every x of `data`, for overlaying on the plot.
pub fn fit_series(data: &SampleSeries, fit: &PolynomialFit) -> SampleSeries {
    SampleSeries::from_fn(data.x().to_vec(), |x| evaluate_fit(x, fit))
}
