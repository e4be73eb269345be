//! # Sample Series Module
//!
//! This module provides the two-column data model every plotted curve is built
//! on: an x array (time or frequency) and a y array of the same length.
//!
//! ## Features
//! - Element-wise unary transforms (log, trig, powers, abs) applied to `y`
//! - Series/scalar arithmetic through the standard operator traits
//! - Series/series arithmetic on the common x positions of both operands
//! - Linear-interpolation lookup and in-place reversal
//!
//! ## Alignment
//! Two series only combine where their x values coincide. Both x arrays are
//! walked in ascending order; samples present in only one operand are dropped,
//! so the result may be shorter than either input (possibly empty).

use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

use crate::error::{PlotError, Result};

/// Relative tolerance used when matching x values of two series.
///
/// Values with magnitude below 1 are compared with the same absolute tolerance.
pub const ALIGNMENT_TOLERANCE: f64 = 1e-9;

/// Returns true when two x values refer to the same sample position.
#[inline]
pub fn x_matches(a: f64, b: f64) -> bool {
    (a - b).abs() <= ALIGNMENT_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Floored (wrap-around) modulo: `value - divisor * floor(value / divisor)`.
///
/// Unlike `%` on `f64`, the result takes the sign of the divisor.
#[inline]
pub fn floored_modulo(value: f64, divisor: f64) -> f64 {
    value - divisor * (value / divisor).floor()
}

/// A discrete set of `(x, y)` samples.
///
/// The two arrays always have the same length. Copies are deep; a series is
/// never shared mutably between owners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    x: Vec<f64>,
    y: Vec<f64>,
}

/// Result of [`SampleSeries::y_at`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YLookup {
    pub y: f64,
    /// True when `x` landed on an existing sample rather than between two.
    pub exact: bool,
}

impl SampleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zero-filled series with `len` samples.
    pub fn with_len(len: usize) -> Self {
        Self {
            x: vec![0.0; len],
            y: vec![0.0; len],
        }
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
        }
    }

    /// Builds a series from raw columns, e.g. as produced by a file importer.
    ///
    /// # Errors
    /// * `LengthMismatch` if the columns differ in length
    pub fn from_xy(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(PlotError::LengthMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        Ok(Self { x, y })
    }

    /// Samples `f` at every value in `x`.
    pub fn from_fn(x: Vec<f64>, f: impl Fn(f64) -> f64) -> Self {
        let y = x.iter().map(|&v| f(v)).collect();
        Self { x, y }
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    // Slices keep the length fixed.
    pub fn x_mut(&mut self) -> &mut [f64] {
        &mut self.x
    }

    pub fn y_mut(&mut self) -> &mut [f64] {
        &mut self.y
    }

    pub fn point(&self, index: usize) -> Option<(f64, f64)> {
        Some((*self.x.get(index)?, *self.y.get(index)?))
    }

    /// Overwrites sample `index`; returns false when it is out of range.
    pub fn set_point(&mut self, index: usize, x: f64, y: f64) -> bool {
        if index >= self.len() {
            return false;
        }
        self.x[index] = x;
        self.y[index] = y;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    pub fn x_min(&self) -> Option<f64> {
        self.x.iter().copied().reduce(f64::min)
    }

    pub fn x_max(&self) -> Option<f64> {
        self.x.iter().copied().reduce(f64::max)
    }

    pub fn y_min(&self) -> Option<f64> {
        self.y.iter().copied().reduce(f64::min)
    }

    pub fn y_max(&self) -> Option<f64> {
        self.y.iter().copied().reduce(f64::max)
    }

    pub fn mean_y(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.y.iter().sum::<f64>() / self.len() as f64)
    }

    /// Average spacing between consecutive x values, `None` below two samples.
    pub fn average_sample_spacing(&self) -> Option<f64> {
        let n = self.len();
        if n < 2 {
            return None;
        }
        Some((self.x[n - 1] - self.x[0]) / (n - 1) as f64)
    }

    /// Scales every x value, e.g. to convert display units before evaluation.
    pub fn multiply_x(&mut self, factor: f64) -> &mut Self {
        for x in self.x.iter_mut() {
            *x *= factor;
        }
        self
    }

    /// Reverses the sample order of both columns.
    pub fn reverse(&mut self) -> &mut Self {
        self.x.reverse();
        self.y.reverse();
        self
    }

    /// Looks up `y` at an arbitrary `x` by linear interpolation.
    ///
    /// # Returns
    /// * `Some(lookup)` - interpolated (or exact) value
    /// * `None` - `x` lies outside `[x[0], x[n-1]]` or the series is empty
    pub fn y_at(&self, x: f64) -> Option<YLookup> {
        let first = *self.x.first()?;
        let last = *self.x.last()?;
        if !(first..=last).contains(&x) {
            return None;
        }

        let idx = self.x.partition_point(|&v| v < x);
        if idx < self.len() && x_matches(self.x[idx], x) {
            return Some(YLookup { y: self.y[idx], exact: true });
        }
        if idx > 0 && x_matches(self.x[idx - 1], x) {
            return Some(YLookup { y: self.y[idx - 1], exact: true });
        }
        if idx == 0 || idx >= self.len() {
            return None;
        }

        let (x0, x1) = (self.x[idx - 1], self.x[idx]);
        let (y0, y1) = (self.y[idx - 1], self.y[idx]);
        let y = y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        Some(YLookup { y, exact: false })
    }

    pub fn map_y_in_place(&mut self, f: impl Fn(f64) -> f64) -> &mut Self {
        for y in self.y.iter_mut() {
            *y = f(*y);
        }
        self
    }

    /// Non-mutating form of [`SampleSeries::map_y_in_place`].
    pub fn map_y(&self, f: impl Fn(f64) -> f64) -> SampleSeries {
        let mut out = self.clone();
        out.map_y_in_place(f);
        out
    }

    pub fn abs(&mut self) -> &mut Self {
        self.map_y_in_place(f64::abs)
    }

    /// Natural logarithm. Non-positive samples become NaN or -inf.
    pub fn log(&mut self) -> &mut Self {
        self.map_y_in_place(f64::ln)
    }

    pub fn log10(&mut self) -> &mut Self {
        self.map_y_in_place(f64::log10)
    }

    pub fn exp(&mut self) -> &mut Self {
        self.map_y_in_place(f64::exp)
    }

    pub fn sqrt(&mut self) -> &mut Self {
        self.map_y_in_place(f64::sqrt)
    }

    pub fn sin(&mut self) -> &mut Self {
        self.map_y_in_place(f64::sin)
    }

    pub fn cos(&mut self) -> &mut Self {
        self.map_y_in_place(f64::cos)
    }

    pub fn tan(&mut self) -> &mut Self {
        self.map_y_in_place(f64::tan)
    }

    pub fn asin(&mut self) -> &mut Self {
        self.map_y_in_place(f64::asin)
    }

    pub fn acos(&mut self) -> &mut Self {
        self.map_y_in_place(f64::acos)
    }

    pub fn atan(&mut self) -> &mut Self {
        self.map_y_in_place(f64::atan)
    }

    pub fn powi(&mut self, exponent: i32) -> &mut Self {
        self.map_y_in_place(|v| v.powi(exponent))
    }

    pub fn powf(&mut self, exponent: f64) -> &mut Self {
        self.map_y_in_place(|v| v.powf(exponent))
    }

    /// Restricts both series to the x positions they have in common.
    ///
    /// Both inputs are expected in ascending x order. The returned pair has
    /// equal lengths and shares the x values of `self`.
    pub fn align(&self, other: &SampleSeries) -> (SampleSeries, SampleSeries) {
        let capacity = self.len().min(other.len());
        let mut left = SampleSeries::with_capacity(capacity);
        let mut right = SampleSeries::with_capacity(capacity);

        let (mut i, mut j) = (0, 0);
        while i < self.len() && j < other.len() {
            let (xa, xb) = (self.x[i], other.x[j]);
            if x_matches(xa, xb) {
                left.push(xa, self.y[i]);
                right.push(xa, other.y[j]);
                i += 1;
                j += 1;
            } else if xa < xb {
                i += 1;
            } else {
                j += 1;
            }
        }

        if left.len() < self.len().max(other.len()) {
            log::debug!(
                "Aligned series of {} and {} samples down to {} common samples",
                self.len(),
                other.len(),
                left.len()
            );
        }
        (left, right)
    }

    /// Combines the aligned samples of two series with `f(self_y, other_y)`.
    pub fn combine(&self, other: &SampleSeries, f: impl Fn(f64, f64) -> f64) -> SampleSeries {
        let (mut left, right) = self.align(other);
        for (l, r) in left.y.iter_mut().zip(right.y.iter()) {
            *l = f(*l, *r);
        }
        left
    }
}

macro_rules! series_binary_op {
    ($op_trait:ident, $method:ident, $f:expr) => {
        impl $op_trait<&SampleSeries> for &SampleSeries {
            type Output = SampleSeries;

            fn $method(self, rhs: &SampleSeries) -> SampleSeries {
                self.combine(rhs, $f)
            }
        }

        impl $op_trait<SampleSeries> for SampleSeries {
            type Output = SampleSeries;

            fn $method(self, rhs: SampleSeries) -> SampleSeries {
                self.combine(&rhs, $f)
            }
        }

        impl $op_trait<f64> for &SampleSeries {
            type Output = SampleSeries;

            fn $method(self, rhs: f64) -> SampleSeries {
                self.map_y(|v| ($f)(v, rhs))
            }
        }

        impl $op_trait<f64> for SampleSeries {
            type Output = SampleSeries;

            fn $method(mut self, rhs: f64) -> SampleSeries {
                self.map_y_in_place(|v| ($f)(v, rhs));
                self
            }
        }
    };
}

series_binary_op!(Add, add, |a: f64, b: f64| a + b);
series_binary_op!(Sub, sub, |a: f64, b: f64| a - b);
series_binary_op!(Mul, mul, |a: f64, b: f64| a * b);
series_binary_op!(Div, div, |a: f64, b: f64| a / b);
series_binary_op!(Rem, rem, floored_modulo);

impl Neg for SampleSeries {
    type Output = SampleSeries;

    fn neg(mut self) -> SampleSeries {
        self.map_y_in_place(|v| -v);
        self
    }
}

impl Neg for &SampleSeries {
    type Output = SampleSeries;

    fn neg(self) -> SampleSeries {
        self.map_y(|v| -v)
    }
}

/// A series together with the description it is listed under in the plot.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub description: String,
    pub series: SampleSeries,
}

impl NamedSeries {
    pub fn new(description: impl Into<String>, series: SampleSeries) -> Self {
        Self {
            description: description.into(),
            series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(x: &[f64], y: &[f64]) -> SampleSeries {
        SampleSeries::from_xy(x.to_vec(), y.to_vec()).unwrap()
    }

    #[test]
    fn from_xy_rejects_length_mismatch() {
        let err = SampleSeries::from_xy(vec![0.0, 1.0], vec![1.0]).unwrap_err();
        assert_eq!(err, PlotError::LengthMismatch { x_len: 2, y_len: 1 });
    }

    #[test]
    fn addition_keeps_only_common_x() {
        let a = series(&[0.0, 1.0, 2.0, 3.0], &[10.0, 11.0, 12.0, 13.0]);
        let b = series(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 3.0, 4.0]);
        let sum = &a + &b;
        assert_eq!(sum.x(), &[1.0, 2.0, 3.0]);
        assert_eq!(sum.y(), &[12.0, 14.0, 16.0]);
    }

    #[test]
    fn alignment_tolerates_rounding_in_x() {
        let a = series(&[0.1, 0.2, 0.30000000000000004], &[1.0, 2.0, 3.0]);
        let b = series(&[0.1, 0.2, 0.3], &[1.0, 1.0, 1.0]);
        assert_eq!((&a - &b).len(), 3);
    }

    #[test]
    fn disjoint_series_produce_empty_result() {
        let a = series(&[0.0, 1.0], &[1.0, 1.0]);
        let b = series(&[5.0, 6.0], &[1.0, 1.0]);
        assert!((&a * &b).is_empty());
    }

    #[test]
    fn scalar_ops_preserve_x() {
        let a = series(&[0.0, 0.5, 1.0], &[1.0, -2.0, 3.0]);
        let doubled = &a * 2.0;
        assert_eq!(doubled.x(), a.x());
        assert_eq!(doubled.y(), &[2.0, -4.0, 6.0]);
        let divided = a / 0.0;
        assert!(divided.y().iter().all(|v| v.is_infinite()));
    }

    #[test]
    fn modulo_wraps_negative_values() {
        assert_relative_eq!(floored_modulo(-1.0, 3.0), 2.0);
        assert_relative_eq!(floored_modulo(7.5, 2.0), 1.5);
        let a = series(&[0.0, 1.0], &[-1.0, 4.0]);
        assert_eq!((a % 3.0).y(), &[2.0, 1.0]);
    }

    #[test]
    fn y_at_interpolates_and_flags_exact_hits() {
        let a = series(&[0.0, 1.0, 2.0], &[0.0, 10.0, 30.0]);
        assert_eq!(a.y_at(1.0), Some(YLookup { y: 10.0, exact: true }));
        let mid = a.y_at(1.5).unwrap();
        assert!(!mid.exact);
        assert_relative_eq!(mid.y, 20.0);
        assert_eq!(a.y_at(-0.1), None);
        assert_eq!(a.y_at(2.1), None);
        assert_eq!(SampleSeries::new().y_at(0.0), None);
    }

    #[test]
    fn log_of_non_positive_is_not_an_error() {
        let mut a = series(&[0.0, 1.0, 2.0], &[-1.0, 0.0, 1.0]);
        a.log();
        assert!(a.y()[0].is_nan());
        assert_eq!(a.y()[1], f64::NEG_INFINITY);
        assert_eq!(a.y()[2], 0.0);
    }

    #[test]
    fn reverse_twice_restores_original() {
        let original = series(&[0.0, 1.0, 2.0], &[3.0, 4.0, 5.0]);
        let mut a = original.clone();
        a.reverse();
        assert_eq!(a.x(), &[2.0, 1.0, 0.0]);
        a.reverse();
        assert_eq!(a, original);
    }

    #[test]
    fn spacing_and_statistics() {
        let a = series(&[0.0, 0.5, 1.0, 1.5], &[2.0, 4.0, 6.0, 8.0]);
        assert_relative_eq!(a.average_sample_spacing().unwrap(), 0.5);
        assert_relative_eq!(a.mean_y().unwrap(), 5.0);
        assert_eq!(a.y_max(), Some(8.0));
        assert_eq!(SampleSeries::with_len(1).average_sample_spacing(), None);
    }

    #[test]
    fn set_point_stays_in_bounds() {
        let mut a = SampleSeries::with_len(2);
        assert!(a.set_point(1, 0.5, 7.0));
        assert!(!a.set_point(2, 1.0, 1.0));
        assert_eq!(a.point(1), Some((0.5, 7.0)));
        assert_eq!(a.point(2), None);
    }
}
