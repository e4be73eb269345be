//! Dense real polynomials in the Laplace variable `s`.
//!
//! Coefficients are stored in ascending power order with trailing zeros
//! trimmed, so the zero polynomial has no coefficients at all.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use rustfft::num_complex::Complex;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Highest degree the expression engine and filter design will build.
    pub const MAX_DEGREE: usize = 128;

    pub fn new(mut coefficients: Vec<f64>) -> Self {
        while coefficients.last() == Some(&0.0) {
            coefficients.pop();
        }
        Self { coefficients }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// The polynomial `s`.
    pub fn s() -> Self {
        Self::new(vec![0.0, 1.0])
    }

    /// `s^power`.
    pub fn monomial(power: usize) -> Self {
        let mut coefficients = vec![0.0; power + 1];
        coefficients[power] = 1.0;
        Self::new(coefficients)
    }

    /// Expands `prod (s - r)` over the given roots.
    ///
    /// Complex roots must come in conjugate pairs; the imaginary residue of
    /// the expansion is discarded.
    pub fn from_roots(roots: &[Complex<f64>]) -> Self {
        let mut expanded = vec![Complex::new(1.0, 0.0)];
        for root in roots {
            let mut next = vec![Complex::new(0.0, 0.0); expanded.len() + 1];
            for (power, c) in expanded.iter().enumerate() {
                next[power + 1] += c;
                next[power] -= c * root;
            }
            expanded = next;
        }
        Self::new(expanded.into_iter().map(|c| c.re).collect())
    }

    /// Ascending-power coefficients.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn coefficient(&self, power: usize) -> f64 {
        self.coefficients.get(power).copied().unwrap_or(0.0)
    }

    /// `None` for the zero polynomial.
    pub fn degree(&self) -> Option<usize> {
        self.coefficients.len().checked_sub(1)
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// The value of a polynomial of degree 0 (or of the zero polynomial).
    pub fn as_constant(&self) -> Option<f64> {
        match self.coefficients.len() {
            0 => Some(0.0),
            1 => Some(self.coefficients[0]),
            _ => None,
        }
    }

    pub fn scale(&self, factor: f64) -> Polynomial {
        Polynomial::new(self.coefficients.iter().map(|c| c * factor).collect())
    }

    pub fn pow(&self, exponent: u32) -> Polynomial {
        (0..exponent).fold(Polynomial::constant(1.0), |acc, _| &acc * self)
    }

    /// Horner evaluation at a real point.
    pub fn evaluate(&self, s: f64) -> f64 {
        self.coefficients.iter().rev().fold(0.0, |acc, &c| acc * s + c)
    }

    pub fn evaluate_complex(&self, s: Complex<f64>) -> Complex<f64> {
        self.coefficients
            .iter()
            .rev()
            .fold(Complex::new(0.0, 0.0), |acc, &c| acc * s + c)
    }
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        let len = self.coefficients.len().max(rhs.coefficients.len());
        Polynomial::new(
            (0..len)
                .map(|p| self.coefficient(p) + rhs.coefficient(p))
                .collect(),
        )
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        self + &(-rhs)
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        if self.is_zero() || rhs.is_zero() {
            return Polynomial::zero();
        }
        let mut product = vec![0.0; self.coefficients.len() + rhs.coefficients.len() - 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            for (j, b) in rhs.coefficients.iter().enumerate() {
                product[i + j] += a * b;
            }
        }
        Polynomial::new(product)
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(-1.0)
    }
}

impl Add for Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: Polynomial) -> Polynomial {
        &self + &rhs
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: Polynomial) -> Polynomial {
        &self - &rhs
    }
}

impl Mul for Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: Polynomial) -> Polynomial {
        &self * &rhs
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        -&self
    }
}

/// Canonical form: descending powers, unit coefficients omitted on `s` terms,
/// e.g. `s^2+3*s+2` or `-s+0.5`.
impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut first = true;
        for (power, &c) in self.coefficients.iter().enumerate().rev() {
            if c == 0.0 {
                continue;
            }
            let magnitude = c.abs();
            if c < 0.0 {
                write!(f, "-")?;
            } else if !first {
                write!(f, "+")?;
            }
            first = false;

            match power {
                0 => write!(f, "{magnitude}")?,
                _ => {
                    if magnitude != 1.0 {
                        write!(f, "{magnitude}*")?;
                    }
                    if power == 1 {
                        write!(f, "s")?;
                    } else {
                        write!(f, "s^{power}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn product_of_linear_factors() {
        let p = &(&Polynomial::s() + &Polynomial::constant(1.0))
            * &(&Polynomial::s() + &Polynomial::constant(2.0));
        assert_eq!(p.coefficients(), &[2.0, 3.0, 1.0]);
        assert_eq!(p.to_string(), "s^2+3*s+2");
    }

    #[test]
    fn display_handles_signs_and_zero() {
        assert_eq!(Polynomial::new(vec![0.5, -1.0]).to_string(), "-s+0.5");
        assert_eq!(Polynomial::new(vec![0.0, 0.0]).to_string(), "0");
        assert_eq!(Polynomial::new(vec![-2.0, 0.0, 4.5]).to_string(), "4.5*s^2-2");
    }

    #[test]
    fn subtraction_cancels_to_zero() {
        let p = Polynomial::new(vec![1.0, 2.0, 3.0]);
        assert!((&p - &p).is_zero());
        assert_eq!((&p - &p).degree(), None);
    }

    #[test]
    fn roots_expand_to_real_polynomial() {
        // (s + 1 - 2j)(s + 1 + 2j) = s^2 + 2s + 5
        let p = Polynomial::from_roots(&[Complex::new(-1.0, 2.0), Complex::new(-1.0, -2.0)]);
        assert_relative_eq!(p.coefficient(0), 5.0, epsilon = 1e-12);
        assert_relative_eq!(p.coefficient(1), 2.0, epsilon = 1e-12);
        assert_relative_eq!(p.coefficient(2), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn evaluation_and_power() {
        let p = Polynomial::new(vec![1.0, 1.0]).pow(3);
        assert_eq!(p.coefficients(), &[1.0, 3.0, 3.0, 1.0]);
        assert_relative_eq!(p.evaluate(2.0), 27.0);
        let at_j = p.evaluate_complex(Complex::new(0.0, 1.0));
        assert_relative_eq!(at_j.re, -2.0, epsilon = 1e-12);
        assert_relative_eq!(at_j.im, 2.0, epsilon = 1e-12);
    }
}
