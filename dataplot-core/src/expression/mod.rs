//! # Expression Module
//!
//! Parses infix expressions typed into the plot window and evaluates them
//! against the datasets currently loaded.
//!
//! ```text
//! [1] * 2 + sin([Wheel Speed])
//! ddt(speed) / 9.81
//! (s + 2) * (s + 5)          polynomial (string) mode
//! ```
//!
//! Datasets are referenced by 1-based index (`[1]`), by description in
//! brackets, or by a bare description that is not a function name. Every
//! `solve` call is independent; the tree only borrows the dataset list.

mod numeric;
mod postfix;
mod symbolic;
mod token;

pub use numeric::Value;

use crate::error::Result;
use crate::polynomial::Polynomial;
use crate::series::NamedSeries;
use numeric::NumericBackend;
use postfix::{Backend, evaluate, to_postfix};
use symbolic::SymbolicBackend;
use token::{Mode, tokenize};

#[derive(Debug, Clone, Copy)]
pub struct ExpressionTree<'a> {
    datasets: &'a [NamedSeries],
}

impl<'a> ExpressionTree<'a> {
    pub fn new(datasets: &'a [NamedSeries]) -> Self {
        Self { datasets }
    }

    pub fn datasets(&self) -> &'a [NamedSeries] {
        self.datasets
    }

    /// Evaluates `expression` to a scalar or a series.
    ///
    /// Every referenced dataset has its x values multiplied by
    /// `x_axis_factor` first, and a series result keeps the scaled x.
    /// Evaluation stops at the first error; nothing partial is returned.
    ///
    /// # Errors
    /// Any parse error (unbalanced parentheses, unknown token, function or
    /// dataset, missing operator or operand), or a `TypeMismatch` when a
    /// series-only function receives a scalar.
    pub fn solve(&self, expression: &str, x_axis_factor: f64) -> Result<Value> {
        let backend = NumericBackend {
            datasets: self.datasets,
            x_axis_factor,
        };
        let value = self.run(expression, Mode::Numeric, &backend)?;
        match &value {
            Value::Scalar(v) => log::debug!("Solved '{expression}' = {v}"),
            Value::Series(s) => log::debug!("Solved '{expression}' to a series of {} samples", s.len()),
        }
        Ok(value)
    }

    /// Reads `expression` as a polynomial in `s`, e.g. a filter numerator.
    pub fn solve_polynomial(&self, expression: &str) -> Result<Polynomial> {
        self.run(expression, Mode::Symbolic, &SymbolicBackend)
    }

    /// Canonical rendering of a polynomial expression, e.g. `"(s+1)*(s+2)"`
    /// becomes `"s^2+3*s+2"`.
    pub fn solve_symbolic(&self, expression: &str) -> Result<String> {
        let polynomial = self.solve_polynomial(expression)?;
        log::debug!("Simplified '{expression}' to '{polynomial}'");
        Ok(polynomial.to_string())
    }

    fn run<B: Backend>(&self, expression: &str, mode: Mode, backend: &B) -> Result<B::Value> {
        let compiled = tokenize(expression, self.datasets, mode).and_then(to_postfix);
        compiled
            .and_then(|postfix| evaluate(backend, &postfix))
            .inspect_err(|e| log::debug!("Rejected expression '{expression}': {e}"))
    }
}
