// dataplot-core/src/lib.rs

//! The computational core of the data plotting tool.
//! This crate holds the sample series model, the expression engine used to
//! combine plotted curves, and the signal processing behind the FFT, FRF,
//! filter and curve fit features. It is completely headless
//! and contains no GUI, rendering or file import code.

pub mod calculus;
pub mod complex_series;
pub mod curve_fit;
pub mod error;
pub mod expression;
pub mod fft;
pub mod filter;
pub mod polynomial;
pub mod series;

pub use complex_series::ComplexSeries;
pub use curve_fit::{PolynomialFit, do_polynomial_fit, evaluate_fit};
pub use error::{PlotError, Result};
pub use expression::{ExpressionTree, Value};
pub use fft::{FftOptions, FrequencyResponse, WindowType};
pub use filter::{Filter, FilterParameters, FilterState, FilterType, TransferFunction};
pub use polynomial::Polynomial;
pub use series::{NamedSeries, SampleSeries};
