use super::postfix::Backend;
use super::token::{Function, Operator, Token};
use crate::calculus;
use crate::error::{PlotError, Result};
use crate::fft;
use crate::series::{NamedSeries, SampleSeries, floored_modulo};

/// Result of a numeric evaluation: a plain number or a whole series.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Series(SampleSeries),
}

impl Value {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Series(_) => None,
        }
    }

    pub fn as_series(&self) -> Option<&SampleSeries> {
        match self {
            Value::Series(s) => Some(s),
            Value::Scalar(_) => None,
        }
    }

    pub fn into_series(self) -> Option<SampleSeries> {
        match self {
            Value::Series(s) => Some(s),
            Value::Scalar(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(value)
    }
}

impl From<SampleSeries> for Value {
    fn from(series: SampleSeries) -> Self {
        Value::Series(series)
    }
}

fn apply_scalar(operator: Operator, a: f64, b: f64) -> f64 {
    match operator {
        Operator::Add => a + b,
        Operator::Subtract => a - b,
        Operator::Multiply => a * b,
        Operator::Divide => a / b,
        Operator::Modulo => floored_modulo(a, b),
        Operator::Power => a.powf(b),
        Operator::Negate => -b,
    }
}

/// Evaluates against the dataset list with every x scaled by `x_axis_factor`.
pub(crate) struct NumericBackend<'a> {
    pub(crate) datasets: &'a [NamedSeries],
    pub(crate) x_axis_factor: f64,
}

impl Backend for NumericBackend<'_> {
    type Value = Value;

    fn number(&self, value: f64) -> Value {
        Value::Scalar(value)
    }

    fn dataset(&self, index: usize, token: &Token) -> Result<Value> {
        let named = self
            .datasets
            .get(index)
            .ok_or_else(|| PlotError::UnknownDataset(token.text.clone()))?;
        let mut series = named.series.clone();
        series.multiply_x(self.x_axis_factor);
        Ok(Value::Series(series))
    }

    fn variable(&self, token: &Token) -> Result<Value> {
        Err(PlotError::UnknownDataset(token.text.clone()))
    }

    fn negate(&self, value: Value) -> Result<Value> {
        Ok(match value {
            Value::Scalar(v) => Value::Scalar(-v),
            Value::Series(s) => Value::Series(-s),
        })
    }

    fn binary(&self, operator: Operator, lhs: Value, rhs: Value) -> Result<Value> {
        let value = match (lhs, rhs) {
            (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(apply_scalar(operator, a, b)),
            (Value::Series(a), Value::Series(b)) => Value::Series(match operator {
                Operator::Add => a + b,
                Operator::Subtract => a - b,
                Operator::Multiply => a * b,
                Operator::Divide => a / b,
                Operator::Modulo => a % b,
                _ => a.combine(&b, |x, y| apply_scalar(operator, x, y)),
            }),
            (Value::Series(mut a), Value::Scalar(b)) => {
                a.map_y_in_place(|y| apply_scalar(operator, y, b));
                Value::Series(a)
            }
            (Value::Scalar(a), Value::Series(mut b)) => {
                b.map_y_in_place(|y| apply_scalar(operator, a, y));
                Value::Series(b)
            }
        };
        Ok(value)
    }

    fn function(&self, function: Function, token: &Token, argument: Value) -> Result<Value> {
        match argument {
            Value::Scalar(v) => function
                .apply_scalar(v)
                .map(Value::Scalar)
                .ok_or_else(|| PlotError::TypeMismatch {
                    function: token.text.clone(),
                    expected: "series",
                }),
            Value::Series(mut series) => {
                match function {
                    Function::Fft => return Ok(Value::Series(fft::compute_fft(&series)?)),
                    Function::Derivative => return Ok(Value::Series(calculus::derivative(&series))),
                    Function::Integral => return Ok(Value::Series(calculus::integral(&series))),
                    Function::Rms => return Ok(Value::Series(calculus::root_mean_square(&series))),
                    Function::Sin => series.sin(),
                    Function::Cos => series.cos(),
                    Function::Tan => series.tan(),
                    Function::Asin => series.asin(),
                    Function::Acos => series.acos(),
                    Function::Atan => series.atan(),
                    Function::Ln => series.log(),
                    Function::Log10 => series.log10(),
                    Function::Exp => series.exp(),
                    Function::Abs => series.abs(),
                    Function::Sqrt => series.sqrt(),
                };
                Ok(Value::Series(series))
            }
        }
    }
}
