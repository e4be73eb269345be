use super::postfix::Backend;
use super::token::{Function, Operator, Token};
use crate::error::{PlotError, Result};
use crate::polynomial::Polynomial;

/// Collects coefficients of `s` by power instead of computing numbers.
pub(crate) struct SymbolicBackend;

fn constant_of(p: &Polynomial, what: impl FnOnce() -> String) -> Result<f64> {
    p.as_constant().ok_or_else(|| PlotError::NotPolynomial(what()))
}

fn bounded(p: Polynomial) -> Result<Polynomial> {
    match p.degree() {
        Some(degree) if degree > Polynomial::MAX_DEGREE => Err(PlotError::NotPolynomial(format!(
            "degree {degree} exceeds the maximum of {}",
            Polynomial::MAX_DEGREE
        ))),
        _ => Ok(p),
    }
}

impl Backend for SymbolicBackend {
    type Value = Polynomial;

    fn number(&self, value: f64) -> Polynomial {
        Polynomial::constant(value)
    }

    fn dataset(&self, _index: usize, token: &Token) -> Result<Polynomial> {
        Err(PlotError::NotPolynomial(format!(
            "dataset reference '{}'",
            token.text
        )))
    }

    fn variable(&self, _token: &Token) -> Result<Polynomial> {
        Ok(Polynomial::s())
    }

    fn negate(&self, value: Polynomial) -> Result<Polynomial> {
        Ok(-value)
    }

    fn binary(&self, operator: Operator, lhs: Polynomial, rhs: Polynomial) -> Result<Polynomial> {
        match operator {
            Operator::Add => Ok(lhs + rhs),
            Operator::Subtract => Ok(lhs - rhs),
            Operator::Multiply => bounded(lhs * rhs),
            Operator::Divide => {
                let divisor = constant_of(&rhs, || format!("division by ({rhs})"))?;
                if divisor == 0.0 || !divisor.is_finite() {
                    return Err(PlotError::NotPolynomial(format!("({lhs})/{divisor}")));
                }
                Ok(lhs.scale(1.0 / divisor))
            }
            Operator::Modulo => Err(PlotError::NotPolynomial(format!("({lhs})%({rhs})"))),
            Operator::Power => {
                let exponent = constant_of(&rhs, || format!("power of ({rhs})"))?;
                if let Some(base) = lhs.as_constant() {
                    return Ok(Polynomial::constant(base.powf(exponent)));
                }
                if exponent < 0.0 || exponent.fract() != 0.0 {
                    return Err(PlotError::NotPolynomial(format!("({lhs})^{exponent}")));
                }
                let degree = lhs.degree().unwrap_or(0) as f64;
                if degree * exponent > Polynomial::MAX_DEGREE as f64 {
                    return Err(PlotError::NotPolynomial(format!(
                        "({lhs})^{exponent} exceeds degree {}",
                        Polynomial::MAX_DEGREE
                    )));
                }
                Ok(lhs.pow(exponent as u32))
            }
            Operator::Negate => Ok(-rhs),
        }
    }

    fn function(&self, function: Function, token: &Token, argument: Polynomial) -> Result<Polynomial> {
        let value = constant_of(&argument, || format!("{}({argument})", token.text))?;
        function
            .apply_scalar(value)
            .map(Polynomial::constant)
            .ok_or_else(|| PlotError::NotPolynomial(format!("{}({value})", token.text)))
    }
}
