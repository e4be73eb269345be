use thiserror::Error;

/// Errors reported by the computational core.
///
/// The `Display` text of each variant is what the plotting front end shows
/// to the user, so every message is written to stand on its own.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlotError {
    #[error("Expression is empty")]
    EmptyExpression,

    #[error("Unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("Unrecognized token '{token}' at position {position}")]
    UnknownToken { token: String, position: usize },

    #[error("Unknown dataset '{0}'")]
    UnknownDataset(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Missing operator before '{token}' at position {position} (implicit multiplication is not supported)")]
    MissingOperator { token: String, position: usize },

    #[error("Missing operand for '{0}'")]
    MissingOperand(String),

    #[error("Function '{0}' must be followed by a parenthesized argument")]
    MissingArgument(String),

    #[error("Function '{function}' expects a {expected} argument")]
    TypeMismatch {
        function: String,
        expected: &'static str,
    },

    #[error("Not a polynomial in s: {0}")]
    NotPolynomial(String),

    #[error("Series length mismatch: {x_len} x-values and {y_len} y-values")]
    LengthMismatch { x_len: usize, y_len: usize },

    #[error("Not enough data: {0}")]
    InsufficientData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Ill-posed fit: order {order} needs at least {required} samples, got {available}")]
    IllPosedFit {
        order: usize,
        required: usize,
        available: usize,
    },

    #[error("Degenerate transfer function: {0}")]
    DegenerateTransferFunction(String),

    #[error("Singular matrix: {0}")]
    SingularMatrix(String),
}

pub type Result<T> = std::result::Result<T, PlotError>;
