use thiserror::Error;

/// Failures raised while deriving or transforming feature columns.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("column '{column}' holds non-numeric value '{value}' at row {row}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("fitted columns missing from dataset: {0:?}")]
    ScalerColumnMismatch(Vec<String>),
}
