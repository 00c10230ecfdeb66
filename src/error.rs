//! Error types for the outlier analysis pipeline.
//!
//! Every stage fails fatally: there are no retries and no partial results.
//! Library code returns [`AnalysisError`]; the binary wraps it in `anyhow`
//! with context.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The dataset file is missing, malformed, or schema-inconsistent.
    #[error("load error: {0}")]
    Load(String),

    /// The label column is missing or holds values outside {0, 1}.
    #[error("schema error: {0}")]
    Schema(String),

    /// A strategy cannot fit the given input.
    #[error("fit error: {0}")]
    Fit(String),

    /// Predictions or label vectors violate the expected convention.
    #[error("validation error: {0}")]
    Validation(String),
}

impl AnalysisError {
    pub fn load(msg: impl Into<String>) -> Self {
        AnalysisError::Load(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        AnalysisError::Schema(msg.into())
    }

    pub fn fit(msg: impl Into<String>) -> Self {
        AnalysisError::Fit(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AnalysisError::Validation(msg.into())
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::Load(err.to_string())
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(err: csv::Error) -> Self {
        AnalysisError::Load(err.to_string())
    }
}
