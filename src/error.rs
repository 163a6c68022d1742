//! Error handling for value-analysis
//!
//! Core modules (quarter, report, valuation, provider) return the typed
//! [`AnalysisError`]; application layers use the anyhow-based [`Result`]
//! alias for context chaining.

use thiserror::Error;

/// Core error types for report normalization and valuation
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("fetch error for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("unsupported market for ticker: {0}")]
    UnsupportedMarket(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("date parse error for '{value}': {reason}")]
    DateParse { value: String, reason: String },

    #[error("numeric fault: {0}")]
    NumericFault(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl AnalysisError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        AnalysisError::MalformedPayload(msg.into())
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::MalformedPayload(err.to_string())
    }
}

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;
