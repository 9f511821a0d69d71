//! Engine error taxonomy

use thiserror::Error;

/// Errors raised by the correlation-to-EV pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed price or outcome data; the market is excluded from results
    #[error("Invalid market {market_id}: {reason}")]
    InvalidMarket { market_id: String, reason: String },
    /// Correlation coefficient outside [-1, 1]
    #[error("Invalid correlation: {0} is outside [-1, 1]")]
    InvalidCorrelation(f64),
    /// Similarity score outside [0, 1]
    #[error("Invalid similarity: {0} is outside [0, 1]")]
    InvalidSimilarity(f64),
    /// Ranking or risk configuration is inconsistent
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    pub(crate) fn invalid_market(market_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMarket {
            market_id: market_id.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
