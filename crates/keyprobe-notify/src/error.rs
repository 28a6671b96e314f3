//! Error types for notification delivery.

use thiserror::Error;

/// Errors raised while delivering a message to one target.
///
/// A delivery error only affects the target that raised it.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Network error talking to the target
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The target answered with a non-success status
    #[error("target rejected message: status {status}")]
    Rejected {
        /// HTTP status code
        status: u16,
    },

    /// The target did not finish in time or crashed while delivering
    #[error("target unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeliveryError::Rejected { status: 429 };
        assert_eq!(err.to_string(), "target rejected message: status 429");

        let err = DeliveryError::Unavailable("channel deleted".to_string());
        assert!(err.to_string().contains("channel deleted"));
    }
}
