//! Payment Error Types

use storefront_core::StorefrontError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Gateway client and webhook errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Request never got an HTTP answer (connect failure, timeout)
    #[error("Gateway unreachable: {0}")]
    Unreachable(String),

    /// Gateway answered with a non-success status
    #[error("Gateway API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body was not the expected JSON
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::InvalidResponse(_))
    }

    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::Unreachable(_) => "The payment service is unreachable. Please try again.",
            Self::Api { .. } | Self::InvalidResponse(_) => {
                "Payment processing failed. Please try again."
            }
            Self::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

impl From<PaymentError> for StorefrontError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Unreachable(msg) => Self::GatewayUnavailable(msg),
            PaymentError::Api { message, .. } => Self::Gateway(message),
            PaymentError::InvalidResponse(msg) => Self::InvalidResponse(msg),
            PaymentError::Config(msg) => Self::Config(msg),
            other => Self::Other(other.to_string()),
        }
    }
}
