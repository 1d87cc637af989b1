//! Error Types

use thiserror::Error;

/// Result type alias for storefront operations
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Storefront error types
#[derive(Error, Debug)]
pub enum StorefrontError {
    /// Gateway answered but the call failed
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Gateway unreachable or timing out
    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// Gateway response could not be understood
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),

    /// Plan identifier not in the catalog
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),

    /// Input rejected before reaching the gateway
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl StorefrontError {
    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::GatewayUnavailable(_) | Self::InvalidResponse(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(msg) | Self::Validation(msg) => msg.clone(),
            Self::GatewayUnavailable(_) => {
                "The payment service is currently unavailable. Please try again.".into()
            }
            Self::InvalidResponse(_) => "The payment service returned an unexpected response.".into(),
            Self::UnknownPlan(_) => "The selected plan is not available.".into(),
            _ => "Could not process the payment.".into(),
        }
    }
}
