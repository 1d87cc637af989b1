//! Checkout Error Types

use thiserror::Error;

use crate::flow::FlowState;
use crate::validation::FormErrors;

/// Result type alias
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Key-value storage failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Storage is not available in this environment
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Backend failed the operation
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Checkout flow errors
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Form fields rejected; the flow stays on the form
    #[error("Invalid form input: {0}")]
    Validation(FormErrors),

    /// No checkout session is open
    #[error("No checkout is open")]
    NotOpen,

    /// Form fields can only change on the form
    #[error("Form cannot be edited while {0}")]
    NotEditable(FlowState),

    /// Operation not allowed in the current state
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: FlowState, to: FlowState },

    /// Analytics sink failed
    #[error("Analytics error: {0}")]
    Analytics(String),
}
