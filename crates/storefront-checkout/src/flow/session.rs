//! Per-open checkout session data

use std::sync::Arc;

use chrono::{DateTime, Utc};
use storefront_core::{AttributionParams, Plan};

use super::state::FlowState;
use crate::validation::FormErrors;

/// Data gathered while a checkout is open. Dropped on close.
#[derive(Clone, Debug)]
pub struct CheckoutSession {
    pub plan: Arc<Plan>,
    pub name: String,
    pub email: String,

    /// Synthetic document, generated on submit
    pub document: Option<String>,

    /// Attribution captured when the checkout opened
    pub attribution: AttributionParams,

    pub transaction_id: Option<String>,
    pub payment_code: Option<String>,
    pub qr_target_url: Option<String>,
    pub last_error: Option<String>,
    pub form_errors: FormErrors,
    pub opened_at: DateTime<Utc>,
}

impl CheckoutSession {
    pub fn new(plan: Arc<Plan>, attribution: AttributionParams) -> Self {
        Self {
            plan,
            name: String::new(),
            email: String::new(),
            document: None,
            attribution,
            transaction_id: None,
            payment_code: None,
            qr_target_url: None,
            last_error: None,
            form_errors: FormErrors::default(),
            opened_at: Utc::now(),
        }
    }
}

/// Point-in-time view of the checkout
#[derive(Clone, Debug)]
pub struct CheckoutSnapshot {
    pub state: FlowState,
    pub session: CheckoutSession,
}
