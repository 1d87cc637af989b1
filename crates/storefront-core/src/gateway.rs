//! Payment Gateway Strategy Pattern
//!
//! Defines the two operations the checkout flow needs from a PIX payment
//! provider, so the flow works against the provider directly, against the
//! storefront's own HTTP API, or against an in-memory fake in tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_core::gateway::{CreateOutcome, PaymentGateway};
//!
//! match gateway.create_transaction(&request).await? {
//!     CreateOutcome::Created(charge) => show_qr(&charge.payment_code),
//!     CreateOutcome::Rejected { message } => show_error(message),
//! }
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::attribution::{AttributionKey, AttributionParams};
use crate::error::Result;
use crate::plan::Plan;

/// Customer data sent with a transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,

    /// National document number (CPF-shaped, 11 digits)
    pub document: String,
}

/// Free-form transaction metadata.
///
/// Only `plan_id`, `plan_name` and the recognized attribution keys are
/// accepted; anything else is dropped, including on deserialization.
/// Non-string values are skipped rather than rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, serde_json::Value>")]
pub struct TransactionMetadata(BTreeMap<String, String>);

impl TransactionMetadata {
    pub const PLAN_ID: &'static str = "plan_id";
    pub const PLAN_NAME: &'static str = "plan_name";

    /// Metadata seeded with the plan identity
    pub fn for_plan(plan: &Plan) -> Self {
        let mut metadata = Self::default();
        metadata.insert(Self::PLAN_ID, &plan.id);
        metadata.insert(Self::PLAN_NAME, &plan.name);
        metadata
    }

    /// Fold non-empty attribution fields in
    #[must_use]
    pub fn with_attribution(mut self, attribution: &AttributionParams) -> Self {
        for (key, value) in attribution.iter() {
            self.insert(key.as_str(), value);
        }
        self
    }

    /// Whether a key may appear in metadata
    pub fn is_allowed_key(key: &str) -> bool {
        key == Self::PLAN_ID || key == Self::PLAN_NAME || AttributionKey::parse(key).is_some()
    }

    /// Insert a trimmed value; disallowed keys and blank values are ignored
    pub fn insert(&mut self, key: &str, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || !Self::is_allowed_key(key) {
            return false;
        }
        self.0.insert(key.to_string(), value.to_string());
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The attribution subset of this metadata
    pub fn attribution(&self) -> AttributionParams {
        AttributionParams::from_pairs(self.0.iter().map(|(k, v)| (k.as_str(), v.clone())))
    }
}

impl From<BTreeMap<String, serde_json::Value>> for TransactionMetadata {
    fn from(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let mut metadata = Self::default();
        for (key, value) in &raw {
            if let serde_json::Value::String(value) = value {
                metadata.insert(key, value);
            }
        }
        metadata
    }
}

/// Request to create a PIX transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub plan_id: String,
    pub plan_name: String,

    /// Amount in currency units
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    pub customer: Customer,

    #[serde(default)]
    pub metadata: TransactionMetadata,
}

impl CreateTransactionRequest {
    pub fn new(plan: &Plan, customer: Customer, attribution: &AttributionParams) -> Self {
        Self {
            plan_id: plan.id.clone(),
            plan_name: plan.name.clone(),
            amount: plan.price,
            customer,
            metadata: TransactionMetadata::for_plan(plan).with_attribution(attribution),
        }
    }
}

/// Normalized payment status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Authorized,
    Failed,
}

impl PaymentStatus {
    /// Normalize a provider status string.
    ///
    /// Unknown values are treated as still pending.
    pub fn from_provider(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "paid" | "authorized" => Self::Authorized,
            "expired" | "cancelled" | "canceled" | "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Authorized => "AUTHORIZED",
            Self::Failed => "FAILED",
        }
    }

    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Authorized)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A created PIX charge
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixCharge {
    /// Gateway-assigned transaction identifier
    pub transaction_id: String,

    /// Our own reference, echoed back by the gateway
    #[serde(default)]
    pub external_id: Option<String>,

    /// PIX copy-and-paste code (also the QR payload)
    pub payment_code: String,

    /// Hosted QR image, when the gateway provides one
    #[serde(default)]
    pub qr_target_url: Option<String>,

    pub status: PaymentStatus,
}

/// Outcome of a create-transaction call that reached the gateway
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(PixCharge),
    Rejected { message: Option<String> },
}

/// Strategy trait for PIX payment gateways
///
/// `Err` means the call itself failed (transport, unparseable body);
/// `Ok(CreateOutcome::Rejected)` means the gateway answered with a failure.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a PIX transaction
    async fn create_transaction(&self, request: &CreateTransactionRequest) -> Result<CreateOutcome>;

    /// Look up the current status of a transaction
    async fn transaction_status(&self, transaction_id: &str) -> Result<PaymentStatus>;

    /// Gateway name, for logs
    fn name(&self) -> &str;
}
