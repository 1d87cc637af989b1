//! FurionPay Webhook Handling
//!
//! Verifies and parses payment notifications. The checkout flow never
//! consults these; they are recorded for operators.

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{PaymentError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 of the raw body
pub const SIGNATURE_HEADER: &str = "x-furionpay-signature";

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// PIX created and awaiting payment
    Created { txid: String },

    /// PIX paid
    Paid { txid: String, amount: Option<Decimal> },

    /// PIX expired without payment
    Expired { txid: String },

    /// PIX cancelled
    Cancelled { txid: String },

    /// Unhandled event type
    Other { event: String, txid: Option<String> },
}

impl WebhookEvent {
    pub fn event_name(&self) -> &str {
        match self {
            Self::Created { .. } => "payment.created",
            Self::Paid { .. } => "payment.paid",
            Self::Expired { .. } => "payment.expired",
            Self::Cancelled { .. } => "payment.cancelled",
            Self::Other { event, .. } => event,
        }
    }

    pub fn txid(&self) -> Option<&str> {
        match self {
            Self::Created { txid }
            | Self::Paid { txid, .. }
            | Self::Expired { txid }
            | Self::Cancelled { txid } => Some(txid),
            Self::Other { txid, .. } => txid.as_deref(),
        }
    }
}

#[derive(Deserialize)]
struct RawNotification {
    #[serde(default)]
    event: String,
    #[serde(default)]
    data: Option<RawData>,
}

#[derive(Deserialize)]
struct RawData {
    txid: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    amount: Option<Decimal>,
}

/// Webhook handler
pub struct WebhookHandler {
    secret: Option<String>,
}

impl WebhookHandler {
    /// `secret` = `None` disables signature verification
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    /// Read `FURIONPAY_WEBHOOK_SECRET`
    pub fn from_env() -> Self {
        Self::new(std::env::var("FURIONPAY_WEBHOOK_SECRET").ok())
    }

    pub const fn verifies_signatures(&self) -> bool {
        self.secret.is_some()
    }

    /// Verify the signature header against the raw payload.
    ///
    /// With a secret configured, a missing signature is rejected; without
    /// one every payload passes.
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<()> {
        let Some(secret) = &self.secret else {
            return Ok(());
        };
        let signature =
            signature.ok_or_else(|| PaymentError::WebhookSignature("missing signature".into()))?;
        verify_signature(payload, signature, secret)
    }

    /// Parse a notification body
    pub fn parse(&self, payload: &[u8]) -> Result<WebhookEvent> {
        let raw: RawNotification = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::WebhookParse(e.to_string()))?;

        let (txid, amount) = raw
            .data
            .map_or((None, None), |d| (d.txid, d.amount));

        let require_txid = |txid: Option<String>| {
            txid.ok_or_else(|| PaymentError::WebhookParse(format!("{} without txid", raw.event)))
        };

        Ok(match raw.event.as_str() {
            "payment.created" => WebhookEvent::Created { txid: require_txid(txid)? },
            "payment.paid" => WebhookEvent::Paid {
                txid: require_txid(txid)?,
                amount,
            },
            "payment.expired" => WebhookEvent::Expired { txid: require_txid(txid)? },
            "payment.cancelled" => WebhookEvent::Cancelled { txid: require_txid(txid)? },
            _ => WebhookEvent::Other {
                event: raw.event.clone(),
                txid,
            },
        })
    }

    /// Record a verified event
    pub fn handle(&self, event: &WebhookEvent) {
        match event {
            WebhookEvent::Paid { txid, amount } => {
                tracing::info!(txid = %txid, amount = ?amount, "PIX payment confirmed");
            }
            WebhookEvent::Created { txid } => {
                tracing::info!(txid = %txid, "PIX payment created");
            }
            WebhookEvent::Expired { txid } | WebhookEvent::Cancelled { txid } => {
                tracing::info!(txid = %txid, event = event.event_name(), "PIX payment closed without payment");
            }
            WebhookEvent::Other { event, txid } => {
                tracing::debug!(event = %event, txid = ?txid, "Unhandled webhook event");
            }
        }
    }
}

/// Verify a hex HMAC-SHA256 signature of `payload` (constant-time)
pub fn verify_signature(payload: &[u8], signature_hex: &str, secret: &str) -> Result<()> {
    let expected = hex::decode(signature_hex.trim())
        .map_err(|_| PaymentError::WebhookSignature("signature is not hex".into()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::WebhookSignature(e.to_string()))?;
    mac.update(payload);
    mac.verify_slice(&expected)
        .map_err(|_| PaymentError::WebhookSignature("signature mismatch".into()))
}
