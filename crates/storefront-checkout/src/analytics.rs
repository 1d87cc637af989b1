//! Conversion analytics events

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use storefront_core::AttributionParams;

use crate::error::Result;

pub const CURRENCY: &str = "BRL";
pub const CONTENT_TYPE: &str = "subscription";

/// Event sent to the tracking pixel
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum AnalyticsEvent {
    /// PIX code shown to the customer
    InitiateCheckout {
        #[serde(with = "rust_decimal::serde::float")]
        value: Decimal,
        currency: &'static str,
        content_type: &'static str,
        content_ids: Vec<String>,
        #[serde(flatten)]
        attribution: AttributionParams,
    },

    /// Payment confirmed
    Purchase {
        #[serde(with = "rust_decimal::serde::float")]
        value: Decimal,
        currency: &'static str,
        content_type: &'static str,
        transaction_id: String,
        #[serde(flatten)]
        attribution: AttributionParams,
    },
}

impl AnalyticsEvent {
    pub fn initiate_checkout(value: Decimal, plan_id: &str, attribution: AttributionParams) -> Self {
        Self::InitiateCheckout {
            value,
            currency: CURRENCY,
            content_type: CONTENT_TYPE,
            content_ids: vec![plan_id.to_string()],
            attribution,
        }
    }

    pub fn purchase(value: Decimal, transaction_id: impl Into<String>, attribution: AttributionParams) -> Self {
        Self::Purchase {
            value,
            currency: CURRENCY,
            content_type: CONTENT_TYPE,
            transaction_id: transaction_id.into(),
            attribution,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::InitiateCheckout { .. } => "InitiateCheckout",
            Self::Purchase { .. } => "Purchase",
        }
    }
}

/// Destination for analytics events
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn track(&self, event: &AnalyticsEvent) -> Result<()>;
}

/// Sink that writes events to the log
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAnalytics;

#[async_trait]
impl AnalyticsSink for TracingAnalytics {
    async fn track(&self, event: &AnalyticsEvent) -> Result<()> {
        let payload = serde_json::to_string(event)
            .map_err(|e| crate::error::CheckoutError::Analytics(e.to_string()))?;
        tracing::info!(event = event.name(), payload = %payload, "Analytics event");
        Ok(())
    }
}
