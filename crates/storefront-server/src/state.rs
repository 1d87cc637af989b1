//! Application State

use std::sync::Arc;

use storefront_core::PaymentGateway;
use storefront_payments::WebhookHandler;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PIX provider (None if not configured)
    pub gateway: Option<Arc<dyn PaymentGateway>>,

    /// Provider notification handler
    pub webhooks: Arc<WebhookHandler>,
}
