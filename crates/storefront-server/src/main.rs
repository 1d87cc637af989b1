//! PIX Storefront HTTP Server
//!
//! Axum-based server exposing the plan catalog and the payment endpoints the
//! checkout calls, plus the provider webhook.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_core::PaymentGateway;
use storefront_payments::{FurionPayClient, WebhookHandler};

use crate::handlers::{check_payment, create_payment, health_check, list_plans, payment_webhook};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Initialize payment gateway
    let gateway: Option<Arc<dyn PaymentGateway>> = match FurionPayClient::from_env() {
        Ok(client) => {
            tracing::info!("✓ FurionPay configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!("⚠ FurionPay not configured - payments disabled: {}", e);
            tracing::warn!("  Set FURIONPAY_API_KEY in .env");
            None
        }
    };

    let webhooks = WebhookHandler::from_env();
    if !webhooks.verifies_signatures() {
        tracing::warn!("⚠ FURIONPAY_WEBHOOK_SECRET not set - webhook signatures not verified");
    }

    let state = AppState {
        gateway,
        webhooks: Arc::new(webhooks),
    };

    let app = build_router(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 storefront server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health              - Health check");
    tracing::info!("  GET  /api/plans           - Plan catalog");
    tracing::info!("  POST /api/create-payment  - Create PIX payment");
    tracing::info!("  POST /api/check-payment   - Check payment status");
    tracing::info!("  POST /api/webhook         - Provider notifications");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/plans", get(list_plans))
        .route("/api/create-payment", post(create_payment))
        .route("/api/check-payment", post(check_payment))
        .route("/api/webhook", post(payment_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
