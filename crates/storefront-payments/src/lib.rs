//! # storefront-payments
//!
//! PIX gateway clients and webhook handling for the storefront.
//!
//! ## Gateways
//!
//! Two `PaymentGateway` implementations cover the two places a checkout can
//! run:
//!
//! ```text
//! ┌──────────────┐  StorefrontApiClient  ┌──────────────┐  FurionPayClient  ┌────────────┐
//! │   Checkout   │──────────────────────▶│  Storefront  │──────────────────▶│ FurionPay  │
//! │  (client)    │  /api/create-payment  │   server     │  bearer API key   │  PIX API   │
//! └──────────────┘  /api/check-payment   └──────────────┘                   └────────────┘
//! ```
//!
//! - **`FurionPayClient`**: talks to the provider directly. Needs the API
//!   key, so it only runs server-side.
//! - **`StorefrontApiClient`**: talks to this workspace's server, which
//!   holds the key and forwards to FurionPay.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_payments::FurionPayClient;
//! use storefront_core::PaymentGateway;
//!
//! let gateway = FurionPayClient::from_env()?;
//! let outcome = gateway.create_transaction(&request).await?;
//! let status = gateway.transaction_status("tx_123").await?;
//! ```

mod api_client;
mod error;
mod furionpay;
mod webhook;

pub use api_client::{
    CheckPaymentRequest, CheckPaymentResponse, CreatePaymentResponse, StorefrontApiClient,
};
pub use error::{PaymentError, Result};
pub use furionpay::{FurionPayClient, FurionPayConfig};
pub use webhook::{SIGNATURE_HEADER, WebhookEvent, WebhookHandler, verify_signature};
