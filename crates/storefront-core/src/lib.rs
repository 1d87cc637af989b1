//! # storefront-core
//!
//! Shared domain types for the PIX subscription storefront.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    storefront-core                            │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │    Plan     │  │ AttributionParams │  │ PaymentGateway  │  │
//! │  │  Catalog    │──│   (UTM tags)      │──│   (Strategy)    │  │
//! │  └─────────────┘  └──────────────────┘  └─────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `PaymentGateway` trait lets the checkout flow talk to the PIX provider
//! directly, to the storefront's own HTTP API, or to a test double, without
//! changing flow logic.

pub mod attribution;
pub mod error;
pub mod gateway;
pub mod plan;

pub use attribution::{AttributionKey, AttributionParams};
pub use error::{Result, StorefrontError};
pub use gateway::{
    CreateOutcome, CreateTransactionRequest, Customer, PaymentGateway, PaymentStatus, PixCharge,
    TransactionMetadata,
};
pub use plan::Plan;
