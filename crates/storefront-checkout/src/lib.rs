//! # storefront-checkout
//!
//! The buying side of the storefront: marketing attribution capture and the
//! PIX checkout state machine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐  get_all  ┌──────────────────────────────┐
//! │   AttributionStore   │◀──────────│      CheckoutController      │
//! │ URL/storage/referrer │           │   Form→Loading→Pix→Success   │
//! └──────────┬───────────┘           └────┬──────────┬─────────┬────┘
//!            │                            │          │         │
//!     ┌──────▼───────┐         ┌──────────▼───┐ ┌────▼────┐ ┌──▼────────┐
//!     │ KeyValueStore│         │PaymentGateway│ │Analytics│ │ Navigator │
//!     └──────────────┘         └──────────────┘ └─────────┘ └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store = Arc::new(AttributionStore::new(long_lived, session, page));
//! store.capture_on_load();
//!
//! let checkout = CheckoutController::with_defaults(gateway, store);
//! checkout.open(plan);
//! checkout.set_name("Jo")?;
//! checkout.set_email("jo@example.com")?;
//! checkout.submit().await?;
//! ```

pub mod analytics;
pub mod attribution;
pub mod config;
pub mod document;
pub mod error;
pub mod flow;
pub mod navigator;
pub mod page;
pub mod storage;
pub mod validation;

pub use analytics::{AnalyticsEvent, AnalyticsSink, TracingAnalytics};
pub use attribution::{AttributionStore, STORAGE_KEY, parse_query};
pub use config::CheckoutConfig;
pub use document::{generate_document, is_valid_cpf};
pub use error::{CheckoutError, Result, StorageError};
pub use flow::{CheckoutController, CheckoutSession, CheckoutSnapshot, FlowState};
pub use navigator::{LoggingNavigator, Navigator};
pub use page::PageContext;
pub use storage::{KeyValueStore, MemoryStore};
pub use validation::{FormErrors, validate_email, validate_form, validate_name};
