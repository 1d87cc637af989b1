//! Attribution Store
//!
//! Captures UTM-style tags from the landing URL, keeps them in a long-lived
//! and a session scope, and resolves them again at checkout time.
//!
//! ## Precedence
//!
//! ```text
//! get_all():  URL query ─▶ long-lived ─▶ session ─▶ referrer query
//!                 │                         │            │
//!                 └──── write back to long-lived ◀───────┘
//! ```
//!
//! The first non-empty source wins. Storage failures count as "no data".

use std::sync::{Arc, PoisonError, RwLock};

use percent_encoding::percent_decode_str;
use storefront_core::{AttributionKey, AttributionParams};
use url::form_urlencoded;

use crate::page::PageContext;
use crate::storage::KeyValueStore;

/// Record key used in both storage scopes
pub const STORAGE_KEY: &str = "utm_params";

/// Extract recognized tags from a query string.
///
/// The first occurrence of a key wins. Values get a second percent-decoding
/// pass since ad platforms often double-encode (`%257C` → `|`).
pub fn parse_query(query: &str) -> AttributionParams {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut seen = Vec::new();
    let mut params = AttributionParams::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let Some(key) = AttributionKey::parse(&key) else {
            continue;
        };
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        params.insert(key, decode_again(&value));
    }
    params
}

fn decode_again(value: &str) -> String {
    percent_decode_str(value)
        .decode_utf8()
        .map_or_else(|_| value.to_string(), |decoded| decoded.into_owned())
}

/// Attribution store over two storage scopes and the current page
pub struct AttributionStore {
    long_lived: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    page: RwLock<PageContext>,
}

impl AttributionStore {
    pub fn new(
        long_lived: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        page: PageContext,
    ) -> Self {
        Self {
            long_lived,
            session,
            page: RwLock::new(page),
        }
    }

    /// Replace the current page (navigation)
    pub fn navigate(&self, page: PageContext) {
        *self.page.write().unwrap_or_else(PoisonError::into_inner) = page;
    }

    pub fn page(&self) -> PageContext {
        self.page
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Tags present in the current URL
    pub fn capture_from_url(&self) -> AttributionParams {
        parse_query(&self.page().query)
    }

    /// Page-load entry point: capture, and persist when anything was found
    pub fn capture_on_load(&self) -> AttributionParams {
        let params = self.capture_from_url();
        if !params.is_empty() {
            tracing::info!(tags = %params.display_summary(), "Captured attribution from URL");
            self.persist(&params);
        }
        params
    }

    /// Overwrite the record in both scopes
    pub fn persist(&self, params: &AttributionParams) {
        let record = match serde_json::to_string(params) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize attribution");
                return;
            }
        };

        for (scope, store) in [("long_lived", &self.long_lived), ("session", &self.session)] {
            if let Err(e) = store.set(STORAGE_KEY, &record) {
                tracing::warn!(scope, error = %e, "Failed to persist attribution");
            }
        }
    }

    /// Stored record, long-lived scope first
    pub fn stored(&self) -> AttributionParams {
        let params = read_scope("long_lived", self.long_lived.as_ref());
        if params.is_empty() {
            read_scope("session", self.session.as_ref())
        } else {
            params
        }
    }

    /// Resolve attribution by precedence. Never fails.
    pub fn get_all(&self) -> AttributionParams {
        let from_url = self.capture_from_url();
        if !from_url.is_empty() {
            self.write_back(&from_url);
            return from_url;
        }

        let long_lived = read_scope("long_lived", self.long_lived.as_ref());
        if !long_lived.is_empty() {
            return long_lived;
        }

        let session = read_scope("session", self.session.as_ref());
        if !session.is_empty() {
            self.write_back(&session);
            return session;
        }

        let from_referrer = self
            .page()
            .referrer_query()
            .map(|query| parse_query(&query))
            .unwrap_or_default();
        if !from_referrer.is_empty() {
            tracing::debug!(tags = %from_referrer.display_summary(), "Attribution recovered from referrer");
            self.write_back(&from_referrer);
        }
        from_referrer
    }

    fn write_back(&self, params: &AttributionParams) {
        let result = serde_json::to_string(params)
            .map_err(|e| e.to_string())
            .and_then(|record| {
                self.long_lived
                    .set(STORAGE_KEY, &record)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            tracing::debug!(error = %e, "Attribution write-back skipped");
        }
    }
}

fn read_scope(scope: &str, store: &dyn KeyValueStore) -> AttributionParams {
    match store.get(STORAGE_KEY) {
        Ok(Some(record)) => serde_json::from_str(&record).unwrap_or_else(|e| {
            tracing::debug!(scope, error = %e, "Ignoring corrupt attribution record");
            AttributionParams::new()
        }),
        Ok(None) => AttributionParams::new(),
        Err(e) => {
            tracing::debug!(scope, error = %e, "Attribution storage unavailable");
            AttributionParams::new()
        }
    }
}
