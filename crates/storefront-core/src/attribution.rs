//! Attribution Parameters
//!
//! The closed set of marketing attribution (UTM) tags the storefront
//! recognizes, and the map type that carries them between page loads,
//! storage and the payment gateway.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A recognized attribution key
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributionKey {
    UtmSource,
    UtmMedium,
    UtmCampaign,
    UtmAdset,
    UtmAd,
    UtmId,
    UtmTerm,
    UtmContent,
    Src,
    Sck,
}

impl AttributionKey {
    /// Every recognized key, in canonical order
    pub const ALL: [Self; 10] = [
        Self::UtmSource,
        Self::UtmMedium,
        Self::UtmCampaign,
        Self::UtmAdset,
        Self::UtmAd,
        Self::UtmId,
        Self::UtmTerm,
        Self::UtmContent,
        Self::Src,
        Self::Sck,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UtmSource => "utm_source",
            Self::UtmMedium => "utm_medium",
            Self::UtmCampaign => "utm_campaign",
            Self::UtmAdset => "utm_adset",
            Self::UtmAd => "utm_ad",
            Self::UtmId => "utm_id",
            Self::UtmTerm => "utm_term",
            Self::UtmContent => "utm_content",
            Self::Src => "src",
            Self::Sck => "sck",
        }
    }

    /// Parse a query-string key; unknown keys yield `None`
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }

    /// Label used by [`AttributionParams::display_summary`]
    const fn label(self) -> Option<&'static str> {
        match self {
            Self::UtmSource => Some("Source"),
            Self::UtmMedium => Some("Medium"),
            Self::UtmCampaign => Some("Campaign"),
            Self::UtmAdset => Some("Ad set"),
            Self::UtmAd => Some("Ad"),
            Self::Src => Some("src"),
            Self::Sck => Some("sck"),
            Self::UtmId | Self::UtmTerm | Self::UtmContent => None,
        }
    }
}

impl fmt::Display for AttributionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribution values keyed by recognized key.
///
/// Invariant: every stored value is non-blank. The JSON form is a flat object
/// (`{"utm_source": "fb", ...}`); unknown keys, non-string values and blank
/// strings are dropped on the way in rather than rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, serde_json::Value>",
    into = "BTreeMap<String, String>"
)]
pub struct AttributionParams(BTreeMap<AttributionKey, String>);

impl AttributionParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `(key, value)` pairs, keeping only recognized keys
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            if let Some(key) = AttributionKey::parse(key.as_ref()) {
                params.insert(key, value);
            }
        }
        params
    }

    /// Insert a value; blank values are ignored. Returns whether it was stored.
    pub fn insert(&mut self, key: AttributionKey, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.trim().is_empty() {
            return false;
        }
        self.0.insert(key, value);
        true
    }

    pub fn get(&self, key: AttributionKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributionKey, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Human-readable one-liner, e.g. `Source: fb | Campaign: launch`
    pub fn display_summary(&self) -> String {
        self.iter()
            .filter_map(|(key, value)| key.label().map(|label| format!("{label}: {value}")))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl FromIterator<(AttributionKey, String)> for AttributionParams {
    fn from_iter<T: IntoIterator<Item = (AttributionKey, String)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl From<BTreeMap<String, serde_json::Value>> for AttributionParams {
    fn from(raw: BTreeMap<String, serde_json::Value>) -> Self {
        Self::from_pairs(raw.into_iter().filter_map(|(key, value)| match value {
            serde_json::Value::String(s) => Some((key, s)),
            _ => None,
        }))
    }
}

impl From<AttributionParams> for BTreeMap<String, String> {
    fn from(params: AttributionParams) -> Self {
        params
            .0
            .into_iter()
            .map(|(k, v)| (k.as_str().to_string(), v))
            .collect()
    }
}
