//! Checkout configuration

use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_REDIRECT_DELAY_SECS: u64 = 2;
pub const DEFAULT_REDIRECT_URL: &str = "/welcome";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Delay before each payment status check
    pub poll_interval: Duration,

    /// Delay between confirmation and redirect
    pub redirect_delay: Duration,

    /// Where the customer goes once paid
    pub redirect_url: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            redirect_delay: Duration::from_secs(DEFAULT_REDIRECT_DELAY_SECS),
            redirect_url: DEFAULT_REDIRECT_URL.into(),
        }
    }
}

impl CheckoutConfig {
    /// Read `CHECKOUT_POLL_INTERVAL_SECS`, `CHECKOUT_REDIRECT_DELAY_SECS`
    /// and `CHECKOUT_REDIRECT_URL`, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .map_or(Duration::from_secs(default), Duration::from_secs)
        };

        Self {
            poll_interval: secs("CHECKOUT_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS),
            redirect_delay: secs("CHECKOUT_REDIRECT_DELAY_SECS", DEFAULT_REDIRECT_DELAY_SECS),
            redirect_url: lookup("CHECKOUT_REDIRECT_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REDIRECT_URL.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CheckoutConfig::from_lookup(|_| None);
        assert_eq!(config, CheckoutConfig::default());
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.redirect_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = CheckoutConfig::from_lookup(|key| match key {
            "CHECKOUT_POLL_INTERVAL_SECS" => Some("3".into()),
            "CHECKOUT_REDIRECT_DELAY_SECS" => Some("soon".into()),
            "CHECKOUT_REDIRECT_URL" => Some("https://members.example/start".into()),
            _ => None,
        });
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.redirect_delay, Duration::from_secs(2));
        assert_eq!(config.redirect_url, "https://members.example/start");
    }
}
